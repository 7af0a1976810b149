//! Habit recurrence rules.
//!
//! A [`Schedule`] arrives from the backend as loosely typed JSON. Parsing is
//! permissive: anything without a recognizable `mode` is treated as absent,
//! and absent schedules are always due.

pub mod evaluator;
pub mod form;

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

pub use evaluator::{LocalDay, canonical_date, is_due, is_due_value, iso_weekday};
pub use form::{ScheduleFormState, ScheduleMode, build_schedule, parse_schedule_to_state};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Schedule {
    AllTime,
    DateRange {
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end: Option<String>,
    },
    /// ISO weekdays, Monday = 1 through Sunday = 7.
    Weekdays {
        days: BTreeSet<i64>,
        /// Carried through for the backend; not consulted when evaluating.
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<String>,
    },
    SpecificDates {
        dates: BTreeSet<String>,
        /// Carried through for the backend; not consulted when evaluating.
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<String>,
    },
    /// Evaluated like `DateRange`. The 21-day window is only materialized
    /// when the backend fills in `start`/`end`.
    #[serde(rename = "days_21")]
    Days21 {
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end: Option<String>,
    },
}

impl Schedule {
    /// Reads a schedule from untyped JSON.
    ///
    /// Returns `None` when the value is not an object or its `mode` is
    /// missing, not a string, or not one of the five known tags. Fields of a
    /// recognized mode are read leniently: wrong types fall back to absent
    /// (for `start`/`end`) or are filtered out (for `days`/`dates`).
    pub fn from_value(value: &Value) -> Option<Schedule> {
        let obj = value.as_object()?;
        let mode = obj.get("mode")?.as_str()?;

        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let items = |key: &str| {
            obj.get(key)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
        };

        match mode {
            "all_time" => Some(Schedule::AllTime),
            "date_range" => Some(Schedule::DateRange {
                start: text("start"),
                end: text("end"),
            }),
            "days_21" => Some(Schedule::Days21 {
                start: text("start"),
                end: text("end"),
            }),
            "weekdays" => Some(Schedule::Weekdays {
                days: items("days").iter().filter_map(coerce_integer).collect(),
                start: text("start"),
            }),
            "specific_dates" => Some(Schedule::SpecificDates {
                dates: items("dates")
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                start: text("start"),
            }),
            _ => None,
        }
    }

    pub fn mode(&self) -> ScheduleMode {
        match self {
            Schedule::AllTime => ScheduleMode::AllTime,
            Schedule::DateRange { .. } => ScheduleMode::DateRange,
            Schedule::Weekdays { .. } => ScheduleMode::Weekdays,
            Schedule::SpecificDates { .. } => ScheduleMode::SpecificDates,
            Schedule::Days21 { .. } => ScheduleMode::Days21,
        }
    }

    pub fn is_due(&self, day: impl LocalDay) -> bool {
        is_due(Some(self), day)
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Schedule::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("unrecognized schedule: {}", value)))
    }
}

/// Numeric coercion for weekday entries, following dynamic-language
/// `Number(x)` rules: numbers as-is, numeric strings parsed (blank means 0,
/// `0x`/`0o`/`0b` prefixes accepted), booleans as 0/1, null as 0. Arrays
/// coerce through their comma-joined text, so `[]` is 0 and `[7]` is 7.
/// Objects never coerce. Only finite integral results survive, since nothing
/// else can equal an ISO weekday.
fn coerce_integer(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_number(s)?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(items) => parse_number(&join_items(items))?,
        Value::Object(_) => return None,
    };

    if n.is_finite() && n.fract() == 0.0 {
        Some(n as i64)
    } else {
        None
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return s.parse::<f64>().ok(),
    };
    let digits = &s[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

/// Text of an array as it appears when the array is used as a string:
/// elements joined with commas, null rendered as empty.
fn join_items(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => (f as i64).to_string(),
                _ => n.to_string(),
            },
            Value::Array(inner) => join_items(inner),
            Value::Object(_) => "[object Object]".to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}
