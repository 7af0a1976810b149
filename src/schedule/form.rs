use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Schedule, canonical_date};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    #[default]
    AllTime,
    DateRange,
    Weekdays,
    SpecificDates,
    #[serde(rename = "days_21")]
    Days21,
}

impl ScheduleMode {
    pub const ALL: [ScheduleMode; 5] = [
        ScheduleMode::AllTime,
        ScheduleMode::DateRange,
        ScheduleMode::Weekdays,
        ScheduleMode::SpecificDates,
        ScheduleMode::Days21,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleMode::AllTime => "all_time",
            ScheduleMode::DateRange => "date_range",
            ScheduleMode::Weekdays => "weekdays",
            ScheduleMode::SpecificDates => "specific_dates",
            ScheduleMode::Days21 => "days_21",
        }
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScheduleMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("unknown schedule mode: {}", s)))
    }
}

/// Editable schedule fields of the habit create/edit forms.
///
/// Blank strings mean the user left the field empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScheduleFormState {
    pub mode: ScheduleMode,
    pub start_date: String,
    pub end_date: String,
    pub weekdays: Vec<i64>,
    pub specific_dates: Vec<String>,
}

impl ScheduleFormState {
    pub fn new(mode: ScheduleMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn toggle_weekday(&mut self, day: i64) {
        if let Some(pos) = self.weekdays.iter().position(|d| *d == day) {
            self.weekdays.remove(pos);
        } else {
            self.weekdays.push(day);
            self.weekdays.sort_unstable();
        }
    }

    /// Adds a date unless it is blank or before `today`. Returns whether the
    /// list changed.
    pub fn add_specific_date(&mut self, date: &str, today: NaiveDate) -> bool {
        let date = date.trim();
        if date.is_empty() || date < canonical_date(today).as_str() {
            return false;
        }
        if self.specific_dates.iter().any(|d| d == date) {
            return false;
        }
        self.specific_dates.push(date.to_string());
        self.specific_dates.sort();
        true
    }

    pub fn remove_specific_date(&mut self, date: &str) {
        self.specific_dates.retain(|d| d != date);
    }
}

fn or_today(value: &str, today: NaiveDate) -> String {
    let value = value.trim();
    if value.is_empty() {
        canonical_date(today)
    } else {
        value.to_string()
    }
}

/// Builds the schedule submitted with a habit. `today` is the submission
/// day and fills blank `date_range` bounds.
pub fn build_schedule(form: &ScheduleFormState, today: NaiveDate) -> Schedule {
    match form.mode {
        ScheduleMode::AllTime => Schedule::AllTime,
        ScheduleMode::Days21 => Schedule::Days21 { start: None, end: None },
        ScheduleMode::DateRange => Schedule::DateRange {
            start: Some(or_today(&form.start_date, today)),
            end: Some(or_today(&form.end_date, today)),
        },
        ScheduleMode::Weekdays => Schedule::Weekdays {
            days: form.weekdays.iter().copied().collect(),
            start: None,
        },
        ScheduleMode::SpecificDates => Schedule::SpecificDates {
            dates: form.specific_dates.iter().cloned().collect(),
            start: None,
        },
    }
}

/// Prefills the edit form from a stored schedule.
pub fn parse_schedule_to_state(schedule: Option<&Schedule>, today: NaiveDate) -> ScheduleFormState {
    match schedule {
        Some(Schedule::DateRange { start, end }) => {
            let today = canonical_date(today);
            ScheduleFormState {
                mode: ScheduleMode::DateRange,
                start_date: start.clone().unwrap_or_else(|| today.clone()),
                end_date: end.clone().unwrap_or(today),
                ..ScheduleFormState::default()
            }
        }
        Some(Schedule::Weekdays { days, .. }) => ScheduleFormState {
            mode: ScheduleMode::Weekdays,
            weekdays: days.iter().copied().collect(),
            ..ScheduleFormState::default()
        },
        Some(Schedule::SpecificDates { dates, .. }) => ScheduleFormState {
            mode: ScheduleMode::SpecificDates,
            specific_dates: dates.iter().cloned().collect(),
            ..ScheduleFormState::default()
        },
        Some(Schedule::Days21 { .. }) => ScheduleFormState::new(ScheduleMode::Days21),
        Some(Schedule::AllTime) | None => ScheduleFormState::new(ScheduleMode::AllTime),
    }
}
