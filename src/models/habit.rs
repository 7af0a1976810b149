use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::AppError;
use crate::schedule::{self, LocalDay, Schedule, ScheduleFormState, build_schedule, parse_schedule_to_state};

pub const DEFAULT_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitType {
    #[default]
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    pub frequency: Frequency,
    #[serde(default, deserialize_with = "lenient")]
    pub schedule: Option<Schedule>,
    #[serde(default, deserialize_with = "lenient")]
    pub time_of_day: Option<TimeOfDay>,
    pub start_date: String,
    #[serde(default)]
    pub goal: Option<Value>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub archived: bool,
    pub created_at: String,
    /// Computed by the backend; never recomputed here.
    #[serde(default)]
    pub current_streak: Option<i64>,
}

impl Habit {
    pub fn is_due(&self, day: impl LocalDay) -> bool {
        schedule::is_due(self.schedule.as_ref(), day)
    }

    pub fn streak(&self) -> i64 {
        self.current_streak.unwrap_or(0)
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// Fields that cannot be understood deserialize to `None` instead of
/// failing the whole habit.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHabitRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    pub frequency: Frequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDay>,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHabitRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub habit_type: Option<HabitType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

/// State of the habit create/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitForm {
    pub name: String,
    pub habit_type: HabitType,
    pub frequency: Frequency,
    pub time_of_day: Option<TimeOfDay>,
    pub color: String,
    pub category: Option<String>,
    pub schedule: ScheduleFormState,
}

impl Default for HabitForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            habit_type: HabitType::default(),
            frequency: Frequency::default(),
            time_of_day: None,
            color: default_color(),
            category: None,
            schedule: ScheduleFormState::default(),
        }
    }
}

impl HabitForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Prefills the edit form.
    pub fn from_habit(habit: &Habit, today: NaiveDate) -> Self {
        Self {
            name: habit.name.clone(),
            habit_type: habit.habit_type,
            frequency: habit.frequency,
            time_of_day: habit.time_of_day,
            color: habit.color.clone(),
            category: habit.category.clone(),
            schedule: parse_schedule_to_state(habit.schedule.as_ref(), today),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Habit name is required".to_string()));
        }
        Ok(())
    }

    fn category(&self) -> Option<String> {
        self.category.clone().filter(|c| !c.trim().is_empty())
    }

    pub fn to_new_request(&self, today: NaiveDate) -> Result<NewHabitRequest, AppError> {
        self.validate()?;
        Ok(NewHabitRequest {
            name: self.name.trim().to_string(),
            habit_type: self.habit_type,
            frequency: self.frequency,
            schedule: Some(build_schedule(&self.schedule, today)),
            time_of_day: self.time_of_day,
            start_date: Utc::now().to_rfc3339(),
            goal: None,
            color: Some(self.color.clone()),
            icon: None,
            category: self.category(),
        })
    }

    /// Edits replace every mutable field, schedule included.
    pub fn to_update_request(&self, today: NaiveDate) -> Result<UpdateHabitRequest, AppError> {
        self.validate()?;
        Ok(UpdateHabitRequest {
            name: Some(self.name.trim().to_string()),
            habit_type: Some(self.habit_type),
            frequency: Some(self.frequency),
            schedule: Some(build_schedule(&self.schedule, today)),
            time_of_day: self.time_of_day,
            color: Some(self.color.clone()),
            category: self.category(),
            ..UpdateHabitRequest::default()
        })
    }
}
