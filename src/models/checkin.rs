use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkin {
    pub id: String,
    pub user_id: String,
    pub habit_id: String,
    /// `yyyy-mm-dd`
    pub date: String,
    pub completed: bool,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub skipped: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCheckinRequest {
    pub habit_id: String,
    pub date: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default)]
    pub skipped: bool,
}

impl NewCheckinRequest {
    pub fn completed(habit_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            habit_id: habit_id.into(),
            date: date.into(),
            completed: true,
            value: None,
            skipped: false,
        }
    }
}
