use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    /// Date the backend computes `current_streak` against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of_date: Option<String>,
}

impl HabitQuery {
    pub fn active(as_of_date: Option<String>) -> Self {
        Self {
            archived: Some(false),
            as_of_date,
        }
    }

    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(archived) = self.archived {
            pairs.push(("archived", archived.to_string()));
        }
        if let Some(as_of_date) = &self.as_of_date {
            pairs.push(("as_of_date", as_of_date.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckinQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub habit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl CheckinQuery {
    pub fn range(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            habit_id: None,
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
        }
    }

    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(habit_id) = &self.habit_id {
            pairs.push(("habit_id", habit_id.clone()));
        }
        if let Some(start_date) = &self.start_date {
            pairs.push(("start_date", start_date.clone()));
        }
        if let Some(end_date) = &self.end_date {
            pairs.push(("end_date", end_date.clone()));
        }
        pairs
    }
}
