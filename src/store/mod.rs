pub mod checkins;
pub mod habits;

pub use checkins::CheckinStore;
pub use habits::HabitStore;

/// Both caches together, shared behind one lock.
#[derive(Debug, Clone, Default)]
pub struct ClientStore {
    pub habits: HabitStore,
    pub checkins: CheckinStore,
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::models::{Checkin, Frequency, Habit, HabitType};

    pub fn habit(id: &str, order: i64) -> Habit {
        Habit {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: format!("Habit {}", id),
            habit_type: HabitType::Positive,
            frequency: Frequency::Daily,
            schedule: None,
            time_of_day: None,
            start_date: "2024-01-01T00:00:00".to_string(),
            goal: None,
            color: "#3B82F6".to_string(),
            icon: None,
            category: None,
            order,
            archived: false,
            created_at: "2024-01-01T00:00:00".to_string(),
            current_streak: Some(0),
        }
    }

    pub fn checkin(id: &str, habit_id: &str, date: &str, completed: bool) -> Checkin {
        Checkin {
            id: id.to_string(),
            user_id: "u1".to_string(),
            habit_id: habit_id.to_string(),
            date: date.to_string(),
            completed,
            value: None,
            skipped: false,
            created_at: "2024-01-01T00:00:00".to_string(),
        }
    }
}
