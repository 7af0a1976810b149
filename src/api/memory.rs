use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate, Utc};
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use super::{CheckinQuery, HabitApi, HabitQuery};
use crate::error::AppError;
use crate::models::{
    Checkin, DEFAULT_COLOR, Habit, NewCheckinRequest, NewHabitRequest, UpdateHabitRequest,
};
use crate::schedule::{Schedule, canonical_date, is_due};

#[derive(Debug, Default)]
struct MemoryState {
    habits: Vec<Habit>,
    checkins: Vec<Checkin>,
}

/// In-process backend used by tests and by the offline mode of the binary.
///
/// Follows the remote service's rules for ordering, archiving, schedule
/// cleanup, checkin validation and cascading deletes, with two differences:
/// a submitted `date_range` start is kept instead of being reset to today,
/// and checkins are validated with the client's due-date rules, so
/// `weekdays` and `specific_dates` habits accept checkins before their
/// `start`.
pub struct MemoryHabitApi {
    user_id: String,
    today: Option<NaiveDate>,
    state: Mutex<MemoryState>,
    requests: AtomicUsize,
}

impl Default for MemoryHabitApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHabitApi {
    pub fn new() -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            today: None,
            state: Mutex::new(MemoryState::default()),
            requests: AtomicUsize::new(0),
        }
    }

    /// Pins the backend's notion of "today".
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Stores a habit as-is, replacing any habit with the same id.
    pub fn insert_habit(&self, habit: Habit) {
        let mut state = self.lock();
        match state.habits.iter_mut().find(|h| h.id == habit.id) {
            Some(existing) => *existing = habit,
            None => state.habits.push(habit),
        }
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.lock().habits.clone()
    }

    pub fn checkins(&self) -> Vec<Checkin> {
        self.lock().checkins.clone()
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn hit(&self, what: &str) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        debug!("memory api: {}", what);
    }
}

/// Server-side cleanup of a submitted schedule: `days_21` gets its window,
/// weekdays outside 1..=7 are dropped, past specific dates are dropped and
/// a range never ends before it starts.
fn normalize_schedule(schedule: Option<Schedule>, today: NaiveDate) -> Schedule {
    let today_str = canonical_date(today);
    match schedule {
        None | Some(Schedule::AllTime) => Schedule::AllTime,
        Some(Schedule::Days21 { .. }) => Schedule::Days21 {
            start: Some(today_str),
            end: Some(canonical_date(today + Duration::days(20))),
        },
        Some(Schedule::DateRange { start, end }) => {
            let start = start.unwrap_or_else(|| today_str.clone());
            let end = end.filter(|e| *e >= start).unwrap_or_else(|| start.clone());
            Schedule::DateRange {
                start: Some(start),
                end: Some(end),
            }
        }
        Some(Schedule::Weekdays { days, .. }) => Schedule::Weekdays {
            days: days.into_iter().filter(|d| (1..=7).contains(d)).collect(),
            start: Some(today_str),
        },
        Some(Schedule::SpecificDates { dates, .. }) => Schedule::SpecificDates {
            dates: dates.into_iter().filter(|d| *d >= today_str).collect(),
            start: Some(today_str),
        },
    }
}

#[async_trait]
impl HabitApi for MemoryHabitApi {
    async fn list_habits(&self, query: &HabitQuery) -> Result<Vec<Habit>, AppError> {
        self.hit("list_habits");
        let archived = query.archived.unwrap_or(false);
        let mut habits: Vec<Habit> = self
            .lock()
            .habits
            .iter()
            .filter(|h| h.archived == archived)
            .cloned()
            .collect();
        habits.sort_by_key(|h| h.order);
        Ok(habits)
    }

    async fn get_habit(&self, id: &str) -> Result<Habit, AppError> {
        self.hit("get_habit");
        self.lock()
            .habits
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn create_habit(&self, req: &NewHabitRequest) -> Result<Habit, AppError> {
        self.hit("create_habit");
        let mut state = self.lock();
        let order = state.habits.iter().filter(|h| !h.archived).count() as i64;
        let now = Utc::now().to_rfc3339();

        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            name: req.name.clone(),
            habit_type: req.habit_type,
            frequency: req.frequency,
            schedule: Some(normalize_schedule(req.schedule.clone(), self.today())),
            time_of_day: req.time_of_day,
            start_date: req.start_date.clone(),
            goal: req.goal.clone(),
            color: req.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            icon: req.icon.clone(),
            category: req.category.clone(),
            order,
            archived: false,
            created_at: now,
            current_streak: Some(0),
        };
        state.habits.push(habit.clone());
        Ok(habit)
    }

    async fn update_habit(&self, id: &str, req: &UpdateHabitRequest) -> Result<Habit, AppError> {
        self.hit("update_habit");
        let today = self.today();
        let mut state = self.lock();
        let habit = state
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(AppError::NotFound)?;

        if let Some(name) = &req.name {
            habit.name = name.clone();
        }
        if let Some(habit_type) = req.habit_type {
            habit.habit_type = habit_type;
        }
        if let Some(frequency) = req.frequency {
            habit.frequency = frequency;
        }
        if let Some(schedule) = &req.schedule {
            habit.schedule = Some(normalize_schedule(Some(schedule.clone()), today));
        }
        if let Some(time_of_day) = req.time_of_day {
            habit.time_of_day = Some(time_of_day);
        }
        if let Some(goal) = &req.goal {
            habit.goal = Some(goal.clone());
        }
        if let Some(color) = &req.color {
            habit.color = color.clone();
        }
        if let Some(icon) = &req.icon {
            habit.icon = Some(icon.clone());
        }
        if let Some(category) = &req.category {
            habit.category = Some(category.clone());
        }
        if let Some(order) = req.order {
            habit.order = order;
        }
        if let Some(archived) = req.archived {
            habit.archived = archived;
        }
        Ok(habit.clone())
    }

    async fn delete_habit(&self, id: &str) -> Result<(), AppError> {
        self.hit("delete_habit");
        let mut state = self.lock();
        let before = state.habits.len();
        state.habits.retain(|h| h.id != id);
        if state.habits.len() == before {
            return Err(AppError::NotFound);
        }
        state.checkins.retain(|c| c.habit_id != id);
        Ok(())
    }

    async fn archive_habit(&self, id: &str) -> Result<(), AppError> {
        self.hit("archive_habit");
        let mut state = self.lock();
        let habit = state
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(AppError::NotFound)?;
        habit.archived = true;
        Ok(())
    }

    async fn reorder_habit(&self, id: &str, order: i64) -> Result<(), AppError> {
        self.hit("reorder_habit");
        let mut state = self.lock();
        let habit = state
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(AppError::NotFound)?;
        habit.order = order;
        Ok(())
    }

    async fn list_checkins(&self, query: &CheckinQuery) -> Result<Vec<Checkin>, AppError> {
        self.hit("list_checkins");
        let mut checkins: Vec<Checkin> = self
            .lock()
            .checkins
            .iter()
            .filter(|c| query.habit_id.as_deref().is_none_or(|id| c.habit_id == id))
            .filter(|c| query.start_date.as_deref().is_none_or(|s| c.date.as_str() >= s))
            .filter(|c| query.end_date.as_deref().is_none_or(|e| c.date.as_str() <= e))
            .cloned()
            .collect();
        checkins.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(checkins)
    }

    async fn today_checkins(&self) -> Result<Vec<Checkin>, AppError> {
        self.hit("today_checkins");
        let today = canonical_date(self.today());
        Ok(self
            .lock()
            .checkins
            .iter()
            .filter(|c| c.date == today)
            .cloned()
            .collect())
    }

    async fn create_checkin(&self, req: &NewCheckinRequest) -> Result<Checkin, AppError> {
        self.hit("create_checkin");
        let day = NaiveDate::parse_from_str(&req.date, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("Invalid date: {}", req.date)))?;
        let mut state = self.lock();

        let habit = state
            .habits
            .iter()
            .find(|h| h.id == req.habit_id)
            .ok_or(AppError::NotFound)?;
        if day > self.today() {
            return Err(AppError::BadRequest(
                "Cannot create check-in in the future".to_string(),
            ));
        }
        if !is_due(habit.schedule.as_ref(), day) {
            return Err(AppError::BadRequest(
                "Habit is not scheduled for this date".to_string(),
            ));
        }

        if let Some(existing) = state
            .checkins
            .iter_mut()
            .find(|c| c.habit_id == req.habit_id && c.date == req.date)
        {
            existing.completed = req.completed;
            existing.value = req.value;
            existing.skipped = req.skipped;
            return Ok(existing.clone());
        }

        let checkin = Checkin {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            habit_id: req.habit_id.clone(),
            date: req.date.clone(),
            completed: req.completed,
            value: req.value,
            skipped: req.skipped,
            created_at: Utc::now().to_rfc3339(),
        };
        state.checkins.push(checkin.clone());
        Ok(checkin)
    }

    async fn delete_checkin(&self, id: &str) -> Result<(), AppError> {
        self.hit("delete_checkin");
        let mut state = self.lock();
        let before = state.checkins.len();
        state.checkins.retain(|c| c.id != id);
        if state.checkins.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn habit_analytics(&self, id: &str, days: Option<u32>) -> Result<Value, AppError> {
        self.hit("habit_analytics");
        if !self.lock().habits.iter().any(|h| h.id == id) {
            return Err(AppError::NotFound);
        }
        Ok(json!({ "habit_id": id, "days": days.unwrap_or(30) }))
    }

    async fn heatmap(&self, days: u32) -> Result<Value, AppError> {
        self.hit("heatmap");
        Ok(json!({ "days": days, "data": [] }))
    }

    async fn insights(&self) -> Result<Value, AppError> {
        self.hit("insights");
        Ok(json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, HabitType};
    use std::collections::BTreeSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(name: &str, schedule: Option<Schedule>) -> NewHabitRequest {
        NewHabitRequest {
            name: name.to_string(),
            habit_type: HabitType::Positive,
            frequency: Frequency::Daily,
            schedule,
            time_of_day: None,
            start_date: "2024-01-01T00:00:00Z".to_string(),
            goal: None,
            color: None,
            icon: None,
            category: None,
        }
    }

    #[test]
    fn test_normalize_days_21_window() {
        let schedule = normalize_schedule(Some(Schedule::Days21 { start: None, end: None }), date("2024-01-01"));
        assert_eq!(
            schedule,
            Schedule::Days21 {
                start: Some("2024-01-01".to_string()),
                end: Some("2024-01-21".to_string()),
            }
        );
    }

    #[test]
    fn test_normalize_filters() {
        let today = date("2024-01-10");
        let weekdays = normalize_schedule(
            Some(Schedule::Weekdays {
                days: BTreeSet::from([0, 1, 7, 8]),
                start: None,
            }),
            today,
        );
        assert!(matches!(weekdays, Schedule::Weekdays { ref days, .. } if *days == BTreeSet::from([1, 7])));

        let range = normalize_schedule(
            Some(Schedule::DateRange {
                start: Some("2024-02-01".to_string()),
                end: Some("2024-01-15".to_string()),
            }),
            today,
        );
        assert_eq!(
            range,
            Schedule::DateRange {
                start: Some("2024-02-01".to_string()),
                end: Some("2024-02-01".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_create_orders_and_defaults() {
        let api = MemoryHabitApi::new().with_today(date("2024-01-10"));
        let first = api.create_habit(&request("a", None)).await.unwrap();
        let second = api.create_habit(&request("b", None)).await.unwrap();
        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);
        assert_eq!(first.color, DEFAULT_COLOR);
        assert_eq!(first.schedule, Some(Schedule::AllTime));
    }

    #[tokio::test]
    async fn test_checkin_rules() {
        let api = MemoryHabitApi::new().with_today(date("2024-01-10"));
        let habit = api
            .create_habit(&request(
                "weekly",
                Some(Schedule::Weekdays {
                    // 2024-01-10 is a Wednesday.
                    days: BTreeSet::from([3]),
                    start: None,
                }),
            ))
            .await
            .unwrap();

        let future = api
            .create_checkin(&NewCheckinRequest::completed(&habit.id, "2024-01-11"))
            .await;
        assert!(matches!(future, Err(AppError::BadRequest(_))));

        let unscheduled = api
            .create_checkin(&NewCheckinRequest::completed(&habit.id, "2024-01-09"))
            .await;
        assert!(matches!(unscheduled, Err(AppError::BadRequest(_))));

        let first = api
            .create_checkin(&NewCheckinRequest::completed(&habit.id, "2024-01-10"))
            .await
            .unwrap();
        let mut again = NewCheckinRequest::completed(&habit.id, "2024-01-10");
        again.completed = false;
        let second = api.create_checkin(&again).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(api.checkins().len(), 1);
        assert!(!api.checkins()[0].completed);

        api.delete_habit(&habit.id).await.unwrap();
        assert!(api.checkins().is_empty());
    }

    #[tokio::test]
    async fn test_weekday_checkin_before_start_is_accepted() {
        let api = MemoryHabitApi::new().with_today(date("2024-01-10"));
        let habit = api
            .create_habit(&request(
                "weekly",
                Some(Schedule::Weekdays {
                    days: BTreeSet::from([1]),
                    start: None,
                }),
            ))
            .await
            .unwrap();
        assert!(matches!(
            &habit.schedule,
            Some(Schedule::Weekdays { start: Some(start), .. }) if start == "2024-01-10"
        ));

        // Monday before the stored start.
        let checkin = api
            .create_checkin(&NewCheckinRequest::completed(&habit.id, "2024-01-08"))
            .await
            .unwrap();
        assert!(checkin.completed);
    }
}
