use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use super::calendar::week_days;
use super::habit_service::HabitService;
use crate::api::{CheckinQuery, HabitApi};
use crate::error::AppError;
use crate::models::{Checkin, NewCheckinRequest};
use crate::schedule::canonical_date;
use crate::state::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The day is in the future; nothing was sent.
    Ignored,
    /// A toggle for the same habit and day has not finished yet.
    InFlight,
    Checked,
    Unchecked,
}

type ToggleKey = (String, NaiveDate);

/// Releases the in-flight slot when the toggle finishes, however it ends.
struct InFlightGuard {
    pending: Arc<Mutex<HashSet<ToggleKey>>>,
    key: ToggleKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        pending.remove(&self.key);
    }
}

#[derive(Clone)]
pub struct CheckinService {
    api: Arc<dyn HabitApi>,
    store: SharedStore,
    habits: HabitService,
    pending: Arc<Mutex<HashSet<ToggleKey>>>,
}

impl CheckinService {
    pub fn new(api: Arc<dyn HabitApi>, store: SharedStore) -> Self {
        Self {
            habits: HabitService::new(api.clone(), store.clone()),
            api,
            store,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Refetches `[start, end]` and swaps it into the store.
    pub async fn refresh_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Checkin>, AppError> {
        let (start, end) = (canonical_date(start), canonical_date(end));
        self.store.write().await.checkins.begin_fetch();

        let query = CheckinQuery::range(start.clone(), end.clone());
        match self.api.list_checkins(&query).await {
            Ok(checkins) => {
                debug!("Fetched {} checkins for {}..{}", checkins.len(), start, end);
                self.store
                    .write()
                    .await
                    .checkins
                    .replace_range(&start, &end, checkins.clone());
                Ok(checkins)
            }
            Err(e) => {
                error!("Failed to fetch checkins for {}..{}: {}", start, end, e);
                self.store.write().await.checkins.fail(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn refresh_week(&self, day: NaiveDate) -> Result<Vec<Checkin>, AppError> {
        let days = week_days(day);
        self.refresh_range(days[0], days[6]).await
    }

    pub async fn refresh_today(&self) -> Result<Vec<Checkin>, AppError> {
        match self.api.today_checkins().await {
            Ok(checkins) => {
                self.store.write().await.checkins.set_today(checkins.clone());
                Ok(checkins)
            }
            Err(e) => {
                error!("Failed to fetch today's checkins: {}", e);
                self.store.write().await.checkins.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Flips the completion of `habit_id` on `day`.
    ///
    /// A completed checkin is deleted, anything else is replaced by a
    /// completed one. Afterwards the day's checkins and the habit list are
    /// reloaded so streaks follow the backend. Reload failures are logged
    /// and recorded in the store but do not change the returned outcome.
    pub async fn toggle(&self, habit_id: &str, day: NaiveDate, today: NaiveDate) -> Result<ToggleOutcome, AppError> {
        if day > today {
            debug!("Ignoring toggle of {} on future day {}", habit_id, day);
            return Ok(ToggleOutcome::Ignored);
        }

        let key = (habit_id.to_string(), day);
        {
            let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
            if !pending.insert(key.clone()) {
                debug!("Toggle of {} on {} already in flight", habit_id, day);
                return Ok(ToggleOutcome::InFlight);
            }
        }
        let _guard = InFlightGuard {
            pending: self.pending.clone(),
            key,
        };

        let date = canonical_date(day);
        let existing = self
            .store
            .read()
            .await
            .checkins
            .find(habit_id, &date)
            .cloned();

        let outcome = match existing {
            Some(checkin) if checkin.completed => {
                if let Err(e) = self.api.delete_checkin(&checkin.id).await {
                    return Err(self.fail(e).await);
                }
                self.store.write().await.checkins.remove(&checkin.id);
                ToggleOutcome::Unchecked
            }
            _ => {
                let req = NewCheckinRequest::completed(habit_id, date.clone());
                let created = match self.api.create_checkin(&req).await {
                    Ok(created) => created,
                    Err(e) => return Err(self.fail(e).await),
                };
                self.store
                    .write()
                    .await
                    .checkins
                    .upsert(created, &canonical_date(today));
                ToggleOutcome::Checked
            }
        };
        info!("Toggled {} on {}: {:?}", habit_id, date, outcome);

        if let Err(e) = self.refresh_range(day, day).await {
            warn!("Checkin reload after toggle failed: {}", e);
        }
        if let Err(e) = self.habits.refresh(Some(today)).await {
            warn!("Habit reload after toggle failed: {}", e);
        }

        Ok(outcome)
    }

    async fn fail(&self, e: AppError) -> AppError {
        error!("Checkin request failed: {}", e);
        self.store.write().await.checkins.error = Some(e.to_string());
        e
    }
}
