use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{error, info};

use crate::api::{HabitApi, HabitQuery};
use crate::error::AppError;
use crate::models::{Habit, HabitForm};
use crate::schedule::canonical_date;
use crate::state::SharedStore;

/// Habit CRUD against the backend, mirrored into the shared store.
#[derive(Clone)]
pub struct HabitService {
    api: Arc<dyn HabitApi>,
    store: SharedStore,
}

impl HabitService {
    pub fn new(api: Arc<dyn HabitApi>, store: SharedStore) -> Self {
        Self { api, store }
    }

    /// Reloads the active habits. `as_of` is the day streaks are computed for.
    pub async fn refresh(&self, as_of: Option<NaiveDate>) -> Result<Vec<Habit>, AppError> {
        self.store.write().await.habits.begin_fetch();

        let query = HabitQuery::active(as_of.map(canonical_date));
        match self.api.list_habits(&query).await {
            Ok(habits) => {
                info!("Fetched {} habits", habits.len());
                self.store.write().await.habits.set_all(habits.clone());
                Ok(habits)
            }
            Err(e) => {
                error!("Failed to fetch habits: {}", e);
                self.store.write().await.habits.fail(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn create(&self, form: &HabitForm, today: NaiveDate) -> Result<Habit, AppError> {
        let req = form.to_new_request(today)?;
        let habit = self.record(self.api.create_habit(&req).await).await?;
        info!("Created habit {} ({})", habit.name, habit.id);
        self.store.write().await.habits.insert(habit.clone());
        Ok(habit)
    }

    /// Replaces every editable field of the habit, then reloads the list so
    /// server-computed fields stay current.
    pub async fn update(&self, id: &str, form: &HabitForm, today: NaiveDate) -> Result<Habit, AppError> {
        let req = form.to_update_request(today)?;
        let habit = self.record(self.api.update_habit(id, &req).await).await?;
        self.store.write().await.habits.replace(habit.clone());
        self.refresh(Some(today)).await?;
        Ok(habit)
    }

    pub async fn archive(&self, id: &str) -> Result<(), AppError> {
        self.record(self.api.archive_habit(id).await).await?;
        self.store.write().await.habits.mark_archived(id);
        info!("Archived habit {}", id);
        Ok(())
    }

    /// Deletes the habit; its checkins go with it.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.record(self.api.delete_habit(id).await).await?;
        let mut store = self.store.write().await;
        store.habits.remove(id);
        store.checkins.remove_habit(id);
        info!("Deleted habit {}", id);
        Ok(())
    }

    pub async fn reorder(&self, id: &str, order: i64) -> Result<(), AppError> {
        self.record(self.api.reorder_habit(id, order).await).await?;
        self.store.write().await.habits.set_order(id, order);
        Ok(())
    }

    /// Refetches one habit and swaps it into the store.
    pub async fn reload(&self, id: &str) -> Result<Habit, AppError> {
        let habit = self.record(self.api.get_habit(id).await).await?;
        let mut store = self.store.write().await;
        if !store.habits.replace(habit.clone()) {
            store.habits.insert(habit.clone());
        }
        Ok(habit)
    }

    /// Server-computed analytics for one habit, passed through untouched.
    pub async fn analytics(&self, id: &str, days: Option<u32>) -> Result<Value, AppError> {
        self.record(self.api.habit_analytics(id, days).await).await
    }

    pub async fn heatmap(&self, days: u32) -> Result<Value, AppError> {
        self.record(self.api.heatmap(days).await).await
    }

    pub async fn insights(&self) -> Result<Value, AppError> {
        self.record(self.api.insights().await).await
    }

    async fn record<T>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(e) = &result {
            error!("Habit request failed: {}", e);
            self.store.write().await.habits.error = Some(e.to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryHabitApi;
    use crate::store::ClientStore;
    use tokio::sync::RwLock;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn service() -> (HabitService, SharedStore, Arc<MemoryHabitApi>) {
        let api = Arc::new(MemoryHabitApi::new().with_today(today()));
        let store: SharedStore = Arc::new(RwLock::new(ClientStore::default()));
        (HabitService::new(api.clone(), store.clone()), store, api)
    }

    #[tokio::test]
    async fn test_create_update_archive() {
        let (service, store, _api) = service();

        let habit = service.create(&HabitForm::new("Read"), today()).await.unwrap();
        assert_eq!(store.read().await.habits.habits.len(), 1);

        let mut form = HabitForm::from_habit(&habit, today());
        form.name = "Read more".to_string();
        let updated = service.update(&habit.id, &form, today()).await.unwrap();
        assert_eq!(updated.name, "Read more");
        assert_eq!(store.read().await.habits.get(&habit.id).unwrap().name, "Read more");

        service.archive(&habit.id).await.unwrap();
        assert!(store.read().await.habits.active().is_empty());

        service.refresh(Some(today())).await.unwrap();
        assert!(store.read().await.habits.habits.is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected_before_request() {
        let (service, _store, api) = service();
        let err = service.create(&HabitForm::new(""), today()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(api.request_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_keeps_last_good_state() {
        let (service, store, _api) = service();
        service.create(&HabitForm::new("Run"), today()).await.unwrap();

        let err = service.delete("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));

        let store = store.read().await;
        assert_eq!(store.habits.habits.len(), 1);
        assert!(store.habits.error.is_some());
    }

    #[tokio::test]
    async fn test_reorder_and_delete() {
        let (service, store, api) = service();
        let a = service.create(&HabitForm::new("a"), today()).await.unwrap();
        let b = service.create(&HabitForm::new("b"), today()).await.unwrap();

        service.reorder(&b.id, -1).await.unwrap();
        let order: Vec<String> = store.read().await.habits.active().iter().map(|h| h.id.clone()).collect();
        assert_eq!(order, vec![b.id.clone(), a.id.clone()]);

        service.delete(&a.id).await.unwrap();
        assert_eq!(api.habits().len(), 1);
        assert!(store.read().await.habits.get(&a.id).is_none());
    }

    #[tokio::test]
    async fn test_reload_replaces_cached_habit() {
        let (service, store, api) = service();
        let habit = service.create(&HabitForm::new("Journal"), today()).await.unwrap();

        let mut changed = api.habits()[0].clone();
        changed.current_streak = Some(9);
        api.insert_habit(changed);

        let reloaded = service.reload(&habit.id).await.unwrap();
        assert_eq!(reloaded.streak(), 9);
        assert_eq!(store.read().await.habits.get(&habit.id).unwrap().streak(), 9);
        assert_eq!(store.read().await.habits.habits.len(), 1);

        let err = service.reload("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_analytics_pass_through() {
        let (service, _store, _api) = service();
        let habit = service.create(&HabitForm::new("Journal"), today()).await.unwrap();

        let analytics = service.analytics(&habit.id, Some(7)).await.unwrap();
        assert_eq!(analytics["habit_id"], habit.id.as_str());
        assert_eq!(analytics["days"], 7);

        let heatmap = service.heatmap(90).await.unwrap();
        assert_eq!(heatmap["days"], 90);
        assert!(service.insights().await.unwrap().is_object());

        assert!(matches!(
            service.analytics("missing", None).await,
            Err(AppError::NotFound)
        ));
    }
}
