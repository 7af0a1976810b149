use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::HabitApi;
use crate::services::{CheckinService, HabitService};
use crate::storage::Preferences;
use crate::store::ClientStore;

pub type SharedStore = Arc<RwLock<ClientStore>>;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn HabitApi>,
    pub store: SharedStore,
    pub prefs: Preferences,
}

impl AppState {
    pub fn new(api: Arc<dyn HabitApi>, prefs: Preferences) -> Self {
        Self {
            api,
            store: Arc::new(RwLock::new(ClientStore::default())),
            prefs,
        }
    }

    pub fn habit_service(&self) -> HabitService {
        HabitService::new(self.api.clone(), self.store.clone())
    }

    pub fn checkin_service(&self) -> CheckinService {
        CheckinService::new(self.api.clone(), self.store.clone())
    }
}
