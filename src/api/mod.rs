pub mod dto;
pub mod http;
pub mod memory;

use std::env;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;
use crate::models::{Checkin, Habit, NewCheckinRequest, NewHabitRequest, UpdateHabitRequest};

pub use dto::{CheckinQuery, HabitQuery};
pub use http::HttpHabitApi;
pub use memory::MemoryHabitApi;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PREFIX: &str = "/api/v1";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub prefix: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("HABIT_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "HABIT_API_URL must be an http(s) URL, got {}",
                base_url
            )));
        }
        let prefix = env::var("HABIT_API_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());

        Ok(Self { base_url, prefix })
    }

    /// Absolute URL for a path under the versioned prefix.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}{}", base, prefix, path)
        }
    }
}

/// The habit backend's REST surface.
#[async_trait]
pub trait HabitApi: Send + Sync {
    async fn list_habits(&self, query: &HabitQuery) -> Result<Vec<Habit>, AppError>;
    async fn get_habit(&self, id: &str) -> Result<Habit, AppError>;
    async fn create_habit(&self, req: &NewHabitRequest) -> Result<Habit, AppError>;
    async fn update_habit(&self, id: &str, req: &UpdateHabitRequest) -> Result<Habit, AppError>;
    async fn delete_habit(&self, id: &str) -> Result<(), AppError>;
    async fn archive_habit(&self, id: &str) -> Result<(), AppError>;
    async fn reorder_habit(&self, id: &str, order: i64) -> Result<(), AppError>;

    async fn list_checkins(&self, query: &CheckinQuery) -> Result<Vec<Checkin>, AppError>;
    async fn today_checkins(&self) -> Result<Vec<Checkin>, AppError>;
    async fn create_checkin(&self, req: &NewCheckinRequest) -> Result<Checkin, AppError>;
    async fn delete_checkin(&self, id: &str) -> Result<(), AppError>;

    /// Analytics are computed server-side and passed through untouched.
    async fn habit_analytics(&self, id: &str, days: Option<u32>) -> Result<Value, AppError>;
    async fn heatmap(&self, days: u32) -> Result<Value, AppError>;
    async fn insights(&self) -> Result<Value, AppError>;
}
