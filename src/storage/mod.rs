//! Small persistent key-value capability for the bearer token and theme.
//!
//! Callers receive a [`KeyValueStore`] instead of reaching for global state.

pub mod sqlite;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::AppError;

pub use sqlite::SqliteKeyValueStore;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const THEME_KEY: &str = "theme";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed access to the values the client persists between runs.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub async fn access_token(&self) -> Result<Option<String>, AppError> {
        Ok(self
            .store
            .get(ACCESS_TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty()))
    }

    pub async fn set_access_token(&self, token: &str) -> Result<(), AppError> {
        self.store.set(ACCESS_TOKEN_KEY, token).await
    }

    pub async fn clear_access_token(&self) -> Result<(), AppError> {
        self.store.remove(ACCESS_TOKEN_KEY).await
    }

    /// Unknown stored values read as the default theme.
    pub async fn theme(&self) -> Result<Theme, AppError> {
        let theme = match self.store.get(THEME_KEY).await?.as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        };
        Ok(theme)
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), AppError> {
        self.store.set(THEME_KEY, theme.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_get_set_remove() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let prefs = Preferences::in_memory();
        assert_eq!(prefs.access_token().await.unwrap(), None);

        prefs.set_access_token("abc").await.unwrap();
        assert_eq!(prefs.access_token().await.unwrap().as_deref(), Some("abc"));

        prefs.clear_access_token().await.unwrap();
        assert_eq!(prefs.access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_theme_defaults_to_light() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let prefs = Preferences::new(store.clone());
        assert_eq!(prefs.theme().await.unwrap(), Theme::Light);

        prefs.set_theme(Theme::Dark).await.unwrap();
        assert_eq!(prefs.theme().await.unwrap(), Theme::Dark);

        store.set(THEME_KEY, "solarized").await.unwrap();
        assert_eq!(prefs.theme().await.unwrap(), Theme::Light);
    }
}
