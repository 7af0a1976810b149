use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::{ApiConfig, CheckinQuery, HabitApi, HabitQuery};
use crate::error::AppError;
use crate::models::{Checkin, Habit, NewCheckinRequest, NewHabitRequest, UpdateHabitRequest};
use crate::storage::Preferences;

/// `HabitApi` over HTTP with bearer-token authorization.
pub struct HttpHabitApi {
    client: Client,
    config: ApiConfig,
    prefs: Preferences,
}

impl HttpHabitApi {
    pub fn new(config: ApiConfig, prefs: Preferences) -> Result<Self, AppError> {
        let client = Client::builder().build()?;
        Ok(Self { client, config, prefs })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, AppError> {
        let endpoint = self.config.endpoint(path);
        let mut url = Url::parse(&endpoint)
            .map_err(|e| AppError::Config(format!("invalid URL {}: {}", endpoint, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, AppError> {
        let builder = match self.prefs.access_token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        debug!("{} {}", status, response.url().path());

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = AppError::from_response(status, &body);
        if let AppError::Unauthorized = err {
            warn!("backend rejected the access token, clearing it");
            self.prefs.clear_access_token().await?;
        }
        Err(err)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let body_text = response.text().await?;
        serde_json::from_str::<T>(&body_text).map_err(|e| {
            error!("Failed to parse backend response: {}", e);
            AppError::Serialization(e)
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, AppError> {
        let url = self.url(path, query)?;
        let response = self.send(self.client.get(url)).await?;
        Self::json(response).await
    }
}

#[async_trait]
impl HabitApi for HttpHabitApi {
    async fn list_habits(&self, query: &HabitQuery) -> Result<Vec<Habit>, AppError> {
        self.get("/habits/", &query.pairs()).await
    }

    async fn get_habit(&self, id: &str) -> Result<Habit, AppError> {
        self.get(&format!("/habits/{}", id), &[]).await
    }

    async fn create_habit(&self, req: &NewHabitRequest) -> Result<Habit, AppError> {
        let url = self.url("/habits/", &[])?;
        let response = self.send(self.client.post(url).json(req)).await?;
        Self::json(response).await
    }

    async fn update_habit(&self, id: &str, req: &UpdateHabitRequest) -> Result<Habit, AppError> {
        let url = self.url(&format!("/habits/{}", id), &[])?;
        let response = self.send(self.client.put(url).json(req)).await?;
        Self::json(response).await
    }

    async fn delete_habit(&self, id: &str) -> Result<(), AppError> {
        let url = self.url(&format!("/habits/{}", id), &[])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn archive_habit(&self, id: &str) -> Result<(), AppError> {
        let url = self.url(&format!("/habits/{}/archive", id), &[])?;
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    async fn reorder_habit(&self, id: &str, order: i64) -> Result<(), AppError> {
        let url = self.url(&format!("/habits/{}/order", id), &[("order", order.to_string())])?;
        self.send(self.client.patch(url)).await?;
        Ok(())
    }

    async fn list_checkins(&self, query: &CheckinQuery) -> Result<Vec<Checkin>, AppError> {
        self.get("/checkins/", &query.pairs()).await
    }

    async fn today_checkins(&self) -> Result<Vec<Checkin>, AppError> {
        self.get("/checkins/today", &[]).await
    }

    async fn create_checkin(&self, req: &NewCheckinRequest) -> Result<Checkin, AppError> {
        let url = self.url("/checkins/", &[])?;
        let response = self.send(self.client.post(url).json(req)).await?;
        Self::json(response).await
    }

    async fn delete_checkin(&self, id: &str) -> Result<(), AppError> {
        let url = self.url(&format!("/checkins/{}", id), &[])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn habit_analytics(&self, id: &str, days: Option<u32>) -> Result<Value, AppError> {
        let query: Vec<(&str, String)> = days.map(|d| ("days", d.to_string())).into_iter().collect();
        self.get(&format!("/analytics/habits/{}", id), &query).await
    }

    async fn heatmap(&self, days: u32) -> Result<Value, AppError> {
        self.get("/analytics/heatmap", &[("days", days.to_string())]).await
    }

    async fn insights(&self) -> Result<Value, AppError> {
        self.get("/analytics/insights", &[]).await
    }
}
