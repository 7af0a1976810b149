use std::time::Duration;

use chrono::Local;
use tracing::{info, warn};

use crate::error::AppError;
use crate::services::{CheckinService, HabitService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshStats {
    pub habits: usize,
    pub checkins: usize,
}

/// Periodically reloads habits and the current week's checkins.
pub struct RefreshScheduler {
    habits: HabitService,
    checkins: CheckinService,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(habits: HabitService, checkins: CheckinService, interval: Duration) -> Self {
        Self {
            habits,
            checkins,
            interval,
        }
    }

    /// Runs until the task is dropped or aborted.
    pub async fn start(self) {
        info!("Starting refresh scheduler (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.run_once().await {
                Ok(stats) => {
                    info!(
                        "Refresh completed - {} habits, {} checkins this week",
                        stats.habits, stats.checkins
                    );
                }
                Err(e) => {
                    // Keep going; the next tick retries.
                    warn!("Refresh failed: {:?}", e);
                }
            }
        }
    }

    pub async fn run_once(&self) -> Result<RefreshStats, AppError> {
        let today = Local::now().date_naive();
        let habits = self.habits.refresh(Some(today)).await?;
        let checkins = self.checkins.refresh_week(today).await?;
        self.checkins.refresh_today().await?;

        Ok(RefreshStats {
            habits: habits.len(),
            checkins: checkins.len(),
        })
    }
}
