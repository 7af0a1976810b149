use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use habit_client::api::{ApiConfig, HabitApi, HttpHabitApi, MemoryHabitApi};
use habit_client::error::AppError;
use habit_client::models::{Frequency, HabitForm, TimeOfDay};
use habit_client::schedule::{ScheduleFormState, ScheduleMode};
use habit_client::services::{RefreshScheduler, day_agenda, week_summary};
use habit_client::state::AppState;
use habit_client::storage::{Preferences, SqliteKeyValueStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "habit_client=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://habit-client.db".to_string());
    let prefs = Preferences::new(Arc::new(SqliteKeyValueStore::connect(&database_url).await?));
    info!("Theme: {}", prefs.theme().await?);

    let offline = std::env::var("HABIT_OFFLINE")
        .map(|v| !v.is_empty() && v != "0")
        .unwrap_or(false);

    let api: Arc<dyn HabitApi> = if offline {
        info!("HABIT_OFFLINE set, using the in-memory backend");
        let api = MemoryHabitApi::new();
        seed(&api).await?;
        Arc::new(api)
    } else {
        let config = ApiConfig::new_from_env()?;
        info!("Using backend at {}", config.endpoint(""));
        Arc::new(HttpHabitApi::new(config, prefs.clone())?)
    };

    let state = AppState::new(api, prefs);
    let habits = state.habit_service();
    let checkins = state.checkin_service();
    let today = Local::now().date_naive();

    habits.refresh(Some(today)).await?;
    checkins.refresh_week(today).await?;

    {
        let store = state.store.read().await;
        for group in day_agenda(today, &store.habits.habits, &store.checkins.checkins) {
            let slot = group
                .time_of_day
                .map(|t| t.as_str())
                .unwrap_or("anytime");
            for entry in group.daily.iter().chain(group.weekly.iter()) {
                info!(
                    "[{}] {} {} (streak {})",
                    slot,
                    if entry.completed { "x" } else { " " },
                    entry.habit.name,
                    entry.habit.streak()
                );
            }
        }
        for day in week_summary(today, &store.habits.habits, &store.checkins.checkins) {
            info!("{} {}/{} complete={}", day.date, day.completed, day.scheduled, day.complete);
        }
    }

    match habits.insights().await {
        Ok(insights) => info!("Insights: {}", insights),
        Err(e) => warn!("Insights unavailable: {}", e),
    }
    match habits.heatmap(30).await {
        Ok(heatmap) => debug!("Heatmap (30 days): {}", heatmap),
        Err(e) => warn!("Heatmap unavailable: {}", e),
    }

    let interval = std::env::var("REFRESH_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0);
    match interval {
        Some(secs) => {
            RefreshScheduler::new(habits, checkins, Duration::from_secs(secs))
                .start()
                .await;
        }
        None => warn!("REFRESH_INTERVAL_SECS not set, exiting after one refresh"),
    }

    Ok(())
}

/// Demo data for offline mode.
async fn seed(api: &MemoryHabitApi) -> Result<(), AppError> {
    let today = Local::now().date_naive();

    let mut read = HabitForm::new("Read 20 pages");
    read.time_of_day = Some(TimeOfDay::Evening);

    let mut gym = HabitForm::new("Gym");
    gym.time_of_day = Some(TimeOfDay::Morning);
    gym.frequency = Frequency::Weekly;
    gym.schedule = ScheduleFormState::new(ScheduleMode::Weekdays);
    for day in [1, 3, 5] {
        gym.schedule.toggle_weekday(day);
    }

    let mut water = HabitForm::new("Drink water");
    water.schedule = ScheduleFormState::new(ScheduleMode::Days21);

    for form in [read, gym, water] {
        api.create_habit(&form.to_new_request(today)?).await?;
    }
    Ok(())
}
