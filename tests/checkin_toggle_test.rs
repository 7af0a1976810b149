use std::sync::Arc;

use chrono::NaiveDate;

use habit_client::api::MemoryHabitApi;
use habit_client::models::HabitForm;
use habit_client::schedule::{ScheduleFormState, ScheduleMode};
use habit_client::services::{ToggleOutcome, is_day_complete, week_summary};
use habit_client::state::AppState;
use habit_client::storage::Preferences;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup(today: NaiveDate) -> (AppState, Arc<MemoryHabitApi>) {
    let api = Arc::new(MemoryHabitApi::new().with_today(today));
    (AppState::new(api.clone(), Preferences::in_memory()), api)
}

#[tokio::test]
async fn test_day_completes_when_every_scheduled_habit_is_checked() {
    // Wednesday.
    let today = date("2024-01-10");
    let (state, _api) = setup(today);
    let habits = state.habit_service();
    let checkins = state.checkin_service();

    let read = habits.create(&HabitForm::new("Read"), today).await.unwrap();
    let walk = habits.create(&HabitForm::new("Walk"), today).await.unwrap();
    let mut mondays = HabitForm::new("Plan week");
    mondays.schedule = ScheduleFormState::new(ScheduleMode::Weekdays);
    mondays.schedule.toggle_weekday(1);
    habits.create(&mondays, today).await.unwrap();

    let outcome = checkins.toggle(&read.id, today, today).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Checked);
    {
        let store = state.store.read().await;
        assert!(!is_day_complete(today, &store.habits.habits, &store.checkins.checkins));
    }

    checkins.toggle(&walk.id, today, today).await.unwrap();
    {
        let store = state.store.read().await;
        assert!(is_day_complete(today, &store.habits.habits, &store.checkins.checkins));

        let week = week_summary(today, &store.habits.habits, &store.checkins.checkins);
        assert_eq!(week[0].scheduled, 3);
        assert_eq!(week[2].completed, 2);
        assert!(week[2].complete);
    }

    let outcome = checkins.toggle(&walk.id, today, today).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Unchecked);
    let store = state.store.read().await;
    assert!(!is_day_complete(today, &store.habits.habits, &store.checkins.checkins));
}

#[tokio::test]
async fn test_future_toggle_sends_nothing() {
    let today = date("2024-01-10");
    let (state, api) = setup(today);
    let habit = state
        .habit_service()
        .create(&HabitForm::new("Read"), today)
        .await
        .unwrap();
    let before = api.request_count();

    let outcome = state
        .checkin_service()
        .toggle(&habit.id, date("2024-01-12"), today)
        .await
        .unwrap();

    assert_eq!(outcome, ToggleOutcome::Ignored);
    assert_eq!(api.request_count(), before);
    assert!(api.checkins().is_empty());
}

#[tokio::test]
async fn test_unscheduled_day_is_rejected_and_state_kept() {
    let today = date("2024-01-10");
    let (state, api) = setup(today);
    let mut form = HabitForm::new("Plan week");
    form.schedule = ScheduleFormState::new(ScheduleMode::Weekdays);
    form.schedule.toggle_weekday(1);
    let habit = state.habit_service().create(&form, today).await.unwrap();

    let result = state.checkin_service().toggle(&habit.id, today, today).await;
    assert!(result.is_err());
    assert!(api.checkins().is_empty());

    let store = state.store.read().await;
    assert_eq!(store.habits.habits.len(), 1);
    assert!(store.checkins.error.is_some());
}

#[tokio::test]
async fn test_toggle_refetches_habits() {
    let today = date("2024-01-10");
    let (state, api) = setup(today);
    let habit = state
        .habit_service()
        .create(&HabitForm::new("Read"), today)
        .await
        .unwrap();

    let mut renamed = api.habits()[0].clone();
    renamed.current_streak = Some(5);
    api.insert_habit(renamed);

    state
        .checkin_service()
        .toggle(&habit.id, today, today)
        .await
        .unwrap();

    let store = state.store.read().await;
    assert_eq!(store.habits.get(&habit.id).unwrap().streak(), 5);
}
