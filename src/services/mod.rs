pub mod calendar;
pub mod checkin_service;
pub mod habit_service;
pub mod refresh;

pub use calendar::{AgendaEntry, AgendaGroup, DayStatus, day_agenda, is_day_complete, week_days, week_summary};
pub use checkin_service::{CheckinService, ToggleOutcome};
pub use habit_service::HabitService;
pub use refresh::{RefreshScheduler, RefreshStats};
