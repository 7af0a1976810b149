pub mod checkin;
pub mod habit;

pub use checkin::{Checkin, NewCheckinRequest};
pub use habit::{
    DEFAULT_COLOR, Frequency, Habit, HabitForm, HabitType, NewHabitRequest, TimeOfDay,
    UpdateHabitRequest,
};
