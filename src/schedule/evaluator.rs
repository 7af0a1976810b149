use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::Value;

use super::Schedule;

/// Anything that can be read as a calendar day in the local time zone.
pub trait LocalDay {
    fn local_day(&self) -> NaiveDate;
}

impl LocalDay for NaiveDate {
    fn local_day(&self) -> NaiveDate {
        *self
    }
}

impl LocalDay for NaiveDateTime {
    fn local_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> LocalDay for DateTime<Tz> {
    fn local_day(&self) -> NaiveDate {
        self.with_timezone(&Local).date_naive()
    }
}

impl<T: LocalDay + ?Sized> LocalDay for &T {
    fn local_day(&self) -> NaiveDate {
        (**self).local_day()
    }
}

/// `yyyy-MM-dd`, the form every date comparison in this crate uses.
pub fn canonical_date(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Monday = 1 through Sunday = 7.
pub fn iso_weekday(day: NaiveDate) -> i64 {
    i64::from(day.weekday().number_from_monday())
}

/// Whether a habit with this schedule is due on `day`.
///
/// Never fails. An absent schedule is always due; an empty weekday or date
/// set is never due.
pub fn is_due(schedule: Option<&Schedule>, day: impl LocalDay) -> bool {
    let day = day.local_day();
    let day_str = canonical_date(day);

    let Some(schedule) = schedule else {
        return true;
    };

    match schedule {
        Schedule::AllTime => true,
        Schedule::DateRange { start, end } | Schedule::Days21 { start, end } => {
            if start.as_deref().is_some_and(|start| day_str.as_str() < start) {
                return false;
            }
            if end.as_deref().is_some_and(|end| day_str.as_str() > end) {
                return false;
            }
            true
        }
        Schedule::Weekdays { days, .. } => days.contains(&iso_weekday(day)),
        Schedule::SpecificDates { dates, .. } => dates.contains(&day_str),
    }
}

/// Evaluates a raw backend value; unrecognized shapes are always due.
pub fn is_due_value(schedule: Option<&Value>, day: impl LocalDay) -> bool {
    let schedule = schedule.and_then(Schedule::from_value);
    is_due(schedule.as_ref(), day)
}
