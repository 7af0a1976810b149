use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{Checkin, Frequency, Habit, TimeOfDay};
use crate::schedule::canonical_date;

/// Latest completion flag per habit for one day. Later entries in the
/// slice overwrite earlier ones.
fn completion_on<'a>(date: &str, checkins: &'a [Checkin]) -> HashMap<&'a str, bool> {
    let mut latest = HashMap::new();
    for checkin in checkins.iter().filter(|c| c.date == date) {
        latest.insert(checkin.habit_id.as_str(), checkin.completed);
    }
    latest
}

fn scheduled_on(day: NaiveDate, habits: &[Habit]) -> impl Iterator<Item = &Habit> {
    habits.iter().filter(move |h| !h.archived && h.is_due(day))
}

/// A day is complete when at least one habit is scheduled and every
/// scheduled habit has a completed checkin for that day.
pub fn is_day_complete(day: NaiveDate, habits: &[Habit], checkins: &[Checkin]) -> bool {
    status_for(day, habits, checkins).complete
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStatus {
    pub date: NaiveDate,
    pub scheduled: usize,
    pub completed: usize,
    pub complete: bool,
}

fn status_for(day: NaiveDate, habits: &[Habit], checkins: &[Checkin]) -> DayStatus {
    let done = completion_on(&canonical_date(day), checkins);
    let mut scheduled = 0;
    let mut completed = 0;
    for habit in scheduled_on(day, habits) {
        scheduled += 1;
        if done.get(habit.id.as_str()).copied().unwrap_or(false) {
            completed += 1;
        }
    }
    DayStatus {
        date: day,
        scheduled,
        completed,
        complete: scheduled > 0 && completed == scheduled,
    }
}

/// Monday through Sunday of the week containing `day`.
pub fn week_days(day: NaiveDate) -> Vec<NaiveDate> {
    let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    (0..7).map(|offset| monday + Duration::days(offset)).collect()
}

pub fn week_summary(day: NaiveDate, habits: &[Habit], checkins: &[Checkin]) -> Vec<DayStatus> {
    week_days(day)
        .into_iter()
        .map(|d| status_for(d, habits, checkins))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgendaEntry<'a> {
    pub habit: &'a Habit,
    pub completed: bool,
}

/// Habits due in one part of the day. `time_of_day` is `None` for habits
/// without a preferred time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgendaGroup<'a> {
    pub time_of_day: Option<TimeOfDay>,
    pub daily: Vec<AgendaEntry<'a>>,
    pub weekly: Vec<AgendaEntry<'a>>,
}

impl AgendaGroup<'_> {
    pub fn len(&self) -> usize {
        self.daily.len() + self.weekly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const AGENDA_SLOTS: [Option<TimeOfDay>; 4] = [
    Some(TimeOfDay::Morning),
    Some(TimeOfDay::Afternoon),
    Some(TimeOfDay::Evening),
    None,
];

/// Habits due on `day` in display order, grouped by time of day. Empty
/// groups are omitted.
pub fn day_agenda<'a>(day: NaiveDate, habits: &'a [Habit], checkins: &[Checkin]) -> Vec<AgendaGroup<'a>> {
    let done = completion_on(&canonical_date(day), checkins);
    let mut due: Vec<&Habit> = scheduled_on(day, habits).collect();
    due.sort_by_key(|h| h.order);

    AGENDA_SLOTS
        .iter()
        .map(|slot| {
            let mut group = AgendaGroup {
                time_of_day: *slot,
                daily: Vec::new(),
                weekly: Vec::new(),
            };
            for habit in due.iter().copied().filter(|h| h.time_of_day == *slot) {
                let entry = AgendaEntry {
                    habit,
                    completed: done.get(habit.id.as_str()).copied().unwrap_or(false),
                };
                match habit.frequency {
                    Frequency::Daily => group.daily.push(entry),
                    Frequency::Weekly => group.weekly.push(entry),
                }
            }
            group
        })
        .filter(|group| !group.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Schedule;
    use crate::store::tests::{checkin, habit};
    use std::collections::BTreeSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn mondays_only(id: &str, order: i64) -> Habit {
        let mut h = habit(id, order);
        h.schedule = Some(Schedule::Weekdays {
            days: BTreeSet::from([1]),
            start: None,
        });
        h
    }

    #[test]
    fn test_day_complete_requires_all_scheduled() {
        let day = date("2024-01-01");
        let habits = vec![habit("a", 0), habit("b", 1)];

        let one = vec![checkin("c1", "a", "2024-01-01", true)];
        assert!(!is_day_complete(day, &habits, &one));

        let both = vec![
            checkin("c1", "a", "2024-01-01", true),
            checkin("c2", "b", "2024-01-01", true),
        ];
        assert!(is_day_complete(day, &habits, &both));
    }

    #[test]
    fn test_day_complete_nothing_scheduled() {
        // 2024-01-02 is a Tuesday.
        let habits = vec![mondays_only("a", 0)];
        assert!(!is_day_complete(date("2024-01-02"), &habits, &[]));
        assert!(!is_day_complete(date("2024-01-02"), &[], &[]));
    }

    #[test]
    fn test_day_complete_ignores_archived_and_uses_latest_record() {
        let day = date("2024-01-01");
        let mut archived = habit("b", 1);
        archived.archived = true;
        let habits = vec![habit("a", 0), archived];

        let checkins = vec![
            checkin("c1", "a", "2024-01-01", true),
            checkin("c2", "a", "2024-01-01", false),
        ];
        assert!(!is_day_complete(day, &habits, &checkins));

        let checkins = vec![
            checkin("c2", "a", "2024-01-01", false),
            checkin("c1", "a", "2024-01-01", true),
        ];
        assert!(is_day_complete(day, &habits, &checkins));
    }

    #[test]
    fn test_week_days_monday_first() {
        let days = week_days(date("2024-01-04"));
        assert_eq!(days.first(), Some(&date("2024-01-01")));
        assert_eq!(days.last(), Some(&date("2024-01-07")));

        let sunday = week_days(date("2024-01-07"));
        assert_eq!(sunday[0], date("2024-01-01"));
    }

    #[test]
    fn test_week_summary_counts() {
        let habits = vec![habit("a", 0), mondays_only("b", 1)];
        let checkins = vec![
            checkin("c1", "a", "2024-01-01", true),
            checkin("c2", "b", "2024-01-01", true),
            checkin("c3", "a", "2024-01-02", true),
        ];

        let summary = week_summary(date("2024-01-03"), &habits, &checkins);
        assert_eq!(summary.len(), 7);
        assert_eq!(summary[0].scheduled, 2);
        assert!(summary[0].complete);
        assert_eq!(summary[1].scheduled, 1);
        assert!(summary[1].complete);
        assert_eq!(summary[2].completed, 0);
        assert!(!summary[2].complete);
    }

    #[test]
    fn test_day_agenda_groups() {
        let mut morning = habit("m", 1);
        morning.time_of_day = Some(TimeOfDay::Morning);
        let mut weekly_morning = habit("w", 0);
        weekly_morning.time_of_day = Some(TimeOfDay::Morning);
        weekly_morning.frequency = Frequency::Weekly;
        let anytime = habit("x", 2);
        let habits = vec![anytime, morning, weekly_morning, mondays_only("mon", 3)];

        let checkins = vec![checkin("c1", "m", "2024-01-02", true)];
        let agenda = day_agenda(date("2024-01-02"), &habits, &checkins);

        assert_eq!(agenda.len(), 2);
        assert_eq!(agenda[0].time_of_day, Some(TimeOfDay::Morning));
        assert_eq!(agenda[0].daily.len(), 1);
        assert!(agenda[0].daily[0].completed);
        assert_eq!(agenda[0].weekly[0].habit.id, "w");
        assert_eq!(agenda[1].time_of_day, None);
        assert_eq!(agenda[1].len(), 1);
        assert!(!agenda[1].daily[0].completed);
    }
}
