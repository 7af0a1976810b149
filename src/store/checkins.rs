use std::collections::HashMap;

use crate::models::Checkin;

/// Client-side cache of checkins. For a given (habit, date) the most
/// recently fetched record wins.
#[derive(Debug, Clone, Default)]
pub struct CheckinStore {
    pub checkins: Vec<Checkin>,
    pub today: Vec<Checkin>,
    pub loading: bool,
    pub error: Option<String>,
}

fn dedupe(checkins: Vec<Checkin>) -> Vec<Checkin> {
    let mut slots: HashMap<(String, String), usize> = HashMap::new();
    let mut out: Vec<Checkin> = Vec::with_capacity(checkins.len());

    for checkin in checkins {
        let key = (checkin.habit_id.clone(), checkin.date.clone());
        match slots.get(&key) {
            Some(&idx) => out[idx] = checkin,
            None => {
                slots.insert(key, out.len());
                out.push(checkin);
            }
        }
    }
    out
}

impl CheckinStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn set_all(&mut self, checkins: Vec<Checkin>) {
        self.loading = false;
        self.checkins = dedupe(checkins);
    }

    /// Swaps in a refetched window `[start, end]`, leaving records outside
    /// it untouched.
    pub fn replace_range(&mut self, start: &str, end: &str, fetched: Vec<Checkin>) {
        self.loading = false;
        let mut merged: Vec<Checkin> = self
            .checkins
            .drain(..)
            .filter(|c| c.date.as_str() < start || c.date.as_str() > end)
            .collect();
        merged.extend(fetched);
        self.checkins = dedupe(merged);
    }

    pub fn set_today(&mut self, checkins: Vec<Checkin>) {
        self.today = dedupe(checkins);
    }

    /// Inserts or replaces by id. `today` is the caller's current date and
    /// decides whether the today list is maintained as well.
    pub fn upsert(&mut self, checkin: Checkin, today: &str) {
        if checkin.date == today {
            upsert_into(&mut self.today, checkin.clone());
        }
        upsert_into(&mut self.checkins, checkin);
    }

    pub fn remove(&mut self, id: &str) {
        self.checkins.retain(|c| c.id != id);
        self.today.retain(|c| c.id != id);
    }

    /// Drops every record of a deleted habit.
    pub fn remove_habit(&mut self, habit_id: &str) {
        self.checkins.retain(|c| c.habit_id != habit_id);
        self.today.retain(|c| c.habit_id != habit_id);
    }

    pub fn find(&self, habit_id: &str, date: &str) -> Option<&Checkin> {
        self.checkins
            .iter()
            .rev()
            .find(|c| c.habit_id == habit_id && c.date == date)
    }

    pub fn for_date(&self, date: &str) -> Vec<&Checkin> {
        self.checkins.iter().filter(|c| c.date == date).collect()
    }
}

fn upsert_into(list: &mut Vec<Checkin>, checkin: Checkin) {
    match list.iter_mut().find(|c| c.id == checkin.id) {
        Some(existing) => *existing = checkin,
        None => list.push(checkin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::checkin;

    #[test]
    fn test_duplicates_keep_latest() {
        let mut store = CheckinStore::new();
        store.set_all(vec![
            checkin("c1", "h1", "2024-01-01", true),
            checkin("c2", "h2", "2024-01-01", true),
            checkin("c3", "h1", "2024-01-01", false),
        ]);

        assert_eq!(store.checkins.len(), 2);
        let found = store.find("h1", "2024-01-01").unwrap();
        assert_eq!(found.id, "c3");
        assert!(!found.completed);
    }

    #[test]
    fn test_replace_range_keeps_other_days() {
        let mut store = CheckinStore::new();
        store.set_all(vec![
            checkin("c1", "h1", "2024-01-01", true),
            checkin("c2", "h1", "2024-01-02", true),
            checkin("c3", "h1", "2024-01-03", true),
        ]);

        store.replace_range("2024-01-02", "2024-01-02", vec![]);
        let ids: Vec<&str> = store.checkins.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c3"]);

        store.replace_range("2024-01-02", "2024-01-02", vec![checkin("c4", "h1", "2024-01-02", true)]);
        assert_eq!(store.find("h1", "2024-01-02").unwrap().id, "c4");
        assert_eq!(store.checkins.len(), 3);
    }

    #[test]
    fn test_upsert_tracks_today() {
        let mut store = CheckinStore::new();
        store.upsert(checkin("c1", "h1", "2024-01-05", true), "2024-01-05");
        store.upsert(checkin("c2", "h1", "2024-01-04", true), "2024-01-05");
        assert_eq!(store.today.len(), 1);
        assert_eq!(store.checkins.len(), 2);

        store.upsert(checkin("c1", "h1", "2024-01-05", false), "2024-01-05");
        assert_eq!(store.checkins.len(), 2);
        assert!(!store.today[0].completed);

        store.remove("c1");
        assert!(store.today.is_empty());
        assert_eq!(store.for_date("2024-01-05").len(), 0);
        assert_eq!(store.for_date("2024-01-04").len(), 1);

        store.remove_habit("h1");
        assert!(store.checkins.is_empty());
    }
}
