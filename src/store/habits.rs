use crate::models::Habit;

/// Client-side cache of the habits last returned by the backend.
#[derive(Debug, Clone, Default)]
pub struct HabitStore {
    pub habits: Vec<Habit>,
    pub loading: bool,
    pub error: Option<String>,
}

impl HabitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn set_all(&mut self, habits: Vec<Habit>) {
        self.loading = false;
        self.habits = habits;
    }

    /// Records a failure without touching the cached habits.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn insert(&mut self, habit: Habit) {
        self.habits.push(habit);
    }

    /// Replaces a known habit; unknown ids are ignored.
    pub fn replace(&mut self, habit: Habit) -> bool {
        match self.habits.iter_mut().find(|h| h.id == habit.id) {
            Some(existing) => {
                *existing = habit;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Habit> {
        let pos = self.habits.iter().position(|h| h.id == id)?;
        Some(self.habits.remove(pos))
    }

    pub fn mark_archived(&mut self, id: &str) -> bool {
        match self.habits.iter_mut().find(|h| h.id == id) {
            Some(habit) => {
                habit.archived = true;
                true
            }
            None => false,
        }
    }

    pub fn set_order(&mut self, id: &str, order: i64) -> bool {
        match self.habits.iter_mut().find(|h| h.id == id) {
            Some(habit) => {
                habit.order = order;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    /// Non-archived habits in display order.
    pub fn active(&self) -> Vec<&Habit> {
        let mut active: Vec<&Habit> = self.habits.iter().filter(|h| !h.archived).collect();
        active.sort_by_key(|h| h.order);
        active
    }
}
