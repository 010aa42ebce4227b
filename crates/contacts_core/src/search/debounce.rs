//! Last-scheduled-wins debouncing for search input.
//!
//! The host owns the real timer; it reports keystrokes through `schedule`
//! and asks `poll` when its timer fires. Time is passed in explicitly so the
//! state machine stays deterministic.

use crate::config::StoreConfig;

/// Holds at most one pending value.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: i64,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    due_at: i64,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: i64) -> Self {
        Self {
            delay_ms: delay_ms.max(0),
            pending: None,
        }
    }

    /// Uses the configured search debounce delay.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.search_debounce_ms)
    }

    pub fn delay_ms(&self) -> i64 {
        self.delay_ms
    }

    /// Replaces any pending value and restarts the delay from `now_ms`.
    ///
    /// Returns the deadline the host timer should fire at.
    pub fn schedule(&mut self, value: T, now_ms: i64) -> i64 {
        let due_at = now_ms.saturating_add(self.delay_ms);
        self.pending = Some(Pending { value, due_at });
        due_at
    }

    /// Takes the pending value once its deadline has passed.
    pub fn poll(&mut self, now_ms: i64) -> Option<T> {
        match &self.pending {
            Some(pending) if now_ms >= pending.due_at => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Drops the pending value without applying it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;
    use crate::config::StoreConfig;

    #[test]
    fn from_config_follows_debounce_override() {
        let default = Debouncer::<&str>::from_config(&StoreConfig::default());
        assert_eq!(default.delay_ms(), 220);

        let config = StoreConfig::from_lookup(|key| {
            (key == "CONTACTS_DEBOUNCE_MS").then(|| "50".to_string())
        });
        let mut debouncer = Debouncer::from_config(&config);
        assert_eq!(debouncer.schedule("r", 1_000), 1_050);
        assert_eq!(debouncer.poll(1_050), Some("r"));
    }

    #[test]
    fn poll_before_deadline_yields_nothing() {
        let mut debouncer = Debouncer::new(220);
        assert_eq!(debouncer.schedule("r", 1_000), 1_220);
        assert_eq!(debouncer.poll(1_219), None);
        assert_eq!(debouncer.poll(1_220), Some("r"));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn newer_input_supersedes_pending_value_and_deadline() {
        let mut debouncer = Debouncer::new(220);
        debouncer.schedule("r", 1_000);
        debouncer.schedule("ra", 1_100);
        debouncer.schedule("rav", 1_200);

        assert_eq!(debouncer.poll(1_300), None);
        assert_eq!(debouncer.poll(1_420), Some("rav"));
        assert_eq!(debouncer.poll(5_000), None);
    }

    #[test]
    fn cancel_discards_pending_value() {
        let mut debouncer = Debouncer::new(50);
        debouncer.schedule(String::from("x"), 0);
        assert_eq!(debouncer.cancel().as_deref(), Some("x"));
        assert_eq!(debouncer.poll(1_000), None);
    }
}
