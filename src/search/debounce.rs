//! Keystroke debouncing.
//!
//! The debounced value only advances once the raw input has been stable for
//! the full delay. Time is passed in explicitly so the event loop and tests
//! drive the same code path.

use std::time::{Duration, Instant};

/// Default delay between the last keystroke and a lookup.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(180);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    current: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            current: initial,
            pending: None,
        }
    }

    /// Last value that survived the full delay.
    pub fn value(&self) -> &T {
        &self.current
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value will be promoted, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, since)| *since + self.delay)
    }

    /// Record a new raw value, restarting the timer.
    pub fn set(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Promote the pending value if it has been stable for the full delay.
    ///
    /// Returns the new debounced value only when it differs from the previous
    /// one, so a burst that ends where it started produces no transition.
    pub fn poll(&mut self, now: Instant) -> Option<&T> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|(_, since)| now.saturating_duration_since(*since) >= self.delay);
        if !ready {
            return None;
        }
        let (value, _) = self.pending.take()?;
        if value == self.current {
            return None;
        }
        self.current = value;
        Some(&self.current)
    }

    /// Replace the debounced value immediately, dropping any pending timer.
    pub fn flush(&mut self, value: T) -> bool {
        self.pending = None;
        if value == self.current {
            return false;
        }
        self.current = value;
        true
    }

    /// Drop the pending timer without touching the debounced value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn burst_collapses_to_final_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(String::new(), ms(180));
        d.set("a".into(), t0);
        d.set("ap".into(), t0 + ms(50));
        d.set("app".into(), t0 + ms(120));

        assert!(d.poll(t0 + ms(200)).is_none(), "180ms not elapsed since last change");
        assert_eq!(d.poll(t0 + ms(300)).map(String::as_str), Some("app"));
        assert!(d.poll(t0 + ms(1_000)).is_none(), "no second transition");
        assert_eq!(d.value(), "app");
    }

    #[test]
    fn returning_to_current_value_is_not_a_transition() {
        let t0 = Instant::now();
        let mut d = Debouncer::new("ap".to_string(), ms(180));
        d.set("app".into(), t0);
        d.set("ap".into(), t0 + ms(10));
        assert!(d.poll(t0 + ms(500)).is_none());
        assert!(!d.is_pending());
    }

    #[test]
    fn cancel_drops_pending_update() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(0u32, ms(100));
        d.set(7, t0);
        assert_eq!(d.deadline(), Some(t0 + ms(100)));
        d.cancel();
        assert!(d.poll(t0 + ms(500)).is_none());
        assert_eq!(*d.value(), 0);
    }

    #[test]
    fn flush_bypasses_the_timer() {
        let t0 = Instant::now();
        let mut d = Debouncer::new("apple".to_string(), ms(180));
        d.set("appl".into(), t0);
        assert!(d.flush(String::new()));
        assert_eq!(d.value(), "");
        assert!(d.poll(t0 + ms(400)).is_none());
    }
}
