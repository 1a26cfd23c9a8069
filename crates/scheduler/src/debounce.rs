//! Timer-based event coalescing
//!
//! A debouncer turns a burst of raw events into a single deferred execution:
//! each raw event re-arms a pending deadline, and the action runs once when
//! the deadline passes with no further events. The caller owns the clock and
//! the action; the debouncer only answers "should it run now".

use std::time::{Duration, Instant};

/// Coalesces event bursts into one deferred fire.
///
/// `poke` records a raw event and pushes the deadline out to `now + delay`;
/// `fire_ready` reports `true` exactly once per armed window, when the
/// deadline has passed.
///
/// # Example
///
/// ```
/// use pdf_reader_scheduler::Debouncer;
/// use std::time::{Duration, Instant};
///
/// let mut debouncer = Debouncer::new(Duration::from_millis(50));
/// let start = Instant::now();
///
/// debouncer.poke(start);
/// debouncer.poke(start + Duration::from_millis(10));
///
/// assert!(!debouncer.fire_ready(start + Duration::from_millis(40)));
/// assert!(debouncer.fire_ready(start + Duration::from_millis(60)));
/// assert!(!debouncer.fire_ready(start + Duration::from_millis(70)));
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Record a raw event at `now`, re-arming the deadline.
    pub fn poke(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Whether a fire is still pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns `true` when the armed deadline has passed, disarming in the
    /// same call so each window fires at most once.
    pub fn fire_ready(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> Instant {
        Instant::now()
    }

    #[test]
    fn unarmed_debouncer_never_fires() {
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        assert!(!debouncer.is_armed());
        assert!(!debouncer.fire_ready(clock() + Duration::from_secs(10)));
    }

    #[test]
    fn burst_of_pokes_fires_exactly_once() {
        let start = clock();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        for offset_ms in [0, 5, 10, 15, 20] {
            debouncer.poke(start + Duration::from_millis(offset_ms));
        }

        // Last poke at +20ms; deadline is +70ms.
        assert!(!debouncer.fire_ready(start + Duration::from_millis(69)));
        assert!(debouncer.fire_ready(start + Duration::from_millis(70)));
        assert!(!debouncer.fire_ready(start + Duration::from_millis(200)));
    }

    #[test]
    fn poke_after_fire_rearms() {
        let start = clock();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        debouncer.poke(start);
        assert!(debouncer.fire_ready(start + Duration::from_millis(50)));

        debouncer.poke(start + Duration::from_millis(100));
        assert!(debouncer.is_armed());
        assert!(debouncer.fire_ready(start + Duration::from_millis(150)));
    }

    #[test]
    fn cancel_disarms_without_firing() {
        let start = clock();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        debouncer.poke(start);
        debouncer.cancel();

        assert!(!debouncer.is_armed());
        assert!(!debouncer.fire_ready(start + Duration::from_secs(1)));
    }
}
