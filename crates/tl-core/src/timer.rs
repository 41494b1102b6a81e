//! Host-driven time and cancelable one-shot timers.
//!
//! The core never reads a clock. Hosts pass the current `Timestamp` into
//! every time-dependent call and drive expiry with `Engine::tick`.

/// Milliseconds since a host-chosen epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    #[inline]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    #[inline]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn after(self, delay_ms: u64) -> Self {
        Self(self.0.saturating_add(delay_ms))
    }
}

/// One-shot timer owned by whoever will react to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Timestamp>,
}

impl Timer {
    pub fn armed(now: Timestamp, delay_ms: u64) -> Self {
        Self {
            deadline: Some(now.after(delay_ms)),
        }
    }

    /// (Re)arm; a pending deadline is replaced.
    pub fn arm(&mut self, now: Timestamp, delay_ms: u64) {
        self.deadline = Some(now.after(delay_ms));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[inline]
    pub fn deadline(&self) -> Option<Timestamp> {
        self.deadline
    }

    #[inline]
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Consume the timer if its deadline has passed.
    pub fn fire(&mut self, now: Timestamp) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Like `fire`, but re-arm for `delay_ms` after the deadline that just
    /// passed instead of after `now`, so a late tick can run out the next
    /// phase too.
    pub fn fire_and_chain(&mut self, now: Timestamp, delay_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = Some(deadline.after(delay_ms));
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_phase_counts_from_previous_deadline() {
        let mut timer = Timer::armed(Timestamp::from_millis(0), 100);
        assert!(!timer.fire_and_chain(Timestamp::from_millis(99), 50));
        assert!(timer.fire_and_chain(Timestamp::from_millis(500), 50));
        assert_eq!(timer.deadline(), Some(Timestamp::from_millis(150)));
        assert!(timer.fire(Timestamp::from_millis(500)));
    }

    #[test]
    fn test_timer_fires_once() {
        let t0 = Timestamp::from_millis(1_000);
        let mut timer = Timer::armed(t0, 300);
        assert!(!timer.fire(t0.after(299)));
        assert!(timer.fire(t0.after(300)));
        assert!(!timer.fire(t0.after(1_000)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let t0 = Timestamp::default();
        let mut timer = Timer::armed(t0, 10);
        timer.cancel();
        assert!(!timer.fire(t0.after(100)));
    }

    #[test]
    fn test_saturating_deadline() {
        let t = Timestamp::from_millis(u64::MAX - 1).after(10);
        assert_eq!(t.as_millis(), u64::MAX);
    }
}
