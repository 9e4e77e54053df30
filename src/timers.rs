//! Timing utilities for evaluation phases.
//!
//! [`PhaseTimer`] adds the elapsed time to a slot when dropped, so a phase is
//! measured even when it exits early.

use std::time::{Duration, Instant};

/// RAII timer that records elapsed time to a mutable slot on Drop.
///
/// ```rust,ignore
/// let mut admin_lookup = Duration::ZERO;
/// {
///     let _timer = PhaseTimer::new(&mut admin_lookup);
///     cache.get_or_compute(&key, ttl, compute).await?;
/// }
/// ```
pub struct PhaseTimer<'a> {
    start: Instant,
    slot: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(slot: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            slot,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.slot += self.start.elapsed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_phase_timer_records_elapsed() {
        let mut duration = Duration::ZERO;
        {
            let _timer = PhaseTimer::new(&mut duration);
            thread::sleep(Duration::from_millis(10));
        }
        assert!(duration >= Duration::from_millis(10));
    }

    #[test]
    fn test_phase_timer_records_on_early_return() {
        fn measured(slot: &mut Duration, bail: bool) -> Option<()> {
            let _timer = PhaseTimer::new(slot);
            thread::sleep(Duration::from_millis(2));
            if bail {
                return None;
            }
            Some(())
        }

        let mut duration = Duration::ZERO;
        assert!(measured(&mut duration, true).is_none());
        assert!(duration >= Duration::from_millis(2));
    }
}
