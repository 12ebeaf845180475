//! RAII timing for reconciliation phases.

use std::time::{Duration, Instant};

/// Adds the time between construction and drop to a `Duration` slot.
///
/// An early return out of a phase still records its time.
///
/// ```rust,ignore
/// let mut read = Duration::ZERO;
/// let lines = {
///     let _timer = PhaseTimer::new(&mut read);
///     reader.read(path)
/// };
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

pub(crate) fn as_millis_f64(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_phase_timer_accumulates_across_phases() {
        let mut read = Duration::ZERO;
        for _ in 0..2 {
            let _timer = PhaseTimer::new(&mut read);
            thread::sleep(Duration::from_millis(5));
        }
        assert!(read >= Duration::from_millis(10));
    }

    #[test]
    fn test_phase_timer_records_on_early_return() {
        fn phase(slot: &mut Duration) -> Option<()> {
            let _timer = PhaseTimer::new(slot);
            thread::sleep(Duration::from_millis(5));
            None::<()>?;
            Some(())
        }

        let mut slot = Duration::ZERO;
        assert!(phase(&mut slot).is_none());
        assert!(slot >= Duration::from_millis(5));
    }

    #[test]
    fn test_as_millis_f64() {
        assert!((as_millis_f64(Duration::from_micros(1500)) - 1.5).abs() < 1e-9);
    }
}
