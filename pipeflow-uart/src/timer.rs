//! Shared bit-period timing.

use pipeflow::{clog2, mask, to_masked, Design, Shape, Signal};
use thiserror::Error;

/// UART configuration failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UartError {
    /// The divisor leaves no room to center-sample the start bit.
    #[error("bit-rate divisor {0} is too small (minimum 3)")]
    DivisorTooSmall(usize),
    /// Unsupported word width.
    #[error("unsupported word width {0} (supported 2..=32)")]
    BadWordWidth(usize),
}

pub(crate) fn check_word_width(data_bits: usize) -> Result<(), UartError> {
    if !(2..=32).contains(&data_bits) {
        return Err(UartError::BadWordWidth(data_bits));
    }
    Ok(())
}

/// Divisor-based tick generator shared by receiver and transmitter.
///
/// A countdown register runs from `divisor - 2` to `-1`; the top bit of the
/// register doubles as the expiry sentinel, so the owning FSM advances one
/// state step per `divisor` clock ticks. The register resets to all-ones
/// (already expired), which lets IDLE states poll every tick until they
/// reload it.
#[derive(Debug)]
pub struct BitTimer {
    counter: Signal,
    divisor: usize,
    width: usize,
}

impl BitTimer {
    /// Creates a timer. The divisor must be at least 3, since half a bit
    /// period (used to center the receiver's sampling) must span at least
    /// one tick.
    pub fn new(design: &mut Design, name: &str, divisor: usize) -> Result<Self, UartError> {
        if divisor < 3 {
            return Err(UartError::DivisorTooSmall(divisor));
        }
        // Counts from divisor - 2 down to -1.
        let width = clog2(2 * (divisor - 1));
        let counter =
            design.add_signal_reset(format!("{name}_counter"), Shape::unsigned(width), mask(width));
        Ok(BitTimer { counter, divisor, width })
    }

    /// True while the countdown sits at its expired sentinel.
    pub fn expired(&self, design: &Design) -> bool {
        design.top_bit(self.counter)
    }

    /// Schedules a full bit-period reload.
    pub fn reload(&self, design: &mut Design) {
        design.set_next(self.counter, (self.divisor - 2) as u64);
    }

    /// Schedules a half bit-period reload, aligning subsequent expiries to
    /// the center of each bit rather than its edge.
    pub fn reload_half(&self, design: &mut Design) {
        design.set_next(self.counter, to_masked(self.width, self.divisor as i64 / 2 - 2));
    }

    /// Schedules the per-tick decrement (wraps into the expired sentinel).
    pub fn decrement(&self, design: &mut Design) {
        let value = design.value(self.counter);
        design.set_next(self.counter, value.wrapping_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Cadence {
        timer: BitTimer,
        steps: Signal,
    }

    impl pipeflow::Component for Cadence {
        fn name(&self) -> &str {
            "cadence"
        }

        fn eval(&self, design: &mut Design) {
            if self.timer.expired(design) {
                let steps = design.value(self.steps);
                design.set_next(self.steps, steps + 1);
                self.timer.reload(design);
            } else {
                self.timer.decrement(design);
            }
        }
    }

    #[test]
    fn one_step_per_divisor_ticks() {
        for divisor in [3usize, 4, 5, 8] {
            let mut d = Design::new();
            let timer = BitTimer::new(&mut d, "t", divisor).unwrap();
            let steps = d.add_signal("steps", Shape::unsigned(8));
            let cadence = Cadence { timer, steps };
            // First expiry is immediate (reset is the sentinel), after which
            // steps land every `divisor` ticks.
            d.step(&[&cadence]).unwrap();
            assert_eq!(d.value(steps), 1);
            d.run(&[&cadence], divisor * 4).unwrap();
            assert_eq!(d.value(steps), 5, "divisor {divisor}");
        }
    }

    #[test]
    fn divisor_bounds() {
        let mut d = Design::new();
        assert_eq!(BitTimer::new(&mut d, "t", 2).unwrap_err(), UartError::DivisorTooSmall(2));
        assert!(BitTimer::new(&mut d, "t", 3).is_ok());
    }
}
