//! UART receiver.

use pipeflow::{clog2, to_masked, Component, Design, Shape, Signal};

use crate::timer::{check_word_width, BitTimer, UartError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Idle = 0,
    Start = 1,
    Data = 2,
    Stop = 3,
}

impl RxState {
    fn decode(value: u64) -> Self {
        match value & 0b11 {
            0 => RxState::Idle,
            1 => RxState::Start,
            2 => RxState::Data,
            _ => RxState::Stop,
        }
    }
}

/// Decodes an idle-high serial bit stream into parallel words.
///
/// No parity, one stop bit. `rx_rdy` and `rx_err` are strict one-tick
/// pulses; `rx_data` holds the last cleanly framed word. A framing mismatch
/// discards the in-progress word and returns to IDLE with the line still
/// being listened to, so a single bad frame never takes the receiver down.
#[derive(Debug)]
pub struct UartRx {
    name: String,
    data_bits: usize,
    /// Serial line input (idle high).
    pub rx_pin: Signal,
    /// One-tick pulse: a word was received cleanly.
    pub rx_rdy: Signal,
    /// One-tick pulse: start or stop bit had the wrong line level.
    pub rx_err: Signal,
    /// Last received word, latched only on a clean stop bit.
    pub rx_data: Signal,
    state: Signal,
    shift: Signal,
    bits: Signal,
    timer: BitTimer,
}

impl UartRx {
    /// Creates a receiver for the given ticks-per-bit divisor and word width.
    pub fn new(design: &mut Design, name: &str, divisor: usize, data_bits: usize) -> Result<Self, UartError> {
        check_word_width(data_bits)?;
        let timer = BitTimer::new(design, &format!("{name}_rx"), divisor)?;
        let rx_pin = design.add_signal_reset(format!("{name}_rx_pin"), Shape::unsigned(1), 1);
        let rx_rdy = design.add_signal(format!("{name}_rx_rdy"), Shape::unsigned(1));
        let rx_err = design.add_signal(format!("{name}_rx_err"), Shape::unsigned(1));
        let rx_data = design.add_signal(format!("{name}_rx_data"), Shape::unsigned(data_bits));
        let state = design.add_signal(format!("{name}_rx_state"), Shape::unsigned(2));
        let shift = design.add_signal(format!("{name}_rx_shift"), Shape::unsigned(data_bits));
        // Counts data_bits - 2 down to -1; the top bit is the terminal flag.
        let bits = design.add_signal(format!("{name}_rx_bits"), Shape::unsigned(clog2(2 * (data_bits - 1))));
        Ok(UartRx { name: name.to_string(), data_bits, rx_pin, rx_rdy, rx_err, rx_data, state, shift, bits, timer })
    }

    /// Configured word width.
    pub fn data_bits(&self) -> usize {
        self.data_bits
    }
}

impl Component for UartRx {
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, design: &mut Design) {
        if !self.timer.expired(design) {
            self.timer.decrement(design);
            design.set_next(self.rx_rdy, 0);
            design.set_next(self.rx_err, 0);
            return;
        }
        match RxState::decode(design.value(self.state)) {
            RxState::Idle => {
                design.set_next(self.rx_rdy, 0);
                design.set_next(self.rx_err, 0);
                if !design.is_high(self.rx_pin) {
                    // Falling edge: realign to the center of the start bit.
                    design.set_next(self.shift, 0);
                    self.timer.reload_half(design);
                    design.set_next(self.state, RxState::Start as u64);
                }
            }
            RxState::Start => {
                if design.is_high(self.rx_pin) {
                    // False start.
                    design.set_next(self.rx_err, 1);
                    self.timer.reload(design);
                    design.set_next(self.state, RxState::Idle as u64);
                } else {
                    let bits_width = design.shape(self.bits).width;
                    design.set_next(self.bits, to_masked(bits_width, self.data_bits as i64 - 2));
                    self.timer.reload(design);
                    design.set_next(self.state, RxState::Data as u64);
                }
            }
            RxState::Data => {
                // LSB-first capture: the sampled bit lands in the top
                // position while earlier bits shift down into place.
                let sampled = (design.value(self.rx_pin)) << (self.data_bits - 1);
                let shifted = design.value(self.shift) >> 1;
                design.set_next(self.shift, sampled | shifted);
                self.timer.reload(design);
                if design.top_bit(self.bits) {
                    design.set_next(self.state, RxState::Stop as u64);
                } else {
                    let bits = design.value(self.bits);
                    design.set_next(self.bits, bits.wrapping_sub(1));
                }
            }
            RxState::Stop => {
                if !design.is_high(self.rx_pin) {
                    design.set_next(self.rx_err, 1);
                    self.timer.reload(design);
                } else {
                    // Clean frame: latch and pulse. The timer is left
                    // expired so IDLE resumes polling on the next tick.
                    design.set_next(self.rx_data, design.value(self.shift));
                    design.set_next(self.rx_rdy, 1);
                }
                design.set_next(self.state, RxState::Idle as u64);
            }
        }
    }
}
