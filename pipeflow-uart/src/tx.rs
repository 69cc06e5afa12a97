//! UART transmitter.

use pipeflow::{clog2, Component, Design, Shape, Signal};

use crate::timer::{check_word_width, BitTimer, UartError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Idle = 0,
    Data = 1,
    Stop = 2,
}

impl TxState {
    fn decode(value: u64) -> Self {
        match value & 0b11 {
            0 => TxState::Idle,
            1 => TxState::Data,
            _ => TxState::Stop,
        }
    }
}

/// Serializes parallel words onto an idle-high line.
///
/// A word is captured on the tick `tx_trg` is asserted while the
/// transmitter is idle; the line drops for the start bit immediately after,
/// followed by the word LSB-first and one stop bit. `tx_rdy` is low for the
/// whole frame and reasserted the tick the stop period completes.
#[derive(Debug)]
pub struct UartTx {
    name: String,
    data_bits: usize,
    /// Parallel word to send; sampled on trigger.
    pub tx_data: Signal,
    /// Send trigger, honored only while idle.
    pub tx_trg: Signal,
    /// High whenever a new word may be accepted.
    pub tx_rdy: Signal,
    /// Serial line output (idle high).
    pub tx_pin: Signal,
    state: Signal,
    shift: Signal,
    bit_count: Signal,
    timer: BitTimer,
}

impl UartTx {
    /// Creates a transmitter for the given ticks-per-bit divisor and word
    /// width.
    pub fn new(design: &mut Design, name: &str, divisor: usize, data_bits: usize) -> Result<Self, UartError> {
        check_word_width(data_bits)?;
        let timer = BitTimer::new(design, &format!("{name}_tx"), divisor)?;
        let tx_data = design.add_signal(format!("{name}_tx_data"), Shape::unsigned(data_bits));
        let tx_trg = design.add_signal(format!("{name}_tx_trg"), Shape::unsigned(1));
        let tx_rdy = design.add_signal(format!("{name}_tx_rdy"), Shape::unsigned(1));
        let tx_pin = design.add_signal_reset(format!("{name}_tx_pin"), Shape::unsigned(1), 1);
        let state = design.add_signal(format!("{name}_tx_state"), Shape::unsigned(2));
        let shift = design.add_signal(format!("{name}_tx_shift"), Shape::unsigned(data_bits));
        // Counts data_bits - 1 down to -1; the top bit is the terminal flag.
        let bit_count = design.add_signal(format!("{name}_tx_bits"), Shape::unsigned(clog2(data_bits) + 1));
        Ok(UartTx { name: name.to_string(), data_bits, tx_data, tx_trg, tx_rdy, tx_pin, state, shift, bit_count, timer })
    }

    /// Configured word width.
    pub fn data_bits(&self) -> usize {
        self.data_bits
    }
}

impl Component for UartTx {
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, design: &mut Design) {
        if !self.timer.expired(design) {
            self.timer.decrement(design);
            return;
        }
        match TxState::decode(design.value(self.state)) {
            TxState::Idle => {
                if design.is_high(self.tx_trg) {
                    design.set_next(self.shift, design.value(self.tx_data));
                    design.set_next(self.tx_rdy, 0);
                    // Start bit.
                    design.set_next(self.tx_pin, 0);
                    design.set_next(self.bit_count, (self.data_bits - 1) as u64);
                    self.timer.reload(design);
                    design.set_next(self.state, TxState::Data as u64);
                } else {
                    design.set_next(self.tx_rdy, 1);
                }
            }
            TxState::Data => {
                if design.top_bit(self.bit_count) {
                    // Stop bit.
                    design.set_next(self.tx_pin, 1);
                    self.timer.reload(design);
                    design.set_next(self.state, TxState::Stop as u64);
                } else {
                    let shift = design.value(self.shift);
                    design.set_next(self.tx_pin, shift & 1);
                    design.set_next(self.shift, shift >> 1);
                    let count = design.value(self.bit_count);
                    design.set_next(self.bit_count, count.wrapping_sub(1));
                    self.timer.reload(design);
                }
            }
            TxState::Stop => {
                // The timer is left expired so IDLE polls the trigger on the
                // very tick tx_rdy reasserts; a reload here would open a
                // window where triggers are lost.
                design.set_next(self.tx_rdy, 1);
                design.set_next(self.state, TxState::Idle as u64);
            }
        }
    }
}
