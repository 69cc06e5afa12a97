//! Pipe protocol adapters: UART halves wrapped behind pipe endpoints.
//!
//! The adapters are the template for making any register-level protocol
//! engine composable: the engine's ready/trigger/pulse registers are bridged
//! onto a [`PipeInlet`]/[`PipeOutlet`] pair without either side knowing the
//! other's internals.

use pipeflow::{Component, Design, PipeInlet, PipeOutlet, PipeSpec, Signal, Stage};

use crate::rx::UartRx;
use crate::timer::UartError;
use crate::tx::UartTx;

/// Receiver behind a pipe inlet.
///
/// Each cleanly received word is offered downstream: `o_valid` rises on
/// `rx_rdy` and falls on the tick the transfer completes. A word arriving
/// while the previous one is still unaccepted overwrites it; the pipe
/// consumer sets the pace, the line does not wait.
#[derive(Debug)]
pub struct PipeUartRx {
    name: String,
    rx: UartRx,
    /// Received words, offered downstream.
    pub rx_out: PipeInlet,
}

impl PipeUartRx {
    /// Creates the adapter together with its receiver.
    pub fn new(design: &mut Design, name: &str, divisor: usize, data_bits: usize) -> Result<Self, UartError> {
        let rx = UartRx::new(design, name, divisor, data_bits)?;
        let rx_out = PipeSpec::from_width(data_bits).inlet(design, &format!("{name}_rx_out"));
        Ok(PipeUartRx { name: name.to_string(), rx, rx_out })
    }

    /// Serial line input.
    pub fn rx_pin(&self) -> Signal {
        self.rx.rx_pin
    }

    /// Framing-error pulse, passed through for supervision.
    pub fn rx_err(&self) -> Signal {
        self.rx.rx_err
    }
}

impl Component for PipeUartRx {
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, design: &mut Design) {
        self.rx.eval(design);
        if design.is_high(self.rx.rx_rdy) {
            design.set_next(self.rx_out.o_valid(), 1);
            design.set_next(self.rx_out.o_data(), design.value(self.rx.rx_data));
        }
        if self.rx_out.sent(design) {
            design.set_next(self.rx_out.o_valid(), 0);
        }
    }
}

impl Stage for PipeUartRx {
    fn inlets(&self) -> Vec<&PipeInlet> {
        vec![&self.rx_out]
    }
}

/// Transmitter behind a pipe outlet.
///
/// `tx_rdy` feeds the outlet's `ready`; a completed handshake is the
/// transmitter's trigger, so exactly one frame is sent per transfer.
#[derive(Debug)]
pub struct PipeUartTx {
    name: String,
    tx: UartTx,
    /// Words to transmit, accepted upstream.
    pub tx_in: PipeOutlet,
}

impl PipeUartTx {
    /// Creates the adapter together with its transmitter.
    pub fn new(design: &mut Design, name: &str, divisor: usize, data_bits: usize) -> Result<Self, UartError> {
        let tx = UartTx::new(design, name, divisor, data_bits)?;
        let tx_in = PipeSpec::from_width(data_bits).outlet(design, &format!("{name}_tx_in"));
        Ok(PipeUartTx { name: name.to_string(), tx, tx_in })
    }

    /// Serial line output.
    pub fn tx_pin(&self) -> Signal {
        self.tx.tx_pin
    }
}

impl Component for PipeUartTx {
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, design: &mut Design) {
        let rdy = design.value(self.tx.tx_rdy);
        design.drive(self.tx_in.o_ready(), rdy);
        design.drive(self.tx.tx_trg, self.tx_in.received(design) as u64);
        let data = design.value(self.tx_in.i_data());
        design.drive(self.tx.tx_data, data);
        self.tx.eval(design);
    }
}

impl Stage for PipeUartTx {
    fn outlets(&self) -> Vec<&PipeOutlet> {
        vec![&self.tx_in]
    }
}

/// Full transceiver as a pipeline stage: an outlet of words to transmit and
/// an inlet of received words.
#[derive(Debug)]
pub struct PipeUart {
    name: String,
    rx: PipeUartRx,
    tx: PipeUartTx,
}

impl PipeUart {
    /// Creates the stage.
    pub fn new(design: &mut Design, name: &str, divisor: usize, data_bits: usize) -> Result<Self, UartError> {
        let rx = PipeUartRx::new(design, name, divisor, data_bits)?;
        let tx = PipeUartTx::new(design, name, divisor, data_bits)?;
        Ok(PipeUart { name: name.to_string(), rx, tx })
    }

    /// Serial line input.
    pub fn rx_pin(&self) -> Signal {
        self.rx.rx_pin()
    }

    /// Serial line output.
    pub fn tx_pin(&self) -> Signal {
        self.tx.tx_pin()
    }

    /// Framing-error pulse.
    pub fn rx_err(&self) -> Signal {
        self.rx.rx_err()
    }

    /// Received words, offered downstream.
    pub fn rx_out(&self) -> &PipeInlet {
        &self.rx.rx_out
    }

    /// Words to transmit, accepted upstream.
    pub fn tx_in(&self) -> &PipeOutlet {
        &self.tx.tx_in
    }
}

impl Component for PipeUart {
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, design: &mut Design) {
        self.rx.eval(design);
        self.tx.eval(design);
    }
}

impl Stage for PipeUart {
    fn inlets(&self) -> Vec<&PipeInlet> {
        vec![&self.rx.rx_out]
    }

    fn outlets(&self) -> Vec<&PipeOutlet> {
        vec![&self.tx.tx_in]
    }
}
