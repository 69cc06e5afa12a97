//! Combined transceiver with the raw register interface.

use pipeflow::{Component, Design};

use crate::rx::UartRx;
use crate::timer::UartError;
use crate::tx::UartTx;

/// A full transceiver: one receiver and one transmitter sharing a divisor
/// and word width.
///
/// This is the register-level interface for consumers that do not go
/// through pipe endpoints, such as a display driver reading `rx.rx_data` /
/// `rx.rx_rdy` / `rx.rx_err` directly.
#[derive(Debug)]
pub struct Uart {
    name: String,
    /// Receive half.
    pub rx: UartRx,
    /// Transmit half.
    pub tx: UartTx,
}

impl Uart {
    /// Creates a transceiver.
    pub fn new(design: &mut Design, name: &str, divisor: usize, data_bits: usize) -> Result<Self, UartError> {
        let rx = UartRx::new(design, name, divisor, data_bits)?;
        let tx = UartTx::new(design, name, divisor, data_bits)?;
        Ok(Uart { name: name.to_string(), rx, tx })
    }
}

impl Component for Uart {
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, design: &mut Design) {
        self.rx.eval(design);
        self.tx.eval(design);
    }
}
