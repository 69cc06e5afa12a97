//! Design arena and synchronous execution.
//!
//! A [`Design`] owns every signal in the system. Components read and write
//! signals through two assignment disciplines:
//!
//! - [`Design::drive`] is *combinational*: it takes effect immediately,
//!   within the current tick's settle phase;
//! - [`Design::set_next`] is *registered*: computed this tick, visible from
//!   the next tick. This is the only place state persists.
//!
//! [`Design::step`] advances one global tick: every component is evaluated
//! and binding edges propagated until combinational values reach a fixed
//! point, then all registered updates commit atomically. A settle phase that
//! never stabilizes is a cyclic combinational dependency, which is a design
//! error rather than a runtime condition to recover from.

use std::fmt;

use thiserror::Error;

use crate::endpoint::EndpointKind;
use crate::signal::{Shape, Signal};
use crate::utils::truncate;

/// Simulation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// Combinational signals did not settle; the design has a cyclic
    /// combinational dependency.
    #[error("combinational signals failed to settle after {0} iterations")]
    CombinationalLoop(usize),
}

/// A synchronous component.
///
/// All of a component's state lives in the design arena, so evaluation takes
/// `&self`: it reads current signal values and schedules combinational and
/// registered updates. Evaluation may run several times per tick while the
/// settle phase converges, so it must be a pure function of current values.
pub trait Component: fmt::Debug {
    /// Returns the component's instance name.
    fn name(&self) -> &str;

    /// Evaluates one settle iteration.
    fn eval(&self, design: &mut Design);
}

#[derive(Debug)]
struct SignalState {
    name: String,
    shape: Shape,
    reset: u64,
    value: u64,
    next: Option<u64>,
}

/// A combinational binding edge `dst <- src` installed by endpoint connection.
#[derive(Debug, Clone, Copy)]
struct Binding {
    dst: Signal,
    src: Signal,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EndpointId(usize);

#[derive(Debug)]
struct EndpointState {
    name: String,
    kind: EndpointKind,
    connected: bool,
    released: bool,
}

/// An endpoint that finished elaboration neither connected nor explicitly
/// released. A leak diagnostic, not a correctness gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenEndpoint {
    /// Endpoint instance name.
    pub name: String,
    /// Whether the open end is an inlet or an outlet.
    pub kind: EndpointKind,
}

/// Arena of signals, binding edges, and declared pipe endpoints.
#[derive(Debug, Default)]
pub struct Design {
    signals: Vec<SignalState>,
    bindings: Vec<Binding>,
    endpoints: Vec<EndpointState>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signal with reset value 0.
    pub fn add_signal(&mut self, name: impl Into<String>, shape: Shape) -> Signal {
        self.add_signal_reset(name, shape, 0)
    }

    /// Adds a signal with an explicit reset value.
    pub fn add_signal_reset(&mut self, name: impl Into<String>, shape: Shape, reset: u64) -> Signal {
        let reset = truncate(shape.width, reset);
        let id = self.signals.len();
        self.signals.push(SignalState { name: name.into(), shape, reset, value: reset, next: None });
        Signal { id }
    }

    /// Returns a signal's declared name.
    pub fn signal_name(&self, sig: Signal) -> &str {
        &self.signals[sig.id].name
    }

    /// Returns a signal's shape.
    pub fn shape(&self, sig: Signal) -> Shape {
        self.signals[sig.id].shape
    }

    /// Returns a signal's current value.
    pub fn value(&self, sig: Signal) -> u64 {
        self.signals[sig.id].value
    }

    /// Returns true iff the signal's current value is nonzero.
    pub fn is_high(&self, sig: Signal) -> bool {
        self.value(sig) != 0
    }

    /// Returns the signal's most significant bit.
    ///
    /// Down-counters sized to the `n - 2 ..= -1` scheme use this bit as their
    /// expiry sentinel.
    pub fn top_bit(&self, sig: Signal) -> bool {
        let state = &self.signals[sig.id];
        state.value >> (state.shape.width - 1) & 1 == 1
    }

    /// Combinational drive: the value is visible immediately.
    pub fn drive(&mut self, sig: Signal, value: u64) {
        let state = &mut self.signals[sig.id];
        state.value = truncate(state.shape.width, value);
    }

    /// Registered update: the value becomes visible on the next tick.
    ///
    /// A register not scheduled during a tick holds its value.
    pub fn set_next(&mut self, sig: Signal, value: u64) {
        let state = &mut self.signals[sig.id];
        state.next = Some(truncate(state.shape.width, value));
    }

    /// Overrides a signal's reset default, also resetting its current value.
    ///
    /// Used by [`PipeInlet::leave_unconnected`](crate::PipeInlet::leave_unconnected)
    /// to hold an open inlet's `ready` high.
    pub fn set_reset(&mut self, sig: Signal, reset: u64) {
        let state = &mut self.signals[sig.id];
        state.reset = truncate(state.shape.width, reset);
        state.value = state.reset;
    }

    /// Installs the combinational binding `dst <- src`.
    ///
    /// The destination must have the same width as the source and must have
    /// no other driver; connection machinery guarantees both by construction.
    pub fn bind(&mut self, dst: Signal, src: Signal) {
        assert_eq!(
            self.shape(dst).width,
            self.shape(src).width,
            "binding width mismatch: {} <- {}",
            self.signal_name(dst),
            self.signal_name(src),
        );
        self.bindings.push(Binding { dst, src });
    }

    pub(crate) fn register_endpoint(&mut self, name: impl Into<String>, kind: EndpointKind) -> EndpointId {
        let id = self.endpoints.len();
        self.endpoints.push(EndpointState { name: name.into(), kind, connected: false, released: false });
        EndpointId(id)
    }

    pub(crate) fn endpoint_open(&self, id: EndpointId) -> bool {
        let state = &self.endpoints[id.0];
        !state.connected && !state.released
    }

    pub(crate) fn mark_connected(&mut self, id: EndpointId) {
        self.endpoints[id.0].connected = true;
    }

    pub(crate) fn mark_released(&mut self, id: EndpointId) {
        self.endpoints[id.0].released = true;
    }

    /// Post-elaboration validation pass: reports every endpoint that is
    /// neither connected nor explicitly released.
    ///
    /// Run once after static wiring completes. Each open endpoint is logged
    /// as a warning; none of them is an error, since an endpoint may
    /// legitimately be left open on purpose.
    pub fn check_endpoints(&self) -> Vec<OpenEndpoint> {
        let open: Vec<_> = self
            .endpoints
            .iter()
            .filter(|e| !e.connected && !e.released)
            .map(|e| OpenEndpoint { name: e.name.clone(), kind: e.kind })
            .collect();
        for end in &open {
            log::warn!("pipe {} `{}` was never connected", end.kind, end.name);
        }
        open
    }

    /// Advances one global synchronous tick.
    ///
    /// Settles combinational values to a fixed point by repeatedly
    /// evaluating every component and propagating binding edges, then
    /// commits all registered updates atomically.
    pub fn step(&mut self, components: &[&dyn Component]) -> Result<(), SimError> {
        let limit = self.signals.len() + 2;
        let mut settled = false;
        for _ in 0..limit {
            for state in &mut self.signals {
                state.next = None;
            }
            let before: Vec<u64> = self.signals.iter().map(|s| s.value).collect();
            for component in components {
                component.eval(self);
            }
            self.propagate();
            if self.signals.iter().map(|s| s.value).eq(before) {
                settled = true;
                break;
            }
        }
        if !settled {
            return Err(SimError::CombinationalLoop(limit));
        }
        for state in &mut self.signals {
            if let Some(next) = state.next.take() {
                state.value = next;
            }
        }
        Ok(())
    }

    /// Runs `ticks` consecutive steps.
    pub fn run(&mut self, components: &[&dyn Component], ticks: usize) -> Result<(), SimError> {
        for _ in 0..ticks {
            self.step(components)?;
        }
        Ok(())
    }

    fn propagate(&mut self) {
        for i in 0..self.bindings.len() {
            let Binding { dst, src } = self.bindings[i];
            let value = self.value(src);
            self.drive(dst, value);
        }
    }
}
