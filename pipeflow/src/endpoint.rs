//! Pipe endpoints: directional instantiations of a [`PipeSpec`].
//!
//! A [`PipeInlet`] is the producer end: data flows downstream *out of* it,
//! `ready` flows upstream *into* it. A [`PipeOutlet`] is the consumer end.
//! Downstream signals are prefixed `o_` on the inlet and `i_` on the outlet;
//! the sole upstream signal (`ready`) uses the opposite prefixes. A transfer
//! happens on exactly the ticks where `valid` and `ready` are both high, and
//! the receiver must consume `data` during that same tick.

use thiserror::Error;

use crate::design::{Design, EndpointId};
use crate::signal::Signal;
use crate::spec::{PipeSpec, PortName, SignalDesc, SignalDirection};

/// The two directional instantiations of a pipe spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Producer end.
    Inlet,
    /// Consumer end.
    Outlet,
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::Inlet => write!(f, "inlet"),
            EndpointKind::Outlet => write!(f, "outlet"),
        }
    }
}

/// Connection failures: wiring-time configuration errors, raised before any
/// clock ticks occur.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    /// The endpoint is already connected (or explicitly released).
    #[error("pipe {kind} `{endpoint}` is already connected")]
    AlreadyConnected {
        /// Endpoint name.
        endpoint: String,
        /// Endpoint kind.
        kind: EndpointKind,
    },
    /// The two specs are not structurally equal.
    #[error("connecting incompatible pipes `{inlet}` and `{outlet}`")]
    SpecMismatch {
        /// Inlet name.
        inlet: String,
        /// Outlet name.
        outlet: String,
    },
}

/// A completed connection: one combinational binding per pipe signal,
/// downstream driven from the inlet, `ready` from the outlet.
#[derive(Debug)]
pub struct Connection {
    /// Inlet name.
    pub inlet: String,
    /// Outlet name.
    pub outlet: String,
    bindings: Vec<(Signal, Signal)>,
}

impl Connection {
    /// The installed `(dst, src)` binding pairs, in canonical signal order.
    pub fn bindings(&self) -> &[(Signal, Signal)] {
        &self.bindings
    }

    /// Number of installed bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no bindings were installed (never the case for a valid spec).
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn prefix(kind: EndpointKind, direction: SignalDirection) -> &'static str {
    match (kind, direction) {
        (EndpointKind::Inlet, SignalDirection::Downstream) => "o_",
        (EndpointKind::Inlet, SignalDirection::Upstream) => "i_",
        (EndpointKind::Outlet, SignalDirection::Downstream) => "i_",
        (EndpointKind::Outlet, SignalDirection::Upstream) => "o_",
    }
}

#[derive(Debug)]
struct End {
    spec: PipeSpec,
    name: String,
    id: EndpointId,
    data: Signal,
    data_size: Option<Signal>,
    stop: Option<Signal>,
    start: Option<Signal>,
    valid: Signal,
    ready: Signal,
}

impl End {
    fn instantiate(design: &mut Design, spec: PipeSpec, name: &str, kind: EndpointKind) -> Self {
        let id = design.register_endpoint(name, kind);
        let mut data = None;
        let mut data_size = None;
        let mut stop = None;
        let mut start = None;
        let mut valid = None;
        let mut ready = None;
        for desc in spec.signals() {
            let full = format!("{}_{}{}", name, prefix(kind, desc.direction), desc.name.as_str());
            let sig = design.add_signal(full, desc.shape);
            match desc.name {
                PortName::Data => data = Some(sig),
                PortName::DataSize => data_size = Some(sig),
                PortName::Stop => stop = Some(sig),
                PortName::Start => start = Some(sig),
                PortName::Valid => valid = Some(sig),
                PortName::Ready => ready = Some(sig),
            }
        }
        // data/valid/ready are unconditionally present in the canonical order.
        let data = data.expect("pipe spec without data signal");
        let valid = valid.expect("pipe spec without valid signal");
        let ready = ready.expect("pipe spec without ready signal");
        End { spec, name: name.to_string(), id, data, data_size, stop, start, valid, ready }
    }

    fn port(&self, desc: &SignalDesc) -> Signal {
        let sig = match desc.name {
            PortName::Data => Some(self.data),
            PortName::DataSize => self.data_size,
            PortName::Stop => self.stop,
            PortName::Start => self.start,
            PortName::Valid => Some(self.valid),
            PortName::Ready => Some(self.ready),
        };
        sig.expect("endpoint missing a signal of its own spec")
    }
}

/// Producer end of a pipe.
#[derive(Debug)]
pub struct PipeInlet {
    end: End,
}

impl PipeInlet {
    pub(crate) fn instantiate(design: &mut Design, spec: PipeSpec, name: &str) -> Self {
        PipeInlet { end: End::instantiate(design, spec, name, EndpointKind::Inlet) }
    }

    /// The spec this inlet instantiates.
    pub fn spec(&self) -> &PipeSpec {
        &self.end.spec
    }

    /// The endpoint's instance name.
    pub fn name(&self) -> &str {
        &self.end.name
    }

    /// Downstream payload, driven by this inlet.
    pub fn o_data(&self) -> Signal {
        self.end.data
    }

    /// Downstream size field, if the spec carries one.
    pub fn o_data_size(&self) -> Option<Signal> {
        self.end.data_size
    }

    /// Downstream stop marker, if the spec carries framing.
    pub fn o_stop(&self) -> Option<Signal> {
        self.end.stop
    }

    /// Downstream start marker, if the spec carries framing.
    pub fn o_start(&self) -> Option<Signal> {
        self.end.start
    }

    /// Downstream valid, driven by this inlet.
    pub fn o_valid(&self) -> Signal {
        self.end.valid
    }

    /// Upstream ready, driven by the connected outlet.
    pub fn i_ready(&self) -> Signal {
        self.end.ready
    }

    /// True when data is sent on the current tick.
    pub fn sent(&self, design: &Design) -> bool {
        design.is_high(self.i_ready()) && design.is_high(self.o_valid())
    }

    /// True when the receiver hasn't accepted the last data.
    pub fn full(&self, design: &Design) -> bool {
        design.is_high(self.o_valid()) && !design.is_high(self.i_ready())
    }

    /// Connects this inlet to an outlet. See [`connect`].
    pub fn flow_to(&self, design: &mut Design, outlet: &PipeOutlet) -> Result<Connection, ConnectError> {
        connect(design, self, outlet)
    }

    /// Marks this inlet as intentionally open and holds its `ready` default
    /// high, so an unconnected producer is never stalled by a phantom
    /// consumer.
    pub fn leave_unconnected(&self, design: &mut Design) -> Result<(), ConnectError> {
        if !design.endpoint_open(self.end.id) {
            return Err(ConnectError::AlreadyConnected {
                endpoint: self.end.name.clone(),
                kind: EndpointKind::Inlet,
            });
        }
        design.mark_released(self.end.id);
        design.set_reset(self.i_ready(), 1);
        Ok(())
    }
}

/// Consumer end of a pipe.
#[derive(Debug)]
pub struct PipeOutlet {
    end: End,
}

impl PipeOutlet {
    pub(crate) fn instantiate(design: &mut Design, spec: PipeSpec, name: &str) -> Self {
        PipeOutlet { end: End::instantiate(design, spec, name, EndpointKind::Outlet) }
    }

    /// The spec this outlet instantiates.
    pub fn spec(&self) -> &PipeSpec {
        &self.end.spec
    }

    /// The endpoint's instance name.
    pub fn name(&self) -> &str {
        &self.end.name
    }

    /// Downstream payload, driven by the connected inlet.
    pub fn i_data(&self) -> Signal {
        self.end.data
    }

    /// Downstream size field, if the spec carries one.
    pub fn i_data_size(&self) -> Option<Signal> {
        self.end.data_size
    }

    /// Downstream stop marker, if the spec carries framing.
    pub fn i_stop(&self) -> Option<Signal> {
        self.end.stop
    }

    /// Downstream start marker, if the spec carries framing.
    pub fn i_start(&self) -> Option<Signal> {
        self.end.start
    }

    /// Downstream valid, driven by the connected inlet.
    pub fn i_valid(&self) -> Signal {
        self.end.valid
    }

    /// Upstream ready, driven by this outlet.
    pub fn o_ready(&self) -> Signal {
        self.end.ready
    }

    /// True when data is received on the current tick.
    pub fn received(&self, design: &Design) -> bool {
        design.is_high(self.o_ready()) && design.is_high(self.i_valid())
    }

    /// Connects this outlet to an inlet. See [`connect`].
    pub fn flow_from(&self, design: &mut Design, inlet: &PipeInlet) -> Result<Connection, ConnectError> {
        connect(design, inlet, self)
    }

    /// Marks this outlet as intentionally open.
    pub fn leave_unconnected(&self, design: &mut Design) -> Result<(), ConnectError> {
        if !design.endpoint_open(self.end.id) {
            return Err(ConnectError::AlreadyConnected {
                endpoint: self.end.name.clone(),
                kind: EndpointKind::Outlet,
            });
        }
        design.mark_released(self.end.id);
        Ok(())
    }
}

/// Connects an inlet to an outlet.
///
/// Fails if either end is already connected or the specs are not structurally
/// equal; a failure mutates nothing. On success both ends are marked
/// connected for the rest of their lifetime and one combinational binding is
/// installed per pipe signal: downstream signals driven from the inlet side,
/// `ready` driven from the outlet side.
pub fn connect(design: &mut Design, inlet: &PipeInlet, outlet: &PipeOutlet) -> Result<Connection, ConnectError> {
    if !design.endpoint_open(inlet.end.id) {
        return Err(ConnectError::AlreadyConnected { endpoint: inlet.end.name.clone(), kind: EndpointKind::Inlet });
    }
    if !design.endpoint_open(outlet.end.id) {
        return Err(ConnectError::AlreadyConnected { endpoint: outlet.end.name.clone(), kind: EndpointKind::Outlet });
    }
    if inlet.end.spec != outlet.end.spec {
        return Err(ConnectError::SpecMismatch { inlet: inlet.end.name.clone(), outlet: outlet.end.name.clone() });
    }
    design.mark_connected(inlet.end.id);
    design.mark_connected(outlet.end.id);

    let mut bindings = Vec::new();
    for desc in inlet.end.spec.signals() {
        let (dst, src) = match desc.direction {
            SignalDirection::Downstream => (outlet.end.port(&desc), inlet.end.port(&desc)),
            SignalDirection::Upstream => (inlet.end.port(&desc), outlet.end.port(&desc)),
        };
        design.bind(dst, src);
        bindings.push((dst, src));
    }
    Ok(Connection { inlet: inlet.end.name.clone(), outlet: outlet.end.name.clone(), bindings })
}
