//! Pipe specs: immutable descriptors of a streaming item's shape.

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::design::Design;
use crate::endpoint::{PipeInlet, PipeOutlet};
use crate::signal::Shape;
use crate::utils::bit_length;

/// Flag: the pipe carries a `data_size` field alongside the payload.
pub const DATA_SIZE: u32 = 1 << 8;

/// Flag: the pipe carries `start`/`stop` framing markers.
pub const START_STOP: u32 = 1 << 9;

const FLAGS: u32 = DATA_SIZE | START_STOP;
const PACKED_WIDTH: u32 = 0xff;

/// Spec construction failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    /// A packed integer had bits set outside the width and flag fields.
    #[error("invalid packed pipe spec {0:#x}")]
    InvalidPacked(u32),
    /// The payload is too wide for the packed encoding's 8-bit width field.
    #[error("payload of {0} bits does not fit the packed encoding")]
    WidthTooWide(usize),
}

/// A named payload field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Field shape.
    pub shape: Shape,
}

impl Field {
    /// Creates a field.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Field { name: name.into(), shape }
    }
}

/// The payload's shape: a plain bit vector or an ordered field layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PayloadShape {
    /// A single (possibly signed) bit vector.
    Bits(Shape),
    /// An ordered list of named fields.
    Fields(Vec<Field>),
}

/// Canonical pipe signal names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortName {
    /// Payload.
    Data,
    /// Payload size field (with [`DATA_SIZE`]).
    DataSize,
    /// Framing stop marker (with [`START_STOP`]).
    Stop,
    /// Framing start marker (with [`START_STOP`]).
    Start,
    /// Downstream handshake bit.
    Valid,
    /// Upstream handshake bit.
    Ready,
}

impl PortName {
    /// The signal name as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            PortName::Data => "data",
            PortName::DataSize => "data_size",
            PortName::Stop => "stop",
            PortName::Start => "start",
            PortName::Valid => "valid",
            PortName::Ready => "ready",
        }
    }
}

/// Direction of a pipe signal relative to data flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDirection {
    /// Flows with the data (data, valid, size, framing markers).
    Downstream,
    /// Flows against the data (ready).
    Upstream,
}

/// One signal of a pipe endpoint's bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalDesc {
    /// Canonical name.
    pub name: PortName,
    /// Shape.
    pub shape: Shape,
    /// Direction.
    pub direction: SignalDirection,
}

impl SignalDesc {
    const fn downstream(name: PortName, shape: Shape) -> Self {
        SignalDesc { name, shape, direction: SignalDirection::Downstream }
    }

    const fn upstream(name: PortName, shape: Shape) -> Self {
        SignalDesc { name, shape, direction: SignalDirection::Upstream }
    }
}

/// Immutable descriptor of a streaming item's shape and framing flags.
///
/// Two specs are equal iff their flags and payload shapes are structurally
/// equal, regardless of how they were constructed. Specs are cheap to clone
/// and safe to share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipeSpec {
    flags: u32,
    shape: PayloadShape,
}

impl PipeSpec {
    /// A spec with an unsigned payload of the given width.
    pub fn from_width(width: usize) -> Self {
        Self::from_shape(Shape::unsigned(width))
    }

    /// A spec from an explicit payload shape.
    pub fn from_shape(shape: Shape) -> Self {
        PipeSpec { flags: 0, shape: PayloadShape::Bits(shape) }
    }

    /// A spec from an ordered named-field layout.
    pub fn from_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        PipeSpec { flags: 0, shape: PayloadShape::Fields(fields.into_iter().collect()) }
    }

    /// A spec from the packed 32-bit wire encoding: payload width in bits
    /// 0..8, flags in bits 8..10.
    ///
    /// Any other bit set is an error; there is no silent coercion.
    pub fn from_packed(packed: u32) -> Result<Self, SpecError> {
        let width = packed & PACKED_WIDTH;
        let flags = packed & FLAGS;
        if packed != width | flags {
            return Err(SpecError::InvalidPacked(packed));
        }
        Ok(PipeSpec { flags, shape: PayloadShape::Bits(Shape::unsigned(width as usize)) })
    }

    /// Adds the [`DATA_SIZE`] flag.
    pub fn with_data_size(mut self) -> Self {
        self.flags |= DATA_SIZE;
        self
    }

    /// Adds the [`START_STOP`] flag.
    pub fn with_start_stop(mut self) -> Self {
        self.flags |= START_STOP;
        self
    }

    /// The raw flag bits.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// The payload shape.
    pub fn payload_shape(&self) -> &PayloadShape {
        &self.shape
    }

    /// Total payload width: the field widths' sum for a layout.
    pub fn data_width(&self) -> usize {
        match &self.shape {
            PayloadShape::Bits(shape) => shape.width,
            PayloadShape::Fields(fields) => fields.iter().map(|f| f.shape.width).sum(),
        }
    }

    /// Whether the pipe carries a `data_size` field.
    pub fn has_size_field(&self) -> bool {
        self.flags & DATA_SIZE != 0
    }

    /// Whether the pipe carries `start`/`stop` framing markers.
    pub fn has_start_stop(&self) -> bool {
        self.flags & START_STOP != 0
    }

    /// Width of the `data_size` field: enough bits to hold `data_width`
    /// itself.
    pub fn size_width(&self) -> usize {
        bit_length(self.data_width() + 1)
    }

    /// The packed 32-bit wire encoding.
    pub fn as_packed(&self) -> Result<u32, SpecError> {
        let width = self.data_width();
        if width > PACKED_WIDTH as usize {
            return Err(SpecError::WidthTooWide(width));
        }
        Ok(width as u32 | self.flags)
    }

    /// The endpoint signal bundle, in the fixed canonical order:
    /// `data` [, `data_size`] [, `stop`, `start`], `valid`, `ready`.
    ///
    /// The order is part of the wire contract; record-level consumers rely
    /// on it.
    pub fn signals(&self) -> ArrayVec<SignalDesc, 6> {
        let data_shape = match &self.shape {
            PayloadShape::Bits(shape) => *shape,
            PayloadShape::Fields(_) => Shape::unsigned(self.data_width()),
        };
        let mut sigs = ArrayVec::new();
        sigs.push(SignalDesc::downstream(PortName::Data, data_shape));
        if self.has_size_field() {
            sigs.push(SignalDesc::downstream(PortName::DataSize, Shape::unsigned(self.size_width())));
        }
        if self.has_start_stop() {
            sigs.push(SignalDesc::downstream(PortName::Stop, Shape::unsigned(1)));
            sigs.push(SignalDesc::downstream(PortName::Start, Shape::unsigned(1)));
        }
        sigs.push(SignalDesc::downstream(PortName::Valid, Shape::unsigned(1)));
        sigs.push(SignalDesc::upstream(PortName::Ready, Shape::unsigned(1)));
        sigs
    }

    /// The downstream subset of [`PipeSpec::signals`].
    pub fn downstream_signals(&self) -> ArrayVec<SignalDesc, 6> {
        self.signals().into_iter().filter(|s| s.direction == SignalDirection::Downstream).collect()
    }

    /// The upstream subset of [`PipeSpec::signals`].
    pub fn upstream_signals(&self) -> ArrayVec<SignalDesc, 6> {
        self.signals().into_iter().filter(|s| s.direction == SignalDirection::Upstream).collect()
    }

    /// The payload subset (everything but the handshake bits).
    pub fn payload_signals(&self) -> ArrayVec<SignalDesc, 6> {
        self.signals().into_iter().filter(|s| !matches!(s.name, PortName::Valid | PortName::Ready)).collect()
    }

    /// The handshake subset (`valid` and `ready`).
    pub fn handshake_signals(&self) -> ArrayVec<SignalDesc, 6> {
        self.signals().into_iter().filter(|s| matches!(s.name, PortName::Valid | PortName::Ready)).collect()
    }

    /// Instantiates the producer end of this spec in a design.
    pub fn inlet(&self, design: &mut Design, name: &str) -> PipeInlet {
        PipeInlet::instantiate(design, self.clone(), name)
    }

    /// Instantiates the consumer end of this spec in a design.
    pub fn outlet(&self, design: &mut Design, name: &str) -> PipeOutlet {
        PipeOutlet::instantiate(design, self.clone(), name)
    }
}
