//! Signal shapes and handles.

use std::fmt;

/// Width and signedness of a signal or payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Width in bits.
    pub width: usize,
    /// Whether values are interpreted as two's complement.
    pub signed: bool,
}

impl Shape {
    /// An unsigned shape of the given width.
    pub const fn unsigned(width: usize) -> Self {
        Shape { width, signed: false }
    }

    /// A signed shape of the given width.
    pub const fn signed(width: usize) -> Self {
        Shape { width, signed: true }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signed {
            write!(f, "signed({})", self.width)
        } else {
            write!(f, "unsigned({})", self.width)
        }
    }
}

/// Handle to a signal stored in a [`Design`](crate::Design) arena.
///
/// Handles are cheap to copy and only meaningful together with the design
/// that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal {
    pub(crate) id: usize,
}
