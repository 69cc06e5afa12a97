//! Utilities.

/// Returns ceiling log2.
pub const fn clog2(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        (::std::mem::size_of::<usize>() * 8) - (value - 1).leading_zeros() as usize
    }
}

/// Returns the all-ones mask for a bit width.
///
/// Widths above 64 are not representable; `mask(64)` saturates to `u64::MAX`.
pub const fn mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Truncates a value to a bit width.
pub const fn truncate(width: usize, value: u64) -> u64 {
    value & mask(width)
}

/// Returns the two's-complement representation of a (possibly negative)
/// constant in the given width.
///
/// This is how counters initialized to `-1` or reloaded to `divisor / 2 - 2`
/// get their bit patterns.
pub const fn to_masked(width: usize, value: i64) -> u64 {
    (value as u64) & mask(width)
}

/// Returns the number of bits needed to hold `value` itself.
///
/// Unlike [`clog2`], `bit_length(8)` is 4, not 3.
pub const fn bit_length(value: usize) -> usize {
    clog2(value + 1)
}
