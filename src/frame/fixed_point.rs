//! 16.16 fixed-point arithmetic for the resampler.
//!
//! All operations are integer-only. Inputs are bounded by realistic image
//! dimensions (< 2^15), so the only widening needed is in [`Fixed::mul`].

use std::ops::{Neg, Sub};

/// Number of fractional bits.
pub const SHIFT: u32 = 16;

/// Mask selecting the fractional bits.
pub const FRACTION_MASK: i32 = (1 << SHIFT) - 1;

/// A real number stored as a signed integer scaled by `2^SHIFT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Fixed(i32);

impl Fixed {
    /// One whole unit.
    pub const ONE: Fixed = Fixed(1 << SHIFT);

    /// Wrap a raw scaled value.
    pub const fn from_raw(raw: i32) -> Self {
        Fixed(raw)
    }

    /// The raw scaled value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Convert an integer to fixed point.
    pub const fn from_int(value: i32) -> Self {
        Fixed(value << SHIFT)
    }

    /// Convert back to an integer with an arithmetic right shift
    /// (truncates toward negative infinity).
    pub const fn to_int(self) -> i32 {
        self.0 >> SHIFT
    }

    /// Clear the fractional bits.
    pub const fn floor(self) -> Self {
        Fixed(self.0 & !FRACTION_MASK)
    }

    /// Set every fractional bit, then add the smallest step.
    ///
    /// A value that is already integral comes back one whole unit larger:
    /// `ceil(2.0) == 3.0`. The resampler's tie-break depends on this.
    pub const fn ceil(self) -> Self {
        Fixed((self.0 | FRACTION_MASK) + 1)
    }

    /// Fixed-point product, widened to 64 bits before shifting back.
    pub const fn mul(self, rhs: Fixed) -> Self {
        Fixed(((self.0 as i64 * rhs.0 as i64) >> SHIFT) as i32)
    }

    /// Divide by a plain integer (no rescaling).
    pub const fn div_int(self, divisor: i32) -> Self {
        Fixed(self.0 / divisor)
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}
