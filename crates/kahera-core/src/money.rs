//! # Money Module
//!
//! Provides the `Money` type for handling peso amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    ₱137.50 is stored as 13750 centavos                                 │
//! │    Sums over a cart are exact and order-independent                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kahera_core::money::Money;
//!
//! let price = Money::from_centavos(13750); // ₱137.50
//! let doubled = price * 2;                 // ₱275.00
//! assert_eq!(doubled.centavos(), 27500);
//! assert_eq!(price.to_string(), "₱137.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Basis points in one whole (100%).
pub const BPS_PER_WHOLE: i64 = 10_000;

/// Centavos in one peso.
pub const CENTAVOS_PER_UNIT: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (the smallest peso unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate differences (subtotal − discount) may go
///   negative before clamping
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use kahera_core::money::Money;
    ///
    /// let price = Money::from_centavos(1099); // ₱10.99
    /// assert_eq!(price.centavos(), 1099);
    /// ```
    #[inline]
    pub const fn from_centavos(centavos: i64) -> Self {
        Money(centavos)
    }

    /// Creates a Money value from pesos and centavos.
    ///
    /// ## Example
    /// ```rust
    /// use kahera_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(137, 50).centavos(), 13750);
    /// assert_eq!(Money::from_major_minor(-5, 50).centavos(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * CENTAVOS_PER_UNIT - minor)
        } else {
            Money(major * CENTAVOS_PER_UNIT + minor)
        }
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn centavos(&self) -> i64 {
        self.0
    }

    /// Returns the whole-peso portion (truncated toward zero).
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / CENTAVOS_PER_UNIT
    }

    /// Returns the centavo portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % CENTAVOS_PER_UNIT).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kahera_core::money::Money;
    ///
    /// let unit_price = Money::from_centavos(10000); // ₱100.00
    /// assert_eq!(unit_price.multiply_quantity(2).centavos(), 20000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `bps` basis points of this amount, rounded half-up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, computed in i128.
    ///
    /// ## Example
    /// ```rust
    /// use kahera_core::money::Money;
    ///
    /// let gross = Money::from_centavos(20000); // ₱200.00
    /// assert_eq!(gross.basis_points(1250).centavos(), 2500); // 12.5%
    /// ```
    pub fn basis_points(&self, bps: i64) -> Money {
        let half = BPS_PER_WHOLE as i128 / 2;
        let scaled = self.0 as i128 * bps as i128;
        let rounded = if scaled >= 0 {
            (scaled + half) / BPS_PER_WHOLE as i128
        } else {
            (scaled - half) / BPS_PER_WHOLE as i128
        };
        Money::from_centavos(rounded as i64)
    }

    /// Restricts the value to `[min, max]`.
    #[inline]
    pub fn clamp_between(self, min: Money, max: Money) -> Money {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }

    /// Returns `self` or zero, whichever is larger.
    #[inline]
    pub fn non_negative(self) -> Money {
        if self.0 < 0 {
            Money::zero()
        } else {
            self
        }
    }

    /// Rounds to the nearest whole peso, half-up, clamping negatives to 0.
    ///
    /// ## Example
    /// ```rust
    /// use kahera_core::money::Money;
    ///
    /// assert_eq!(Money::from_centavos(12349).round_to_whole_units(), 123);
    /// assert_eq!(Money::from_centavos(12350).round_to_whole_units(), 124);
    /// assert_eq!(Money::from_centavos(-500).round_to_whole_units(), 0);
    /// ```
    pub fn round_to_whole_units(&self) -> u64 {
        if self.0 <= 0 {
            return 0;
        }
        let whole = (self.0 / CENTAVOS_PER_UNIT) as u64;
        if self.0 % CENTAVOS_PER_UNIT >= CENTAVOS_PER_UNIT / 2 {
            whole + 1
        } else {
            whole
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows pesos with two decimals, e.g. `₱62.50`.
///
/// ## Note
/// This is for logs and debugging. Localized display belongs to the UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}₱{}.{:02}",
            sign,
            self.pesos().abs(),
            self.centavos_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
