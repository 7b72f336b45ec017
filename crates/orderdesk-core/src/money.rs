//! # Money Module
//!
//! Provides the `Money` type for every monetary and quantity value in OrderDesk.
//!
//! ## Why Fixed-Point Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    1.005 × 100 = 100.49999999999999  → rounds to 1.00  ❌ WRONG!        │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal + explicit scales                           │
//! │    currency  → 2 places   (unit_price, total_price, total_amount)       │
//! │    quantity  → 3 places   (1.500 units)                                 │
//! │    ratio     → 4 places   (0.2000 = 20%)                                │
//! │                                                                         │
//! │  Every quantize() rounds HALF-UP (midpoint away from zero), so the      │
//! │  same inputs give the same cents on every platform.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage
//! SQLite has no decimal column type, so values are persisted as integers in
//! minor units (`to_minor_units(2)` = cents, `to_minor_units(3)` = thousandths)
//! and read back with `from_minor_units`. Integer columns keep `SUM()` and
//! in-place increments exact.
//!
//! ## Usage
//! ```rust
//! use orderdesk_core::money::{Money, CURRENCY_SCALE};
//!
//! let price = Money::parse("10.00").unwrap();
//! let qty = Money::parse("1.5").unwrap();
//! let line = (price * qty).quantize(CURRENCY_SCALE);
//! assert_eq!(line.to_string(), "15.00");
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::error::{CoreError, CoreResult};

/// Decimal places for currency amounts.
pub const CURRENCY_SCALE: u32 = 2;

/// Decimal places for quantities (fractional units such as 1.500 kg).
pub const QUANTITY_SCALE: u32 = 3;

/// Decimal places for discount ratios (0.1250 = 12.5%).
pub const RATIO_SCALE: u32 = 4;

// =============================================================================
// Money Type
// =============================================================================

/// An exact decimal value.
///
/// ## Design Decisions
/// - **Single field tuple struct** over `rust_decimal::Decimal`
/// - **Scale is applied explicitly** with [`Money::quantize`]; arithmetic keeps
///   full precision until the caller decides where to round
/// - **Serialized as a string** (`"10.00"`) so JSON clients never see a float
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  ProductBatch tier ──► CartLine.unit_price ──┐                          │
/// │                                              ├─► discounted line total  │
/// │  add_item(quantity) ──► CartLine.quantity ───┘          │               │
/// │                                                         ▼               │
/// │                          OrderLine.total_price ──► Order.total_amount   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// One hundred, used to convert between ratios and percentages.
    pub const ONE_HUNDRED: Money = Money(Decimal::ONE_HUNDRED);

    /// Wraps a raw decimal.
    #[inline]
    pub const fn from_decimal(value: Decimal) -> Self {
        Money(value)
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn decimal(&self) -> Decimal {
        self.0
    }

    /// Creates a value from an integer count of minor units.
    ///
    /// ## Example
    /// ```rust
    /// use orderdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor_units(1099, 2).to_string(), "10.99");
    /// assert_eq!(Money::from_minor_units(1500, 3).to_string(), "1.500");
    /// ```
    #[inline]
    pub fn from_minor_units(units: i64, scale: u32) -> Self {
        Money(Decimal::new(units, scale))
    }

    /// Returns the value as an integer count of minor units at `scale`,
    /// rounding half-up first.
    ///
    /// Fails with `InvalidNumericInput` when the result does not fit in `i64`.
    pub fn to_minor_units(&self, scale: u32) -> CoreResult<i64> {
        let mut value = self.quantize(scale).0;
        // quantize() never leaves more than `scale` digits, so this only pads.
        value.rescale(scale);
        i64::try_from(value.mantissa())
            .map_err(|_| CoreError::InvalidNumericInput(self.to_string()))
    }

    /// Creates a whole-number value.
    #[inline]
    pub fn from_int(value: i64) -> Self {
        Money(Decimal::from(value))
    }

    /// Parses a decimal string.
    ///
    /// Accepts plain (`"12.5"`, `"-3"`) and scientific (`"1.5e2"`) notation,
    /// ignoring surrounding whitespace.
    ///
    /// ## Example
    /// ```rust
    /// use orderdesk_core::money::Money;
    ///
    /// assert_eq!(Money::parse(" 12.50 ").unwrap().to_string(), "12.50");
    /// assert!(Money::parse("twelve").is_err());
    /// ```
    pub fn parse(input: &str) -> CoreResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidNumericInput(input.to_string()));
        }

        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Money)
            .map_err(|_| CoreError::InvalidNumericInput(input.to_string()))
    }

    /// Converts a JSON-style number.
    ///
    /// The shortest round-trip representation of the float is parsed, so
    /// `0.1` becomes exactly `0.1` rather than its binary expansion.
    pub fn from_number(value: f64) -> CoreResult<Self> {
        if !value.is_finite() {
            return Err(CoreError::InvalidNumericInput(value.to_string()));
        }
        Money::parse(&value.to_string())
    }

    /// Lenient parse used for optional request fields: missing or invalid
    /// input becomes zero.
    pub fn parse_or_zero(input: Option<&str>) -> Self {
        input
            .and_then(|raw| Money::parse(raw).ok())
            .unwrap_or(Money::ZERO)
    }

    /// Rounds to `scale` decimal places, half-up (midpoint away from zero).
    ///
    /// ## Example
    /// ```rust
    /// use orderdesk_core::money::Money;
    ///
    /// assert_eq!(Money::parse("2.345").unwrap().quantize(2).to_string(), "2.35");
    /// assert_eq!(Money::parse("-2.345").unwrap().quantize(2).to_string(), "-2.35");
    /// assert_eq!(Money::from_int(5).quantize(2).to_string(), "5.00");
    /// ```
    pub fn quantize(&self, scale: u32) -> Self {
        let mut value = self
            .0
            .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(scale);
        Money(value)
    }

    /// Rounds to currency precision (2 places).
    #[inline]
    pub fn round_currency(&self) -> Self {
        self.quantize(CURRENCY_SCALE)
    }

    /// Rounds to quantity precision (3 places).
    #[inline]
    pub fn round_quantity(&self) -> Self {
        self.quantize(QUANTITY_SCALE)
    }

    /// Subtracts `other`.
    #[inline]
    pub fn subtract(&self, other: Money) -> Self {
        *self - other
    }

    /// Multiplies two values at full precision.
    #[inline]
    pub fn multiply(&self, other: Money) -> Self {
        *self * other
    }

    /// Divides by `divisor`.
    ///
    /// Fails with `InvalidNumericInput` on division by zero or overflow.
    pub fn divide(&self, divisor: Money) -> CoreResult<Self> {
        self.0
            .checked_div(divisor.0)
            .map(Money)
            .ok_or_else(|| CoreError::InvalidNumericInput(format!("{} / {}", self, divisor)))
    }

    /// Restricts the value to `[min, max]`.
    pub fn clamp_to(&self, min: Money, max: Money) -> Self {
        Money(self.0.clamp(min.0, max.0))
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is strictly greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is strictly less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money(value)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Money::from_int(value)
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

/// Multiplication keeps full precision (quantity × price, amount × ratio).
impl Mul for Money {
    type Output = Self;

    #[inline]
    fn mul(self, other: Self) -> Self {
        Money(self.0 * other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
