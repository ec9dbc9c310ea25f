//! # Money Module
//!
//! Provides the `Money` type for every price, line total and sale total.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Brake pads $25.99 × 2 + oil filter $15.50 in f64:                     │
//! │    51.98 + 15.5 = 67.47999999999999  ❌                                 │
//! │                                                                         │
//! │  In integer cents:                                                     │
//! │    2599 × 2 + 1550 = 6748            ✅ exactly $67.48                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gearbox_core::money::Money;
//!
//! let pads = Money::from_cents(2599);          // $25.99
//! let line = pads.multiply_quantity(2);         // $51.98
//! let subtotal = line + Money::from_cents(1550);
//! assert_eq!(subtotal.cents(), 6748);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction of a discount may go below zero before
///   the totals policy rejects it, so the type itself must represent it
/// - **Single field tuple struct**: zero-cost wrapper over i64
///
/// ## Where Money Flows
/// ```text
/// Product.price_cents ──► SaleItem.unit_price (frozen) ──► line_total
///                                                              │
///                            Σ line_total ──► subtotal ◄───────┘
///                                               │
///                          subtotal + tax − discount ──► total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use gearbox_core::money::Money;
    ///
    /// let spark_plugs = Money::from_cents(4599);
    /// assert_eq!(spark_plugs.cents(), 4599);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax at `rate`, rounding half up to the nearest cent.
    ///
    /// Used to *suggest* a tax amount on a quote; the tax recorded on a sale
    /// is always the amount the caller supplied.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`
    ///
    /// ```rust
    /// use gearbox_core::money::Money;
    /// use gearbox_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(6748);   // $67.48
    /// let rate = TaxRate::from_bps(800);        // 8%
    /// // $67.48 × 8% = $5.3984 → $5.40
    /// assert_eq!(subtotal.calculate_tax(rate).cents(), 540);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large subtotals from overflowing
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ```rust
    /// use gearbox_core::money::Money;
    ///
    /// let wiper = Money::from_cents(1299);
    /// assert_eq!(wiper.multiply_quantity(3).cents(), 3897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// Quantities arrive straight from the request body, so line pricing
    /// goes through this instead of [`Money::multiply_quantity`].
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display (`$67.48`). Locale-aware formatting belongs to
/// the frontend, which knows the configured currency.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
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

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
