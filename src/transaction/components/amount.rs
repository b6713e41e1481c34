//! Monetary values, counted in zatoshis.

use std::convert::TryFrom;
use std::iter::Sum;
use std::ops::{Add, Sub};

pub const COIN: i64 = 1_0000_0000;

/// The total ZEC supply in zatoshis. No valid amount lies outside
/// `-MAX_MONEY..=MAX_MONEY`.
pub const MAX_MONEY: i64 = 21_000_000 * COIN;

/// A quantity of zatoshis.
///
/// Every constructor checks the monetary range, and the `Add`/`Sub` impls
/// yield `None` rather than an out-of-range result, so a value of this type
/// is always within `-MAX_MONEY..=MAX_MONEY`. Negative quantities are
/// representable because the protocol uses signed value fields, but
/// transaction outputs are decoded through the non-negative constructors
/// only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    /// Zero zatoshis.
    pub const ZERO: Amount = Amount(0);

    /// Wraps a signed zatoshi count, rejecting values outside
    /// `-MAX_MONEY..=MAX_MONEY`.
    pub fn from_i64(zat: i64) -> Result<Self, ()> {
        if zat.checked_abs().map_or(false, |magnitude| magnitude <= MAX_MONEY) {
            Ok(Amount(zat))
        } else {
            Err(())
        }
    }

    /// Wraps a signed zatoshi count, rejecting values outside `0..=MAX_MONEY`.
    pub fn from_nonnegative_i64(zat: i64) -> Result<Self, ()> {
        if (0..=MAX_MONEY).contains(&zat) {
            Ok(Amount(zat))
        } else {
            Err(())
        }
    }

    /// Wraps an unsigned zatoshi count, rejecting values above `MAX_MONEY`.
    pub fn from_u64(zat: u64) -> Result<Self, ()> {
        match i64::try_from(zat) {
            Ok(zat) => Self::from_nonnegative_i64(zat),
            Err(_) => Err(()),
        }
    }

    /// Parses the signed 64-bit little-endian wire encoding.
    pub fn from_i64_le_bytes(bytes: [u8; 8]) -> Result<Self, ()> {
        Self::from_i64(i64::from_le_bytes(bytes))
    }

    /// Parses the signed 64-bit little-endian wire encoding, additionally
    /// rejecting negative values.
    pub fn from_nonnegative_i64_le_bytes(bytes: [u8; 8]) -> Result<Self, ()> {
        Self::from_nonnegative_i64(i64::from_le_bytes(bytes))
    }

    /// The signed 64-bit little-endian wire encoding of this amount.
    pub fn to_i64_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl TryFrom<i64> for Amount {
    type Error = ();

    fn try_from(zat: i64) -> Result<Self, ()> {
        Amount::from_i64(zat)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> i64 {
        amount.0
    }
}

impl Add for Amount {
    type Output = Option<Amount>;

    fn add(self, rhs: Amount) -> Option<Amount> {
        self.0
            .checked_add(rhs.0)
            .and_then(|total| Amount::from_i64(total).ok())
    }
}

impl Sub for Amount {
    type Output = Option<Amount>;

    fn sub(self, rhs: Amount) -> Option<Amount> {
        self.0
            .checked_sub(rhs.0)
            .and_then(|difference| Amount::from_i64(difference).ok())
    }
}

impl Sum<Amount> for Option<Amount> {
    fn sum<I: Iterator<Item = Amount>>(mut iter: I) -> Self {
        iter.try_fold(Amount::ZERO, |total, value| total + value)
    }
}
