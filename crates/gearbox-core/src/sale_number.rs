//! # Sale Numbers
//!
//! Human-facing sale identifiers printed on receipts.
//!
//! ```text
//! Sequential:  SALE-000042            (counter value, zero-padded to 6)
//!              SALE-1000000           (wider values are never truncated)
//! Fallback:    SALE-123456789-07      (last 9 digits of epoch ms + salt)
//! ```
//!
//! The counter itself lives in the database; this module only formats and
//! parses numbers so the rules are testable without I/O.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

pub const SALE_NUMBER_PREFIX: &str = "SALE-";

/// Minimum digits in a sequential number.
pub const SEQUENCE_WIDTH: usize = 6;

const FALLBACK_MILLIS_DIGITS: usize = 9;
const FALLBACK_SALT_DIGITS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct SaleNumber(String);

impl SaleNumber {
    /// Formats counter value `seq` as `SALE-NNNNNN`.
    ///
    /// ```rust
    /// use gearbox_core::sale_number::SaleNumber;
    ///
    /// assert_eq!(SaleNumber::sequential(42).as_str(), "SALE-000042");
    /// assert_eq!(SaleNumber::sequential(1_000_000).as_str(), "SALE-1000000");
    /// ```
    pub fn sequential(seq: i64) -> Self {
        SaleNumber(format!(
            "{}{:0width$}",
            SALE_NUMBER_PREFIX,
            seq,
            width = SEQUENCE_WIDTH
        ))
    }

    /// Non-sequential number used when the sequential candidate is taken.
    ///
    /// `epoch_millis` and `salt` are passed in; this crate never reads the
    /// clock or a random source.
    pub fn fallback(epoch_millis: i64, salt: u8) -> Self {
        let tail = epoch_millis.rem_euclid(10_i64.pow(FALLBACK_MILLIS_DIGITS as u32));
        SaleNumber(format!(
            "{}{:0mw$}-{:0sw$}",
            SALE_NUMBER_PREFIX,
            tail,
            salt % 100,
            mw = FALLBACK_MILLIS_DIGITS,
            sw = FALLBACK_SALT_DIGITS
        ))
    }

    /// Numeric suffix of a sequential number, `None` for fallback numbers.
    ///
    /// ```rust
    /// use gearbox_core::sale_number::SaleNumber;
    ///
    /// assert_eq!(SaleNumber::sequential(7).sequence(), Some(7));
    /// assert_eq!(SaleNumber::fallback(1_700_000_000_123, 5).sequence(), None);
    /// ```
    pub fn sequence(&self) -> Option<i64> {
        let digits = self.0.strip_prefix(SALE_NUMBER_PREFIX)?;
        if digits.len() < SEQUENCE_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Whether `s` matches either the sequential or the fallback pattern.
    pub fn is_well_formed(s: &str) -> bool {
        let Some(rest) = s.strip_prefix(SALE_NUMBER_PREFIX) else {
            return false;
        };
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

        match rest.split_once('-') {
            None => all_digits(rest) && rest.len() >= SEQUENCE_WIDTH,
            Some((millis, salt)) => {
                all_digits(millis)
                    && all_digits(salt)
                    && millis.len() == FALLBACK_MILLIS_DIGITS
                    && salt.len() == FALLBACK_SALT_DIGITS
            }
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SaleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SaleNumber {
    fn from(s: String) -> Self {
        SaleNumber(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_format() {
        assert_eq!(SaleNumber::sequential(1).as_str(), "SALE-000001");
        assert_eq!(SaleNumber::sequential(999_999).as_str(), "SALE-999999");
        assert_eq!(SaleNumber::sequential(1_234_567).as_str(), "SALE-1234567");
    }

    #[test]
    fn test_fallback_format() {
        let n = SaleNumber::fallback(1_760_000_123_456, 7);
        assert_eq!(n.as_str(), "SALE-000123456-07");
        assert!(SaleNumber::is_well_formed(n.as_str()));

        // salt is always two digits
        let n = SaleNumber::fallback(42, 199);
        assert_eq!(n.as_str(), "SALE-000000042-99");
    }

    #[test]
    fn test_sequence_round_trip() {
        for seq in [1, 42, 999_999, 1_000_000] {
            assert_eq!(SaleNumber::sequential(seq).sequence(), Some(seq));
        }
        assert_eq!(SaleNumber::from("SALE-12".to_string()).sequence(), None);
        assert_eq!(SaleNumber::from("INV-000001".to_string()).sequence(), None);
    }

    #[test]
    fn test_is_well_formed() {
        assert!(SaleNumber::is_well_formed("SALE-000001"));
        assert!(SaleNumber::is_well_formed("SALE-1000000"));
        assert!(SaleNumber::is_well_formed("SALE-123456789-01"));

        assert!(!SaleNumber::is_well_formed("SALE-1"));
        assert!(!SaleNumber::is_well_formed("SALE-12345678-01"));
        assert!(!SaleNumber::is_well_formed("SALE-123456789-1"));
        assert!(!SaleNumber::is_well_formed("sale-000001"));
        assert!(!SaleNumber::is_well_formed("SALE-00000a"));
    }
}
