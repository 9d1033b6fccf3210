//! Native fixed-point amount type.
//!
//! Amounts are represented as integer raw units (u64) to avoid floating-point errors.
//! One coin is `COIN` raw units; vote weights reported by the coordination service
//! are expressed in raw units as well.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use crate::TypesError;

/// Raw units per whole coin.
pub const COIN: u64 = 100_000_000;

/// Number of fractional digits in a coin string.
const COIN_DECIMALS: usize = 8;

/// A non-negative amount in raw units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Construct from a whole number of coins.
    pub fn from_coins(coins: u64) -> Self {
        Self(coins.saturating_mul(COIN))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parse a decimal coin string such as `"12.5"` into raw units.
    pub fn from_coin_str(s: &str) -> Result<Self, TypesError> {
        let s = s.trim();
        let invalid = || TypesError::InvalidAmount(s.to_string());
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > COIN_DECIMALS
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut frac_raw: u64 = 0;
        if !frac.is_empty() {
            let padded = format!("{frac:0<width$}", width = COIN_DECIMALS);
            frac_raw = padded.parse().map_err(|_| invalid())?;
        }
        whole
            .checked_mul(COIN)
            .and_then(|w| w.checked_add(frac_raw))
            .map(Self)
            .ok_or_else(invalid)
    }

    /// Render as a decimal coin string, trimming trailing zeros.
    pub fn to_coin_string(&self) -> String {
        let whole = self.0 / COIN;
        let frac = self.0 % COIN;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:0width$}", width = COIN_DECIMALS);
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl FromStr for Amount {
    type Err = TypesError;

    /// Parses raw units (an unsigned integer).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypesError::InvalidAmount(s.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_string_parsing() {
        assert_eq!(Amount::from_coin_str("1").unwrap().raw(), COIN);
        assert_eq!(Amount::from_coin_str("12.5").unwrap().raw(), 1_250_000_000);
        assert_eq!(Amount::from_coin_str("0.00000001").unwrap().raw(), 1);
        assert_eq!(Amount::from_coin_str(".5").unwrap().raw(), 50_000_000);
    }

    #[test]
    fn coin_string_rejects_garbage() {
        assert!(Amount::from_coin_str("").is_err());
        assert!(Amount::from_coin_str("-1").is_err());
        assert!(Amount::from_coin_str("1.000000001").is_err());
        assert!(Amount::from_coin_str("abc").is_err());
        assert!(Amount::from_coin_str("1.2.3").is_err());
    }

    #[test]
    fn coin_string_rendering() {
        assert_eq!(Amount::new(COIN).to_coin_string(), "1");
        assert_eq!(Amount::new(150_000_000).to_coin_string(), "1.5");
        assert_eq!(Amount::new(1).to_coin_string(), "0.00000001");
    }

    #[test]
    fn raw_parse_and_sum() {
        let total: Amount = ["10", "5"]
            .iter()
            .map(|s| s.parse::<Amount>().unwrap())
            .sum();
        assert_eq!(total, Amount::new(15));
        assert!("-3".parse::<Amount>().is_err());
    }

    #[test]
    fn addition_saturates() {
        assert_eq!(Amount::new(u64::MAX) + Amount::new(1), Amount::new(u64::MAX));
    }

    proptest::proptest! {
        #[test]
        fn coin_string_is_lossless(raw in 0u64..=u64::MAX / 2) {
            let amount = Amount::new(raw);
            proptest::prop_assert_eq!(Amount::from_coin_str(&amount.to_coin_string()).unwrap(), amount);
        }
    }
}
