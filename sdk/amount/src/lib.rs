//! Donation amounts
//!
//! Parses the donor's raw decimal input into an exact count of the funding
//! asset's base units before any cryptographic work begins.
//!
//! ```text
//! "0.5" ──▶ validate(decimals = 18) ──▶ Amount { units: 500_000_000_000_000_000 }
//! ```
//!
//! Validation is pure. Failures are reported in a fixed precedence:
//! `NotNumeric`, then `NonPositive`, then `PrecisionOverflow`, then `OutOfRange`.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest decimal count whose unit scale (10^decimals) fits in a `u64`.
pub const MAX_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is not a decimal number")]
    NotNumeric,
    #[error("amount must be greater than zero")]
    NonPositive,
    #[error("amount has more than {max_decimals} fractional digits")]
    PrecisionOverflow { max_decimals: u8 },
    #[error("amount exceeds the largest supported value")]
    OutOfRange,
    #[error("asset precision of {0} decimals is not supported (max {MAX_DECIMALS})")]
    UnsupportedDecimals(u8),
}

/// A strictly positive quantity of the funding asset, in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAmount")]
pub struct Amount {
    units: NonZeroU64,
    decimals: u8,
}

/// Unchecked wire form of [`Amount`].
#[derive(Deserialize)]
struct RawAmount {
    units: u64,
    decimals: u8,
}

impl TryFrom<RawAmount> for Amount {
    type Error = AmountError;

    fn try_from(raw: RawAmount) -> Result<Self, Self::Error> {
        if raw.decimals > MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals(raw.decimals));
        }
        Self::from_base_units(raw.units, raw.decimals).ok_or(AmountError::NonPositive)
    }
}

impl Amount {
    /// Build from an exact base-unit count. Returns `None` for zero units or an
    /// unsupported decimal count.
    pub fn from_base_units(units: u64, decimals: u8) -> Option<Self> {
        if decimals > MAX_DECIMALS {
            return None;
        }
        NonZeroU64::new(units).map(|units| Self { units, decimals })
    }

    pub fn base_units(&self) -> u64 {
        self.units.get()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

impl fmt::Display for Amount {
    /// Canonical decimal rendering: no leading zeros, no trailing fractional zeros.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10u64.pow(self.decimals as u32);
        let whole = self.units.get() / scale;
        let frac = self.units.get() % scale;

        if frac == 0 {
            return write!(f, "{whole}");
        }

        let digits = format!("{:0width$}", frac, width = self.decimals as usize);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

/// Validates raw donor input against the asset's precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountValidator {
    decimals: u8,
}

impl AmountValidator {
    pub fn new(decimals: u8) -> Result<Self, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals(decimals));
        }
        Ok(Self { decimals })
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Parse and normalize `raw` into an [`Amount`].
    pub fn validate(&self, raw: &str) -> Result<Amount, AmountError> {
        let parsed = Decimal::parse(raw)?;

        if parsed.negative || parsed.is_zero() {
            return Err(AmountError::NonPositive);
        }

        // Trailing fractional zeros carry no precision.
        let fraction = parsed.fraction.trim_end_matches('0');
        if fraction.len() > self.decimals as usize {
            return Err(AmountError::PrecisionOverflow {
                max_decimals: self.decimals,
            });
        }

        let padding = self.decimals as usize - fraction.len();
        let digits = parsed
            .integer
            .bytes()
            .chain(fraction.bytes())
            .chain(std::iter::repeat_n(b'0', padding));

        let mut units: u64 = 0;
        for digit in digits {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(u64::from(digit - b'0')))
                .ok_or(AmountError::OutOfRange)?;
        }

        Amount::from_base_units(units, self.decimals).ok_or(AmountError::NonPositive)
    }
}

/// Lexical split of a signed decimal literal. Digits only, at most one point.
struct Decimal<'a> {
    negative: bool,
    integer: &'a str,
    fraction: &'a str,
}

impl<'a> Decimal<'a> {
    fn parse(raw: &'a str) -> Result<Self, AmountError> {
        let s = raw.trim();
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (integer, fraction) = body.split_once('.').unwrap_or((body, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if integer.len() + fraction.len() == 0 || !all_digits(integer) || !all_digits(fraction) {
            return Err(AmountError::NotNumeric);
        }

        Ok(Self {
            negative,
            integer,
            fraction,
        })
    }

    fn is_zero(&self) -> bool {
        self.integer.bytes().chain(self.fraction.bytes()).all(|b| b == b'0')
    }
}
