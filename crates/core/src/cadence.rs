//! Contact cadence: how often the user wants to be in touch.
//!
//! Month and year are fixed 30- and 365-day periods, not calendar months
//! and years.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Unit of a contact's cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyUnit {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl FrequencyUnit {
    /// Every unit, in ascending length.
    pub const ALL: [Self; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    /// Days covered by one unit.
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrequencyUnit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(ParseEnumError {
                kind: "frequency unit",
                value: other.to_owned(),
            }),
        }
    }
}

/// A string did not name any variant of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Human-readable name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Why a cadence cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CadenceError {
    #[error("frequency value must be at least 1 (got {0})")]
    NonPositive(i32),
    #[error("cadence of {value} {unit}(s) is outside the representable date range")]
    OutOfRange { value: i32, unit: FrequencyUnit },
}

/// A validated cadence: `value` repetitions of `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cadence {
    value: i32,
    unit: FrequencyUnit,
}

impl Cadence {
    /// Validate a cadence.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::NonPositive`] when `value < 1`.
    pub const fn new(value: i32, unit: FrequencyUnit) -> Result<Self, CadenceError> {
        if value < 1 {
            return Err(CadenceError::NonPositive(value));
        }
        Ok(Self { value, unit })
    }

    #[must_use]
    pub const fn value(self) -> i32 {
        self.value
    }

    #[must_use]
    pub const fn unit(self) -> FrequencyUnit {
        self.unit
    }

    /// Length of one cadence period.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::OutOfRange`] if the period does not fit in a
    /// [`TimeDelta`].
    pub fn offset(self) -> Result<TimeDelta, CadenceError> {
        i64::from(self.value)
            .checked_mul(self.unit.days())
            .and_then(TimeDelta::try_days)
            .ok_or(CadenceError::OutOfRange {
                value: self.value,
                unit: self.unit,
            })
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value == 1 {
            write!(f, "every {}", self.unit)
        } else {
            write!(f, "every {} {}s", self.value, self.unit)
        }
    }
}
