//! Duration value object for user-facing time limits

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Recording auto-stops after this many seconds unless stopped earlier
pub const DEFAULT_MAX_DURATION_SECS: u64 = 12;

/// An export that has not resolved after this many seconds fails the job
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 120;

/// Value object representing a positive time limit.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Default recording limit (12 seconds)
    pub const fn default_max_duration() -> Self {
        Self::from_secs(DEFAULT_MAX_DURATION_SECS)
    }

    /// Default export limit (2 minutes)
    pub const fn default_export_timeout() -> Self {
        Self::from_secs(DEFAULT_EXPORT_TIMEOUT_SECS)
    }

    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse strings such as `12s`, `1m`, `1m30s`, `1h` or `500ms`.
    /// Units may be combined but each unit may appear only once, from
    /// largest to smallest.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DurationParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_lowercase();
        let mut rest = input.as_str();
        let mut total_ms: u64 = 0;
        // Index into UNITS of the last unit consumed, to enforce ordering
        let mut last_unit: Option<usize> = None;

        const UNITS: [(&str, u64); 4] = [("h", 3_600_000), ("m", 60_000), ("s", 1000), ("ms", 1)];

        while !rest.is_empty() {
            let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 {
                return Err(err());
            }
            let value: u64 = rest[..digits].parse().map_err(|_| err())?;
            rest = &rest[digits..];

            let unit_len = rest.chars().take_while(|c| c.is_ascii_alphabetic()).count();
            let unit = &rest[..unit_len];
            rest = &rest[unit_len..];

            let index = UNITS
                .iter()
                .position(|(name, _)| *name == unit)
                .ok_or_else(err)?;
            if last_unit.is_some_and(|last| index <= last) {
                return Err(err());
            }
            last_unit = Some(index);

            let factor = UNITS[index].1;
            total_ms = value
                .checked_mul(factor)
                .and_then(|v| total_ms.checked_add(v))
                .ok_or_else(err)?;
        }

        if total_ms == 0 {
            return Err(err());
        }

        Ok(Self {
            milliseconds: total_ms,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        let millis = self.milliseconds % 1000;

        if total_secs == 0 {
            write!(f, "{}ms", millis)
        } else if minutes == 0 {
            write!(f, "{}s", seconds)
        } else if seconds == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}s", minutes, seconds)
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::default_max_duration()
    }
}
