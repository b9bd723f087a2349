//! The estimate value: a time interval stored as a number of minutes.
//!
//! Durations use a working-time calendar: 1 hour = 60 minutes, 1 day =
//! 8 hours, 1 week = 5 days. The textual form is `<digits><unit>` tokens
//! (`30m`, `2h`, `1d`, `1w`) separated by whitespace, commas or semicolons;
//! a zero duration renders as `"0"`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{FormatError, ValidationError};

/// Minutes per hour.
pub const MINUTES_PER_HOUR: u32 = 60;
/// Minutes per working day (8 hours).
pub const MINUTES_PER_DAY: u32 = MINUTES_PER_HOUR * 8;
/// Minutes per working week (5 days).
pub const MINUTES_PER_WEEK: u32 = MINUTES_PER_DAY * 5;

/// A non-negative time interval, ordered and compared by minute count.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Duration(u32);

impl Duration {
    /// Create a duration from a minute count.
    #[must_use]
    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Create a duration from a possibly-negative minute count, failing on
    /// negative values.
    pub fn try_from_minutes(minutes: i64) -> Result<Self, ValidationError> {
        u32::try_from(minutes)
            .map(Self)
            .map_err(|_| ValidationError::new("minutes", "must be non-negative"))
    }

    /// The minute count.
    #[must_use]
    pub fn minutes(self) -> u32 {
        self.0
    }

    /// Parse a scale specification into an ordered sequence of durations.
    ///
    /// Tokens are `<digits><unit>` with unit one of `m`, `h`, `d`, `w`,
    /// separated by runs of whitespace, commas or semicolons. Any malformed
    /// token fails the whole parse with a [`FormatError`] naming the
    /// offending input. Empty input yields an empty sequence.
    pub fn parse_many(input: &str) -> Result<Vec<Self>, FormatError> {
        let mut durations = Vec::new();
        let mut digits = String::new();
        for chr in input.chars() {
            if chr.is_whitespace() || chr == ',' || chr == ';' {
                if !digits.is_empty() {
                    // A separator right after digits leaves a unit-less token.
                    return Err(FormatError::new(digits));
                }
                continue;
            }
            if chr.is_ascii_digit() {
                digits.push(chr);
            } else {
                let mul = match chr {
                    'm' => 1,
                    'h' => MINUTES_PER_HOUR,
                    'd' => MINUTES_PER_DAY,
                    'w' => MINUTES_PER_WEEK,
                    _ => return Err(FormatError::new(format!("{digits}{chr}"))),
                };
                let value: u32 = digits
                    .parse()
                    .map_err(|_| FormatError::new(format!("{digits}{chr}")))?;
                durations.push(Self(value * mul));
                digits.clear();
            }
        }
        if !digits.is_empty() {
            return Err(FormatError::new(digits));
        }
        Ok(durations)
    }

    /// Parse a single `<digits><unit>` token.
    ///
    /// Fails with a [`FormatError`] unless the full token matches the
    /// pattern (no separators, no extra tokens).
    pub fn parse_one(token: &str) -> Result<Self, FormatError> {
        let mut parsed = Self::parse_many(token)?;
        match (parsed.len(), token.chars().any(char::is_whitespace)) {
            (1, false) if !token.contains([',', ';']) => Ok(parsed.remove(0)),
            _ => Err(FormatError::new(token)),
        }
    }
}

impl fmt::Display for Duration {
    /// Render the canonical minimal form: week/day/hour/minute components
    /// greater than zero, largest first, space-separated; `"0"` for zero.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0;
        if n == 0 {
            return f.write_str("0");
        }
        let mut parts = Vec::with_capacity(4);
        if n >= MINUTES_PER_WEEK {
            parts.push(format!("{}w", n / MINUTES_PER_WEEK));
            n %= MINUTES_PER_WEEK;
        }
        if n >= MINUTES_PER_DAY {
            parts.push(format!("{}d", n / MINUTES_PER_DAY));
            n %= MINUTES_PER_DAY;
        }
        if n >= MINUTES_PER_HOUR {
            parts.push(format!("{}h", n / MINUTES_PER_HOUR));
            n %= MINUTES_PER_HOUR;
        }
        if n > 0 {
            parts.push(format!("{n}m"));
        }
        f.write_str(&parts.join(" "))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
