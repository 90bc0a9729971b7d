//! Numeric sensor readings parsed from raw feed strings.

use std::fmt;

/// A parsed sensor value.
///
/// The feed transports every value as a string. A value without a decimal
/// point is read as an integer, anything else as a float, so that integer
/// thresholds compare exactly and display without a trailing `.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Int(i64),
    Float(f64),
}

impl Reading {
    /// Parse a raw feed value. Returns `None` for empty, non-numeric
    /// (e.g. a reported fault string) or non-finite input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.contains('.') {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Reading::Float)
        } else {
            raw.parse::<i64>().ok().map(Reading::Int)
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Reading::Int(v) => v as f64,
            Reading::Float(v) => v,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Int(v) => write!(f, "{v}"),
            Reading::Float(v) => write!(f, "{v}"),
        }
    }
}
