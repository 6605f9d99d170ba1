//! Nagios threshold ranges.
//!
//! A range is written `[@]start:end`. Without a colon the whole text is the
//! end and the start is 0. `~` as start means negative infinity, an empty
//! end means positive infinity. A plain range alarms when the value falls
//! outside it, an `@` range alarms when the value falls inside.

use std::fmt;

use crate::types::Status;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("empty threshold range")]
    Empty,
    #[error("invalid bound '{bound}' in threshold range '{spec}'")]
    InvalidBound { spec: String, bound: String },
    #[error("threshold range '{0}' contains more than one ':'")]
    TooManyColons(String),
    #[error("threshold range '{spec}' starts after it ends ({start} > {end})")]
    StartAfterEnd { spec: String, start: f64, end: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRange {
    pub start: f64,
    pub end: f64,
    pub inverted: bool,
}

impl ThresholdRange {
    pub fn parse(spec: &str) -> Result<Self, ThresholdError> {
        let trimmed = spec.trim();
        let (inverted, body) = match trimmed.strip_prefix('@') {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return Err(ThresholdError::Empty);
        }

        let (start, end) = match body.split_once(':') {
            Some((_, e)) if e.contains(':') => {
                return Err(ThresholdError::TooManyColons(spec.to_string()));
            }
            Some((s, e)) => (parse_start(s, spec)?, parse_end(e, spec)?),
            None => (0.0, parse_bound(body, spec)?),
        };

        if start > end {
            return Err(ThresholdError::StartAfterEnd {
                spec: spec.to_string(),
                start,
                end,
            });
        }

        Ok(Self { start, end, inverted })
    }

    /// Inclusive at both ends.
    pub fn contains(&self, value: f64) -> bool {
        self.start <= value && value <= self.end
    }

    /// True when the value is in the alarm region of this range.
    pub fn alerts(&self, value: f64) -> bool {
        if self.inverted {
            self.contains(value)
        } else {
            !self.contains(value)
        }
    }
}

fn parse_start(raw: &str, spec: &str) -> Result<f64, ThresholdError> {
    match raw.trim() {
        "" => Ok(0.0),
        "~" => Ok(f64::NEG_INFINITY),
        s => parse_bound(s, spec),
    }
}

fn parse_end(raw: &str, spec: &str) -> Result<f64, ThresholdError> {
    match raw.trim() {
        "" => Ok(f64::INFINITY),
        s => parse_bound(s, spec),
    }
}

fn parse_bound(raw: &str, spec: &str) -> Result<f64, ThresholdError> {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(v) if !v.is_nan() => Ok(v),
        _ => Err(ThresholdError::InvalidBound {
            spec: spec.to_string(),
            bound: raw.to_string(),
        }),
    }
}

impl fmt::Display for ThresholdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            f.write_str("@")?;
        }
        if self.start == 0.0 && self.end.is_finite() {
            return write!(f, "{}", self.end);
        }
        if self.start == f64::NEG_INFINITY {
            f.write_str("~:")?;
        } else {
            write!(f, "{}:", self.start)?;
        }
        if self.end.is_finite() {
            write!(f, "{}", self.end)?;
        }
        Ok(())
    }
}

/// The warning/critical pair of a check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warning: ThresholdRange,
    pub critical: ThresholdRange,
}

impl Thresholds {
    pub fn new(warning: ThresholdRange, critical: ThresholdRange) -> Self {
        Self { warning, critical }
    }

    pub fn parse(warning: &str, critical: &str) -> Result<Self, ThresholdError> {
        Ok(Self::new(
            ThresholdRange::parse(warning)?,
            ThresholdRange::parse(critical)?,
        ))
    }

    /// Critical is checked before warning; NaN is always UNKNOWN.
    pub fn classify(&self, value: f64) -> Status {
        if value.is_nan() {
            Status::Unknown
        } else if self.critical.alerts(value) {
            Status::Critical
        } else if self.warning.alerts(value) {
            Status::Warning
        } else {
            Status::Ok
        }
    }
}
