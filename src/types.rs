use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use nagiosplugin::ServiceState;

use crate::threshold::{ThresholdRange, Thresholds};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub query: String,
    pub name: String,
    pub thresholds: Thresholds,
    pub timeout: Duration,
}

/// Nagios service state.
///
/// Variant order is the severity order used when scanning several samples:
/// OK < WARNING < UNKNOWN < CRITICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Ok,
    Warning,
    Unknown,
    Critical,
}

impl Status {
    /// The plugin-library state this status is reported as.
    pub fn service_state(&self) -> ServiceState {
        match self {
            Status::Ok => ServiceState::Ok,
            Status::Warning => ServiceState::Warning,
            Status::Critical => ServiceState::Critical,
            Status::Unknown => ServiceState::Unknown,
        }
    }

    /// Plugin exit code understood by Nagios/Icinga.
    pub fn exit_code(&self) -> i32 {
        self.service_state().exit_code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.service_state())
    }
}

/// One series returned by an instant query.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl Sample {
    pub fn new(labels: BTreeMap<String, String>, value: f64) -> Self {
        Self { labels, value }
    }

    /// Renders the series the way Prometheus prints it: `name{k="v", ...}`.
    pub fn series(&self) -> String {
        let name = self.labels.get("__name__").map(String::as_str).unwrap_or("");
        let pairs: Vec<String> = self
            .labels
            .iter()
            .filter(|(k, _)| k.as_str() != "__name__")
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect();
        if pairs.is_empty() && !name.is_empty() {
            return name.to_string();
        }
        format!("{}{{{}}}", name, pairs.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerfData {
    pub label: String,
    pub value: f64,
    pub warning: Option<ThresholdRange>,
    pub critical: Option<ThresholdRange>,
}

/// Final decision of a single check run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub status: Status,
    pub name: String,
    pub message: String,
    pub sample: Option<Sample>,
    pub perf_data: Option<PerfData>,
}

impl CheckResult {
    pub fn unknown<S: Into<String>>(name: &str, message: S) -> Self {
        Self {
            status: Status::Unknown,
            name: name.to_string(),
            message: message.into(),
            sample: None,
            perf_data: None,
        }
    }
}
