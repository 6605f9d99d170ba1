use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::time::Duration;

use crate::prometheus::normalize_host;
use crate::threshold::{ThresholdRange, Thresholds};
use crate::types::Config;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ABOUT: &str = "Check that the value returned by a Prometheus query falls within \
warning and critical thresholds given in Nagios range format.";

const LONG_ABOUT: &str = "Check that the value returned by a Prometheus query falls within \
warning and critical thresholds given in Nagios range format.

Example:
  check-prometheus -H my.host:9090 -q 'sum(my_metric)' -w 10 -c 100

The result is OK if the value is between 0 and 10, WARNING if it is greater \
than 10 but at most 100, and CRITICAL if it is greater than 100 or below zero. \
When the query returns several series, the first CRITICAL series is reported, \
otherwise the first series with the highest severity.";

/// Command line flags. Required values are optional here so that missing
/// ones can fall back to the environment and be reported uniformly.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "check-prometheus", version, about = ABOUT, long_about = LONG_ABOUT)]
pub struct CliArgs {
    /// Prometheus host, e.g. prom:9090 or https://prom.example.com
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// PromQL instant query
    #[arg(short, long)]
    pub query: Option<String>,

    /// Warning range
    #[arg(short, long, allow_hyphen_values = true)]
    pub warning: Option<String>,

    /// Critical range
    #[arg(short, long, allow_hyphen_values = true)]
    pub critical: Option<String>,

    /// Short, descriptive name for the metric
    #[arg(short, long, default_value = "metric")]
    pub name: String,

    /// Query timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config(args: CliArgs) -> Result<Config> {
    load_config_with_env(args, &SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(args: CliArgs, env: &E) -> Result<Config> {
    let host = non_empty(args.host)
        .or_else(|| non_empty(env.get_var("PROMETHEUS_HOST")))
        .ok_or_else(|| anyhow!("host is required (--host or PROMETHEUS_HOST)"))?;
    let query = non_empty(args.query).ok_or_else(|| anyhow!("query is required"))?;
    let warning = non_empty(args.warning).ok_or_else(|| anyhow!("warning is required"))?;
    let critical = non_empty(args.critical).ok_or_else(|| anyhow!("critical is required"))?;

    let warning = ThresholdRange::parse(&warning).context("Invalid warning range")?;
    let critical = ThresholdRange::parse(&critical).context("Invalid critical range")?;

    let timeout_secs = match args.timeout {
        Some(secs) => secs,
        None => env
            .get_var("CHECK_TIMEOUT")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
            .trim()
            .parse::<u64>()
            .context("Invalid CHECK_TIMEOUT")?,
    };
    if timeout_secs == 0 {
        return Err(anyhow!("timeout must be at least one second"));
    }

    Ok(Config {
        host: normalize_host(&host),
        query,
        name: args.name,
        thresholds: Thresholds::new(warning, critical),
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
