// Public modules
pub mod types;
pub mod config;
pub mod threshold;
pub mod selector;
pub mod prometheus;
pub mod check;
pub mod report;

// Re-export commonly used items
pub use types::*;
pub use config::{load_config, load_config_with_env, CliArgs, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use threshold::{ThresholdError, ThresholdRange, Thresholds};
pub use selector::{select, Selection};
pub use prometheus::{MetricsSource, PrometheusClient, QueryError, QueryOutcome};
pub use check::run_check;
pub use report::{report, PluginOutput};
