use tracing::{info, warn};

use crate::prometheus::MetricsSource;
use crate::report::format_value;
use crate::selector::{select, Selection};
use crate::types::{CheckResult, Config, PerfData, Sample, Status};

pub const NO_DATA_MESSAGE: &str = "query returned no data";

/// Runs the configured query once and decides the check outcome.
///
/// Query failures, timeouts and empty results all end as UNKNOWN; nothing is
/// retried.
pub async fn run_check<S: MetricsSource>(cfg: &Config, source: &S) -> CheckResult {
    let outcome = match tokio::time::timeout(cfg.timeout, source.query(&cfg.query)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            warn!("query failed: {}", e);
            return CheckResult::unknown(&cfg.name, format!("error querying Prometheus: {}", e));
        }
        Err(_) => {
            warn!("query timed out after {:?}", cfg.timeout);
            return CheckResult::unknown(
                &cfg.name,
                format!("query timed out after {}s", cfg.timeout.as_secs()),
            );
        }
    };

    for w in &outcome.warnings {
        warn!("prometheus warning: {}", w);
    }

    match select(&outcome.samples, &cfg.thresholds) {
        Selection::NoData => CheckResult::unknown(&cfg.name, NO_DATA_MESSAGE),
        Selection::Representative { index, status } => {
            let sample = outcome.samples[index].clone();
            info!(
                "selected sample {} of {}: {} = {} ({})",
                index,
                outcome.samples.len(),
                sample.series(),
                sample.value,
                status
            );
            build_result(cfg, sample, status)
        }
    }
}

fn build_result(cfg: &Config, sample: Sample, status: Status) -> CheckResult {
    let series = sample.series();
    let message = format!("{} ({} is {})", cfg.name, series, format_value(sample.value));
    let label = if sample.labels.is_empty() { cfg.name.clone() } else { series };
    let perf_data = PerfData {
        label,
        value: sample.value,
        warning: Some(cfg.thresholds.warning),
        critical: Some(cfg.thresholds.critical),
    };

    CheckResult {
        status,
        name: cfg.name.clone(),
        message,
        sample: Some(sample),
        perf_data: Some(perf_data),
    }
}
