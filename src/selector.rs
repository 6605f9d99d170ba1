use tracing::debug;

use crate::threshold::Thresholds;
use crate::types::{Sample, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The query returned no series at all.
    NoData,
    Representative { index: usize, status: Status },
}

/// Picks the sample whose status stands for the whole result.
///
/// The first CRITICAL sample ends the scan. Otherwise the first sample to
/// reach the highest severity seen is kept; later samples only replace it
/// when strictly more severe.
pub fn select(samples: &[Sample], thresholds: &Thresholds) -> Selection {
    if samples.is_empty() {
        return Selection::NoData;
    }

    let mut best = (0, Status::Ok);
    for (index, sample) in samples.iter().enumerate() {
        let status = thresholds.classify(sample.value);
        debug!("sample {} ({}) = {} -> {}", index, sample.series(), sample.value, status);
        if status == Status::Critical {
            return Selection::Representative { index, status };
        }
        if status > best.1 {
            best = (index, status);
        }
    }

    let (index, status) = best;
    Selection::Representative { index, status }
}
