use serde::Serialize;
use tracing::debug;

use varscope_core::VariantCount;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoverageError {
    #[error("total_cases must be positive, got {0}")]
    InvalidTotal(u64),
    #[error("threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),
}

/// How much of the case population a selection covers.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageSummary {
    pub selected: usize,
    pub covered_cases: u64,
    pub total_cases: u64,
    pub covered_fraction: f64,
}

impl CoverageSummary {
    pub fn of(selected: &[VariantCount], total_cases: u64) -> Self {
        let covered_cases: u64 = selected.iter().map(|v| v.frequency).sum();
        Self {
            selected: selected.len(),
            covered_cases,
            total_cases,
            covered_fraction: if total_cases > 0 {
                covered_cases as f64 / total_cases as f64
            } else {
                0.0
            },
        }
    }
}

/// Select the shortest frequency-ranked prefix covering `threshold` of all cases.
///
/// `sorted_variants` must already be sorted by descending frequency; it is not
/// re-sorted here. The element that crosses the threshold is included. If the
/// threshold is never reached (e.g. `total_cases` overstates the real sum) the
/// whole input is returned.
pub fn select(
    sorted_variants: &[VariantCount],
    total_cases: u64,
    threshold: f64,
) -> Result<Vec<VariantCount>, CoverageError> {
    if total_cases == 0 {
        return Err(CoverageError::InvalidTotal(total_cases));
    }
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(CoverageError::InvalidThreshold(threshold));
    }

    let mut cumulative = 0u64;
    let mut selected = Vec::new();

    for entry in sorted_variants {
        cumulative += entry.frequency;
        selected.push(entry.clone());
        if cumulative as f64 / total_cases as f64 >= threshold {
            break;
        }
    }

    debug!(
        selected = selected.len(),
        of = sorted_variants.len(),
        cumulative,
        total_cases,
        "coverage cutoff"
    );
    Ok(selected)
}
