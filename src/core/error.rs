use std::fmt;

use thiserror::Error;

/// Rejected `MergingConfig` construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be in range [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
}

/// Pipeline stage attached as context to internal merge faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStage {
    Clustering,
    RowMerge,
    AdaptiveThreshold,
    FragmentReconcile,
    Validation,
}

impl fmt::Display for MergeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeStage::Clustering => "line clustering",
            MergeStage::RowMerge => "row merge",
            MergeStage::AdaptiveThreshold => "adaptive threshold",
            MergeStage::FragmentReconcile => "fragment reconciliation",
            MergeStage::Validation => "result validation",
        };
        f.write_str(name)
    }
}
