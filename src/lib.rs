pub mod core;
pub mod export;
pub mod merge;

pub use crate::core::config::{MergePreset, MergingConfig};
pub use crate::core::error::{ConfigError, MergeStage};
pub use crate::core::geometry::BBox;
pub use crate::core::model::{Detection, MergedText, TextDirection};
pub use crate::core::stats::MergeStats;
pub use crate::merge::{merge, merge_with_stats, DetectionMerger, MergeOutcome};
