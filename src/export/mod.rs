pub mod json_export;
pub mod text_export;

use anyhow::Result;

use crate::merge::MergeOutcome;

pub use json_export::JsonExporter;
pub use text_export::TextExporter;

/// Renders a merge outcome for hand-off to a downstream consumer.
pub trait Exporter {
    fn export(&self, outcome: &MergeOutcome<'_>) -> Result<String>;
}
