use anyhow::Result;

use crate::core::model::MergedText;
use crate::export::Exporter;
use crate::merge::MergeOutcome;

/// One merged unit per line, in output order.
#[derive(Debug, Clone, Default)]
pub struct TextExporter;

impl TextExporter {
    pub fn new() -> Self {
        Self
    }

    fn format_unit(unit: &MergedText<'_>) -> String {
        if unit.is_vertical() {
            format!("[V] {}", unit.text)
        } else {
            unit.text.clone()
        }
    }
}

impl Exporter for TextExporter {
    fn export(&self, outcome: &MergeOutcome<'_>) -> Result<String> {
        let mut text = String::new();
        for unit in &outcome.results {
            text.push_str(&Self::format_unit(unit));
            text.push('\n');
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MergingConfig;
    use crate::core::geometry::BBox;
    use crate::core::model::Detection;
    use crate::merge::merge_with_stats;

    #[test]
    fn marks_vertical_units() {
        let dets = vec![
            Detection::new("縦書き", BBox::new(0.0, 0.0, 20.0, 90.0), 0.9),
            Detection::new("Caption", BBox::new(100.0, 200.0, 180.0, 220.0), 0.9),
        ];
        let outcome = merge_with_stats(&dets, &MergingConfig::default());
        let text = TextExporter::new().export(&outcome).unwrap();
        assert_eq!(text, "[V] 縦書き\nCaption\n");
    }
}
