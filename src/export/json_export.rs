use anyhow::{Context, Result};

use crate::export::Exporter;
use crate::merge::MergeOutcome;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    pretty: bool,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, outcome: &MergeOutcome<'_>) -> Result<String> {
        let data = if self.pretty {
            serde_json::to_string_pretty(outcome)
        } else {
            serde_json::to_string(outcome)
        };
        data.context("serializing merge outcome")
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
    fn exports_results_and_stats() {
        let dets = vec![
            Detection::new("Hello", BBox::new(0.0, 0.0, 50.0, 20.0), 0.9),
            Detection::new("World", BBox::new(0.0, 100.0, 50.0, 120.0), 0.8).with_angle(0.0),
        ];
        let outcome = merge_with_stats(&dets, &MergingConfig::default());

        let json = JsonExporter::compact().export(&outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["results"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["results"][0]["text"], "Hello");
        assert_eq!(value["results"][0]["direction"], "horizontal");
        assert_eq!(value["results"][1]["original_detections"][0]["angle"], 0.0);
        assert_eq!(value["stats"]["original_count"], 2);
        assert_eq!(value["stats"]["fell_back"], false);
    }

    #[test]
    fn pretty_output_is_multiline() {
        let outcome = merge_with_stats(&[], &MergingConfig::default());
        let json = JsonExporter::new().export(&outcome).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("\"results\": []"));
    }
}
