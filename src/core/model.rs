use serde::{Deserialize, Serialize};

use crate::core::geometry::BBox;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Horizontal,
    Vertical,
    /// Reserved for groups that mix orientations; the classifier never returns it today.
    Mixed,
}

/// One raw OCR output as produced by a text detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub text: String,
    pub bbox: BBox,
    pub confidence: f32,
    /// Rotation in degrees, `[0, 360)`, when the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
}

impl Detection {
    pub fn new(text: impl Into<String>, bbox: BBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
            angle: None,
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = Some(angle);
        self
    }
}

/// A logically coherent text unit built from one or more detections.
///
/// `bbox` is always the exact union of the boxes in `original_detections`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MergedText<'a> {
    pub text: String,
    pub bbox: BBox,
    pub direction: TextDirection,
    pub original_box_count: usize,
    pub original_detections: Vec<&'a Detection>,
}

impl<'a> MergedText<'a> {
    /// Mean confidence of the constituent detections.
    pub fn confidence(&self) -> f32 {
        if self.original_detections.is_empty() {
            return 0.0;
        }
        let sum: f32 = self
            .original_detections
            .iter()
            .map(|det| det.confidence)
            .sum();
        sum / self.original_detections.len() as f32
    }

    pub fn is_vertical(&self) -> bool {
        self.direction == TextDirection::Vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_angle_is_optional_in_json() {
        let json = r#"{"text":"abc","bbox":{"left":0,"top":0,"right":30,"bottom":10},"confidence":0.9}"#;
        let det: Detection = serde_json::from_str(json).expect("valid detection json");
        assert_eq!(det.angle, None);
        assert_eq!(det.bbox.width(), 30.0);

        let rotated = det.clone().with_angle(90.0);
        let out = serde_json::to_string(&rotated).expect("serializable");
        assert!(out.contains("\"angle\":90.0"));
    }

    #[test]
    fn confidence_is_mean_of_constituents() {
        let a = Detection::new("a", BBox::new(0.0, 0.0, 10.0, 10.0), 0.5);
        let b = Detection::new("b", BBox::new(12.0, 0.0, 20.0, 10.0), 1.0);
        let merged = MergedText {
            text: "ab".to_string(),
            bbox: a.bbox.union(&b.bbox),
            direction: TextDirection::Horizontal,
            original_box_count: 2,
            original_detections: vec![&a, &b],
        };
        assert_eq!(merged.confidence(), 0.75);
        assert!(!merged.is_vertical());
    }
}
