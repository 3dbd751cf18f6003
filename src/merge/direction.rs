use crate::core::model::{Detection, TextDirection};

/// Height-to-width ratio above which an unrotated group reads as vertical.
const VERTICAL_ASPECT_RATIO: f32 = 1.5;

/// Infers the reading direction of a detection group.
///
/// A rotation shared by every member wins; otherwise the group's mean aspect
/// ratio decides. `TextDirection::Mixed` is never returned.
pub fn classify_direction(detections: &[&Detection]) -> TextDirection {
    if detections.is_empty() {
        return TextDirection::Horizontal;
    }

    if let Some(angle) = shared_angle(detections) {
        return direction_for_angle(angle);
    }

    let count = detections.len() as f32;
    let mean_width = detections.iter().map(|det| det.bbox.width()).sum::<f32>() / count;
    let mean_height = detections.iter().map(|det| det.bbox.height()).sum::<f32>() / count;

    if mean_height > mean_width * VERTICAL_ASPECT_RATIO {
        TextDirection::Vertical
    } else {
        TextDirection::Horizontal
    }
}

pub fn classify_detection(detection: &Detection) -> TextDirection {
    classify_direction(&[detection])
}

fn shared_angle(detections: &[&Detection]) -> Option<f32> {
    let first = detections.first()?.angle?;
    detections
        .iter()
        .all(|det| det.angle == Some(first))
        .then_some(first)
}

/// Only exact 90 and 270 count as vertical. Detectors report quantized
/// rotations, so a near miss such as 89.9 is treated as horizontal.
fn direction_for_angle(angle: f32) -> TextDirection {
    if angle == 90.0 || angle == 270.0 {
        TextDirection::Vertical
    } else {
        TextDirection::Horizontal
    }
}
