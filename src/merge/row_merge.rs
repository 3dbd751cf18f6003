use std::cmp::Ordering;

use anyhow::{ensure, Context, Result};

use crate::core::geometry::BBox;
use crate::core::model::{Detection, MergedText};
use crate::merge::direction::{classify_detection, classify_direction};

/// Wraps one detection as an unmerged unit.
pub fn single_unit(detection: &Detection) -> MergedText<'_> {
    MergedText {
        text: detection.text.clone(),
        bbox: detection.bbox,
        direction: classify_detection(detection),
        original_box_count: 1,
        original_detections: vec![detection],
    }
}

/// Builds a merged unit from its constituents, in reading order.
pub fn build_unit<'a>(text: String, detections: Vec<&'a Detection>) -> Result<MergedText<'a>> {
    let bbox = BBox::union_all(detections.iter().map(|det| &det.bbox))
        .context("cannot build a merged unit from zero detections")?;
    Ok(MergedText {
        text,
        bbox,
        direction: classify_direction(&detections),
        original_box_count: detections.len(),
        original_detections: detections,
    })
}

/// Returns the row ordered left to right, ties in their incoming order.
pub fn sort_by_left<'a>(row: &[&'a Detection]) -> Vec<&'a Detection> {
    let mut sorted = row.to_vec();
    sorted.sort_by(|a, b| {
        a.bbox
            .left
            .partial_cmp(&b.bbox.left)
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

/// Gaps between consecutive boxes of a row already sorted by `left`.
pub fn row_gaps(sorted: &[&Detection]) -> Vec<f32> {
    sorted
        .windows(2)
        .map(|pair| pair[0].bbox.horizontal_gap_to(&pair[1].bbox))
        .collect()
}

/// Merges a whole row into one unit using a width-derived gap threshold.
///
/// Gaps up to `mean_width * tolerance_factor` join directly; wider gaps get a
/// single space.
pub fn merge_row_fixed<'a>(row: &[&'a Detection], tolerance_factor: f32) -> Result<MergedText<'a>> {
    ensure!(!row.is_empty(), "cannot merge an empty row");

    let sorted = sort_by_left(row);
    if sorted.len() == 1 {
        return Ok(single_unit(sorted[0]));
    }

    let threshold = fixed_gap_threshold(&sorted, tolerance_factor);
    let gaps = row_gaps(&sorted);

    let mut text = sorted[0].text.clone();
    for (det, gap) in sorted[1..].iter().zip(gaps) {
        if gap > threshold {
            text.push(' ');
        }
        text.push_str(&det.text);
    }

    build_unit(text, sorted)
}

/// `mean_width * tolerance_factor`, the mean clamped to at least one pixel.
pub fn fixed_gap_threshold(row: &[&Detection], tolerance_factor: f32) -> f32 {
    if row.is_empty() {
        return tolerance_factor;
    }
    let mean_width = row.iter().map(|det| det.bbox.width()).sum::<f32>() / row.len() as f32;
    mean_width.max(1.0) * tolerance_factor
}
