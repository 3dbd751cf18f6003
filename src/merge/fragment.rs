use std::cmp::Ordering;

use anyhow::{ensure, Result};

use crate::core::model::MergedText;
use crate::merge::direction::classify_direction;

const FRAGMENT_HEIGHT_FACTOR: f32 = 1.2;
const FRAGMENT_WIDTH_FACTOR: f32 = 1.5;
const MIN_VERTICAL_OVERLAP: f32 = 0.5;
const MAX_GAP_WIDTH_FACTOR: f32 = 0.5;
const TIGHT_GAP_WIDTH_FACTOR: f32 = 0.2;

/// Mean extents of the whole first-pass output, fixed for the duration of a pass.
#[derive(Debug, Clone, Copy)]
struct FragmentMetrics {
    avg_width: f32,
    avg_height: f32,
    text_threshold: usize,
}

impl FragmentMetrics {
    fn measure(units: &[MergedText<'_>], text_threshold: usize) -> Self {
        let count = units.len().max(1) as f32;
        Self {
            avg_width: units.iter().map(|u| u.bbox.width()).sum::<f32>() / count,
            avg_height: units.iter().map(|u| u.bbox.height()).sum::<f32>() / count,
            text_threshold,
        }
    }

    fn is_fragment(&self, unit: &MergedText<'_>) -> bool {
        unit.text.chars().count() <= self.text_threshold
            && unit.bbox.height() < self.avg_height * FRAGMENT_HEIGHT_FACTOR
            && unit.bbox.width() < self.avg_width * FRAGMENT_WIDTH_FACTOR
    }
}

/// Chains short, adjacent first-pass units that per-row merging left apart.
///
/// Units are walked top to bottom; each one either joins the running
/// accumulator or flushes it. A chain may absorb any number of fragments.
pub fn reconcile_fragments<'a>(
    units: Vec<MergedText<'a>>,
    fragment_text_threshold: usize,
) -> Result<Vec<MergedText<'a>>> {
    if units.len() < 2 {
        return Ok(units);
    }

    let metrics = FragmentMetrics::measure(&units, fragment_text_threshold);
    ensure!(
        metrics.avg_width.is_finite() && metrics.avg_height.is_finite(),
        "first-pass units have non-finite extents: {metrics:?}"
    );

    let mut sorted = units;
    sorted.sort_by(|a, b| {
        a.bbox
            .top
            .partial_cmp(&b.bbox.top)
            .unwrap_or(Ordering::Equal)
    });

    let mut output = Vec::with_capacity(sorted.len());
    let mut pending = sorted.into_iter();
    let Some(mut acc) = pending.next() else {
        return Ok(output);
    };

    for next in pending {
        let x_gap = acc.bbox.horizontal_gap_to(&next.bbox);
        if should_chain(&metrics, &acc, &next, x_gap) {
            acc = chain(acc, next, x_gap < metrics.avg_width * TIGHT_GAP_WIDTH_FACTOR);
        } else {
            output.push(std::mem::replace(&mut acc, next));
        }
    }
    output.push(acc);

    Ok(output)
}

fn should_chain(
    metrics: &FragmentMetrics,
    acc: &MergedText<'_>,
    next: &MergedText<'_>,
    x_gap: f32,
) -> bool {
    vertical_overlap_ratio(acc, next) > MIN_VERTICAL_OVERLAP
        && x_gap < metrics.avg_width * MAX_GAP_WIDTH_FACTOR
        && (metrics.is_fragment(acc) || metrics.is_fragment(next))
}

/// Shared vertical extent relative to the shorter of the two boxes.
fn vertical_overlap_ratio(a: &MergedText<'_>, b: &MergedText<'_>) -> f32 {
    let shorter = a.bbox.height().min(b.bbox.height());
    if shorter <= 0.0 {
        return 0.0;
    }
    a.bbox.vertical_overlap(&b.bbox) / shorter
}

fn chain<'a>(mut acc: MergedText<'a>, next: MergedText<'a>, tight: bool) -> MergedText<'a> {
    if !tight {
        acc.text.push(' ');
    }
    acc.text.push_str(&next.text);
    acc.bbox = acc.bbox.union(&next.bbox);
    acc.original_box_count += next.original_box_count;
    acc.original_detections.extend(next.original_detections);
    acc.direction = classify_direction(&acc.original_detections);
    acc
}
