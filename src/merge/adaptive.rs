//! Per-row gap clustering with an Otsu threshold.
//!
//! A fixed width-derived tolerance cannot tell letter spacing from word spacing
//! across fonts and scales. Here the row's own gap distribution is split in two
//! by maximizing between-class variance over a 256-bin histogram; gaps in the
//! upper class are word boundaries and start a new merged unit.

use anyhow::{ensure, Context, Result};
use tracing::{debug, trace};

use crate::core::model::{Detection, MergedText};
use crate::merge::row_merge::{build_unit, row_gaps, sort_by_left};

/// Rows shorter than this always use the fixed-tolerance merger.
pub const MIN_ADAPTIVE_ROW_LEN: usize = 3;

const HISTOGRAM_BINS: usize = 256;

/// Gap spread (max - min, in pixels) below which the distribution has nothing to separate.
const MIN_GAP_SPREAD: f32 = 1.0;

/// Otsu split point over a set of gaps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapThreshold {
    min: f32,
    range: f32,
    bin: usize,
}

impl GapThreshold {
    /// Absolute gap value at the upper edge of the selected bin.
    pub fn value(&self) -> f32 {
        self.min + (self.bin + 1) as f32 * self.range / HISTOGRAM_BINS as f32
    }

    /// Whether `gap` falls in the upper (word boundary) class.
    pub fn splits(&self, gap: f32) -> bool {
        bin_of(gap, self.min, self.range) > self.bin
    }
}

/// Runs Otsu's method over `gaps`.
///
/// Returns `None` when the gaps are too uniform to separate.
pub fn otsu_gap_threshold(gaps: &[f32]) -> Result<Option<GapThreshold>> {
    ensure!(!gaps.is_empty(), "no gaps to threshold");
    ensure!(
        gaps.iter().all(|gap| gap.is_finite()),
        "non-finite gap in {gaps:?}"
    );

    let min = gaps.iter().copied().fold(f32::INFINITY, f32::min);
    let max = gaps.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if range < MIN_GAP_SPREAD {
        return Ok(None);
    }

    let mut histogram = [0u32; HISTOGRAM_BINS];
    for &gap in gaps {
        histogram[bin_of(gap, min, range)] += 1;
    }

    let bin = otsu_bin(&histogram)
        .with_context(|| format!("gap histogram has no separating bin: {gaps:?}"))?;
    Ok(Some(GapThreshold { min, range, bin }))
}

fn bin_of(gap: f32, min: f32, range: f32) -> usize {
    let scaled = ((gap - min) / range * HISTOGRAM_BINS as f32).max(0.0);
    (scaled as usize).min(HISTOGRAM_BINS - 1)
}

/// Bin maximizing between-class variance; the first maximum wins.
fn otsu_bin(histogram: &[u32; HISTOGRAM_BINS]) -> Option<usize> {
    let total: f64 = histogram.iter().map(|&count| count as f64).sum();
    let sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_b = 0.0;
    let mut w_b = 0.0;
    let mut max_variance = 0.0;
    let mut threshold = None;

    for (t, &count) in histogram.iter().enumerate() {
        w_b += count as f64;
        if w_b == 0.0 {
            continue;
        }

        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }

        sum_b += t as f64 * count as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum - sum_b) / w_f;

        let variance = w_b * w_f * (m_b - m_f).powi(2);
        if variance > max_variance {
            max_variance = variance;
            threshold = Some(t);
        }
    }

    threshold
}

/// Splits a row into runs at gaps above the row's Otsu threshold.
///
/// Boxes within a run are joined without a separator. Returns `None` when the
/// row's gaps are too uniform, leaving the caller to use the fixed merger.
pub fn merge_row_adaptive<'a>(row: &[&'a Detection]) -> Result<Option<Vec<MergedText<'a>>>> {
    ensure!(
        row.len() >= 2,
        "adaptive merge needs at least two boxes, got {}",
        row.len()
    );

    let sorted = sort_by_left(row);
    let gaps = row_gaps(&sorted);
    let Some(threshold) = otsu_gap_threshold(&gaps)? else {
        debug!(boxes = sorted.len(), "row gaps too uniform for adaptive split");
        return Ok(None);
    };

    let mut units = Vec::new();
    let mut run = vec![sorted[0]];
    let mut text = sorted[0].text.clone();
    for (det, gap) in sorted[1..].iter().copied().zip(gaps) {
        if threshold.splits(gap) {
            units.push(build_unit(std::mem::take(&mut text), std::mem::take(&mut run))?);
        }
        run.push(det);
        text.push_str(&det.text);
    }
    units.push(build_unit(text, run)?);

    trace!(
        boxes = sorted.len(),
        threshold = threshold.value(),
        runs = units.len(),
        "adaptive row split"
    );
    Ok(Some(units))
}
