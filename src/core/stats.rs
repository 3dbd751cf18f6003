use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core::model::{Detection, MergedText};

/// Observational summary of one merge call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MergeStats {
    pub original_count: usize,
    pub merged_count: usize,
    /// `merged_count / original_count`, 1.0 for empty input.
    pub compression_ratio: f32,
    pub average_confidence: f32,
    pub row_count: usize,
    pub adaptive_rows: usize,
    pub fragment_merges: usize,
    pub fell_back: bool,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct MergeStatsCollector {
    started: Instant,
    row_count: usize,
    adaptive_rows: usize,
    fragment_merges: usize,
}

impl MergeStatsCollector {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            row_count: 0,
            adaptive_rows: 0,
            fragment_merges: 0,
        }
    }

    pub fn record_rows(&mut self, rows: usize) {
        self.row_count += rows;
    }

    pub fn record_adaptive_row(&mut self) {
        self.adaptive_rows += 1;
    }

    pub fn record_fragment_merges(&mut self, merges: usize) {
        self.fragment_merges += merges;
    }

    /// Drops counters gathered by a pipeline run whose output was discarded.
    pub fn reset_counters(&mut self) {
        self.row_count = 0;
        self.adaptive_rows = 0;
        self.fragment_merges = 0;
    }

    pub fn finish(
        self,
        detections: &[Detection],
        results: &[MergedText<'_>],
        fell_back: bool,
    ) -> MergeStats {
        let original_count = detections.len();
        let merged_count = results.len();
        let compression_ratio = if original_count == 0 {
            1.0
        } else {
            merged_count as f32 / original_count as f32
        };
        let average_confidence = if original_count == 0 {
            0.0
        } else {
            detections.iter().map(|det| det.confidence).sum::<f32>() / original_count as f32
        };

        MergeStats {
            original_count,
            merged_count,
            compression_ratio,
            average_confidence,
            row_count: self.row_count,
            adaptive_rows: self.adaptive_rows,
            fragment_merges: self.fragment_merges,
            fell_back,
            elapsed: self.started.elapsed(),
        }
    }
}
