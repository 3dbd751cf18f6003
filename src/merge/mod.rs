pub mod adaptive;
pub mod direction;
pub mod fragment;
pub mod line_cluster;
pub mod row_merge;

use std::cmp::Ordering;

use anyhow::{ensure, Context, Result};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::core::config::MergingConfig;
use crate::core::error::MergeStage;
use crate::core::geometry::BBox;
use crate::core::model::{Detection, MergedText};
use crate::core::stats::{MergeStats, MergeStatsCollector};

use adaptive::MIN_ADAPTIVE_ROW_LEN;
use row_merge::single_unit;

/// Merged units of one call together with its statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome<'a> {
    pub results: Vec<MergedText<'a>>,
    pub stats: MergeStats,
}

/// Stateless entry point for merging raw detections.
///
/// Never fails: when any internal stage faults, every input detection is
/// returned as its own unit instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetectionMerger;

impl DetectionMerger {
    pub fn new() -> Self {
        Self
    }

    pub fn merge<'a>(
        &self,
        detections: &'a [Detection],
        config: &MergingConfig,
    ) -> Vec<MergedText<'a>> {
        self.merge_with_stats(detections, config).results
    }

    pub fn merge_with_stats<'a>(
        &self,
        detections: &'a [Detection],
        config: &MergingConfig,
    ) -> MergeOutcome<'a> {
        merge_with_stages(detections, config, &Stages::default())
    }
}

pub fn merge<'a>(detections: &'a [Detection], config: &MergingConfig) -> Vec<MergedText<'a>> {
    DetectionMerger.merge(detections, config)
}

pub fn merge_with_stats<'a>(detections: &'a [Detection], config: &MergingConfig) -> MergeOutcome<'a> {
    DetectionMerger.merge_with_stats(detections, config)
}

type ClusterFn = for<'a> fn(&[&'a Detection], f32) -> Result<Vec<Vec<&'a Detection>>>;

/// Replaceable pipeline steps; tests swap in faulty ones.
#[derive(Clone, Copy)]
struct Stages {
    cluster: ClusterFn,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            cluster: line_cluster::cluster_rows,
        }
    }
}

fn merge_with_stages<'a>(
    detections: &'a [Detection],
    config: &MergingConfig,
    stages: &Stages,
) -> MergeOutcome<'a> {
    let mut collector = MergeStatsCollector::start();

    let (results, fell_back) = match detections {
        [] => {
            debug!("no detections to merge");
            (Vec::new(), false)
        }
        [only] => {
            debug!("single detection, skipping clustering");
            (vec![single_unit(only)], false)
        }
        _ => match run_pipeline(detections, config, stages, &mut collector) {
            Ok(results) => (results, false),
            Err(err) => {
                let stage = err.downcast_ref::<MergeStage>().copied();
                warn!(
                    input = detections.len(),
                    ?config,
                    ?stage,
                    "merge failed, returning detections unmerged: {err:#}"
                );
                collector.reset_counters();
                (unmerged(detections), true)
            }
        },
    };

    let stats = collector.finish(detections, &results, fell_back);
    debug!(
        original = stats.original_count,
        merged = stats.merged_count,
        rows = stats.row_count,
        adaptive_rows = stats.adaptive_rows,
        fragment_merges = stats.fragment_merges,
        fell_back = stats.fell_back,
        elapsed_us = stats.elapsed.as_micros() as u64,
        "merged detections"
    );

    MergeOutcome { results, stats }
}

fn unmerged(detections: &[Detection]) -> Vec<MergedText<'_>> {
    detections.iter().map(single_unit).collect()
}

fn run_pipeline<'a>(
    detections: &'a [Detection],
    config: &MergingConfig,
    stages: &Stages,
    collector: &mut MergeStatsCollector,
) -> Result<Vec<MergedText<'a>>> {
    let refs: Vec<&'a Detection> = detections.iter().collect();
    let rows = (stages.cluster)(&refs, config.y_tolerance()).context(MergeStage::Clustering)?;
    collector.record_rows(rows.len());

    let mut units = Vec::with_capacity(rows.len());
    for row in &rows {
        if config.enable_smart_clustering() && row.len() >= MIN_ADAPTIVE_ROW_LEN {
            if let Some(runs) =
                adaptive::merge_row_adaptive(row).context(MergeStage::AdaptiveThreshold)?
            {
                collector.record_adaptive_row();
                units.extend(runs);
                continue;
            }
        }
        trace!(boxes = row.len(), "fixed-tolerance row merge");
        units.push(
            row_merge::merge_row_fixed(row, config.x_tolerance_factor())
                .context(MergeStage::RowMerge)?,
        );
    }

    if config.enable_second_pass() {
        let before = units.len();
        units = fragment::reconcile_fragments(units, config.fragment_text_threshold())
            .context(MergeStage::FragmentReconcile)?;
        collector.record_fragment_merges(before - units.len());
    }

    units.sort_by(|a, b| {
        a.bbox
            .top
            .partial_cmp(&b.bbox.top)
            .unwrap_or(Ordering::Equal)
    });

    validate_units(&units, detections.len()).context(MergeStage::Validation)?;
    Ok(units)
}

/// Checks box exactness and that every detection landed in exactly one unit.
fn validate_units(units: &[MergedText<'_>], expected_detections: usize) -> Result<()> {
    let mut seen = 0;
    for (idx, unit) in units.iter().enumerate() {
        ensure!(
            unit.original_box_count == unit.original_detections.len(),
            "unit #{idx} counts {} boxes but holds {}",
            unit.original_box_count,
            unit.original_detections.len()
        );
        let union = BBox::union_all(unit.original_detections.iter().map(|det| &det.bbox));
        ensure!(
            union == Some(unit.bbox),
            "unit #{idx} box {:?} differs from constituent union {union:?}",
            unit.bbox
        );
        seen += unit.original_box_count;
    }
    ensure!(
        seen == expected_detections,
        "units cover {seen} detections, expected {expected_detections}"
    );
    Ok(())
}
