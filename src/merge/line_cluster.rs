use std::cmp::Ordering;

use anyhow::{ensure, Result};

use crate::core::model::Detection;

/// Groups detections into rows by the vertical distance between their tops.
///
/// Rows come back ordered top to bottom. A detection joins the current row when
/// its top lies within `mean_height * tolerance` of the top of the detection
/// most recently added to that row.
pub fn cluster_rows<'a>(
    detections: &[&'a Detection],
    tolerance: f32,
) -> Result<Vec<Vec<&'a Detection>>> {
    ensure!(!detections.is_empty(), "cannot cluster an empty detection set");
    ensure!(
        tolerance.is_finite() && tolerance > 0.0,
        "row tolerance must be positive, got {tolerance}"
    );
    for (idx, det) in detections.iter().enumerate() {
        ensure!(
            det.bbox.is_finite(),
            "detection #{idx} ({:?}) has non-finite geometry {:?}",
            det.text,
            det.bbox
        );
    }

    let mean_height =
        detections.iter().map(|det| det.bbox.height()).sum::<f32>() / detections.len() as f32;
    let threshold = mean_height.max(1.0) * tolerance;

    let mut sorted = detections.to_vec();
    sorted.sort_by(|a, b| {
        a.bbox
            .top
            .partial_cmp(&b.bbox.top)
            .unwrap_or(Ordering::Equal)
    });

    let mut rows: Vec<Vec<&'a Detection>> = Vec::new();
    let mut current: Vec<&'a Detection> = Vec::new();
    for det in sorted {
        if let Some(last) = current.last() {
            if (det.bbox.top - last.bbox.top).abs() > threshold {
                rows.push(std::mem::take(&mut current));
            }
        }
        current.push(det);
    }
    if !current.is_empty() {
        rows.push(current);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;

    fn det(text: &str, left: f32, top: f32) -> Detection {
        Detection::new(text, BBox::new(left, top, left + 20.0, top + 20.0), 0.9)
    }

    fn texts(row: &[&Detection]) -> Vec<String> {
        row.iter().map(|det| det.text.clone()).collect()
    }

    #[test]
    fn single_detection_is_one_row() {
        let a = det("a", 0.0, 0.0);
        let rows = cluster_rows(&[&a], 0.4).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(texts(&rows[0]), vec!["a"]);
    }

    #[test]
    fn splits_rows_beyond_threshold() {
        // mean height 20, threshold 8
        let a = det("a", 0.0, 100.0);
        let b = det("b", 30.0, 105.0);
        let c = det("c", 0.0, 140.0);
        let d = det("d", 30.0, 10.0);
        let rows = cluster_rows(&[&a, &b, &c, &d], 0.4).unwrap();
        let rows: Vec<Vec<String>> = rows.iter().map(|r| texts(r)).collect();
        assert_eq!(rows, vec![vec!["d"], vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn compares_against_last_added_detection() {
        // Each step is 6px (under the 8px threshold) even though the ends are 12px apart.
        let a = det("a", 0.0, 100.0);
        let b = det("b", 30.0, 106.0);
        let c = det("c", 60.0, 112.0);
        let rows = cluster_rows(&[&c, &a, &b], 0.4).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(texts(&rows[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let a = det("first", 50.0, 100.0);
        let b = det("second", 0.0, 100.0);
        let rows = cluster_rows(&[&a, &b], 0.4).unwrap();
        assert_eq!(texts(&rows[0]), vec!["first", "second"]);
    }

    #[test]
    fn rejects_empty_and_non_finite_input() {
        assert!(cluster_rows(&[], 0.4).is_err());

        let bad = Detection::new("nan", BBox::new(0.0, f32::NAN, 10.0, 10.0), 0.5);
        let err = cluster_rows(&[&bad], 0.4).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }
}
