//! Assertions over tailoring results

use codegraph_tailor::{PointId, TailoringResult};

/// Assert the kept statements, in method then body order
pub fn assert_kept(result: &TailoringResult, expected: &[PointId]) {
    let kept: Vec<PointId> = result.points().collect();
    assert_eq!(kept, expected, "unexpected tailored statements");
}

pub fn assert_not_kept(result: &TailoringResult, points: &[PointId]) {
    for &p in points {
        assert!(!result.contains(p), "{p} should have been tailored away");
    }
}
