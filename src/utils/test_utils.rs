use nalgebra::Vector3;
use std::collections::BTreeMap;

use crate::io::centerline::Centerline;

/// Region labels shared by the synthetic centerlines; `PMJ` is never detected.
pub const TEST_REGIONS: [&str; 4] = ["PMJ", "C2", "C5", "T1"];

pub fn landmarks(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
    pairs
        .iter()
        .map(|(label, index)| (label.to_string(), *index))
        .collect()
}

/// Straight centerline along z with `n` samples `spacing` apart.
///
/// Landmarks: `C2` at the top sample, `C5` half way, `T1` at sample 0.
pub fn straight_centerline(n: usize, spacing: f64) -> Centerline {
    let points = (0..n)
        .map(|i| Vector3::new(0.0, 0.0, i as f64 * spacing))
        .collect();
    let derivatives = vec![Vector3::new(0.0, 0.0, spacing); n];
    Centerline::from_points(
        points,
        derivatives,
        landmarks(&[("C2", n - 1), ("C5", n / 2), ("T1", 0)]),
        TEST_REGIONS.iter().map(|s| s.to_string()).collect(),
    )
    .expect("synthetic centerline is valid")
}

/// Centerline whose sample spacing follows `steps`; `steps[i]` is the distance
/// between sample `i` and `i + 1`. Landmarks: `C2` at the top, `T1` at sample 0.
pub fn uneven_centerline(steps: &[f64]) -> Centerline {
    let mut z = 0.0;
    let mut points = vec![Vector3::new(0.0, 0.0, 0.0)];
    for step in steps {
        z += step;
        points.push(Vector3::new(0.0, 0.0, z));
    }
    let n = points.len();
    let derivatives = vec![Vector3::new(0.0, 0.0, 1.0); n];
    Centerline::from_points(
        points,
        derivatives,
        landmarks(&[("C2", n - 1), ("T1", 0)]),
        TEST_REGIONS.iter().map(|s| s.to_string()).collect(),
    )
    .expect("synthetic centerline is valid")
}
