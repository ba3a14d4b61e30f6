use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SliceSelectError};
use crate::frame::Orientation;

// absolute tolerance [mm] when checking cached arc lengths against each other
const LENGTH_TOLERANCE: f64 = 1e-6;

/// Ordered polyline along the medial axis of a structure, with arc-length metrics and
/// the sample index of every detected landmark.
///
/// Points are physical coordinates [mm] expressed in `orientation` (the working
/// orientation of the upstream extraction, `RPI` unless stated otherwise). Derivatives
/// are taken with respect to the sample index and are neither normalized nor scaled.
///
/// Indices increase along one fixed traversal direction; the slice selector walks
/// downward from the upper landmark to the lower one.
#[derive(Debug, Clone, PartialEq)]
pub struct Centerline {
    points: Vec<Vector3<f64>>,
    derivatives: Vec<Vector3<f64>>,
    progressive_length: Vec<f64>,
    incremental_length: Vec<f64>,
    index_disc: BTreeMap<String, usize>,
    regions_labels: Vec<String>,
    orientation: Orientation,
}

/// Persisted form of a [`Centerline`], with every precomputed field spelled out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterlineCache {
    pub points: Vec<[f64; 3]>,
    pub derivatives: Vec<[f64; 3]>,
    pub progressive_length: Vec<f64>,
    pub incremental_length: Vec<f64>,
    pub index_disc: BTreeMap<String, usize>,
    pub regions_labels: Vec<String>,
    #[serde(default)]
    pub orientation: Orientation,
}

impl Centerline {
    /// Builds a centerline from raw samples, deriving both arc-length tables from the
    /// Euclidean distance between consecutive points.
    pub fn from_points(
        points: Vec<Vector3<f64>>,
        derivatives: Vec<Vector3<f64>>,
        index_disc: BTreeMap<String, usize>,
        regions_labels: Vec<String>,
    ) -> Result<Self> {
        let mut progressive_length = Vec::with_capacity(points.len());
        let mut incremental_length = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            let step = if i == 0 { 0.0 } else { (p - points[i - 1]).norm() };
            total += step;
            progressive_length.push(step);
            incremental_length.push(total);
        }

        let centerline = Centerline {
            points,
            derivatives,
            progressive_length,
            incremental_length,
            index_disc,
            regions_labels,
            orientation: Orientation::RPI,
        };
        centerline.validate()?;
        Ok(centerline)
    }

    /// Adopts precomputed arc lengths (e.g. from the extraction toolchain), checking
    /// them against each other before accepting them.
    pub fn from_cache(cache: CenterlineCache) -> Result<Self> {
        let to_vec = |v: Vec<[f64; 3]>| v.into_iter().map(Vector3::from).collect::<Vec<_>>();
        let centerline = Centerline {
            points: to_vec(cache.points),
            derivatives: to_vec(cache.derivatives),
            progressive_length: cache.progressive_length,
            incremental_length: cache.incremental_length,
            index_disc: cache.index_disc,
            regions_labels: cache.regions_labels,
            orientation: cache.orientation,
        };
        centerline.validate()?;
        Ok(centerline)
    }

    pub fn to_cache(&self) -> CenterlineCache {
        let to_arr = |v: &[Vector3<f64>]| v.iter().map(|p| [p.x, p.y, p.z]).collect::<Vec<_>>();
        CenterlineCache {
            points: to_arr(&self.points),
            derivatives: to_arr(&self.derivatives),
            progressive_length: self.progressive_length.clone(),
            incremental_length: self.incremental_length.clone(),
            index_disc: self.index_disc.clone(),
            regions_labels: self.regions_labels.clone(),
            orientation: self.orientation,
        }
    }

    pub fn load_cache<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let cache: CenterlineCache =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                SliceSelectError::InconsistentCenterline(format!(
                    "failed to parse centerline cache {:?}: {}",
                    path.as_ref(),
                    e
                ))
            })?;
        Self::from_cache(cache)
    }

    pub fn save_cache<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &self.to_cache())
            .map_err(|e| SliceSelectError::Io(e.into()))?;
        writer.flush()?;
        Ok(())
    }

    /// Declares the orientation the points and derivatives are expressed in.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    fn validate(&self) -> Result<()> {
        let inconsistent = |msg: String| Err(SliceSelectError::InconsistentCenterline(msg));
        let n = self.points.len();

        if n == 0 {
            return inconsistent("centerline has no samples".into());
        }
        if self.derivatives.len() != n
            || self.progressive_length.len() != n
            || self.incremental_length.len() != n
        {
            return inconsistent(format!(
                "field lengths differ: {} points, {} derivatives, {} progressive, {} incremental",
                n,
                self.derivatives.len(),
                self.progressive_length.len(),
                self.incremental_length.len()
            ));
        }
        if let Some(i) = self
            .points
            .iter()
            .chain(&self.derivatives)
            .position(|v| !v.iter().all(|c| c.is_finite()))
        {
            return inconsistent(format!("non-finite coordinate in entry {}", i % n));
        }

        if self.progressive_length[0].abs() > LENGTH_TOLERANCE
            || self.incremental_length[0].abs() > LENGTH_TOLERANCE
        {
            return inconsistent("arc lengths must start at 0 for sample 0".into());
        }
        for i in 1..n {
            let step = self.progressive_length[i];
            if !step.is_finite() || step < 0.0 {
                return inconsistent(format!("invalid progressive length {} at {}", step, i));
            }
            let delta = self.incremental_length[i] - self.incremental_length[i - 1];
            if !delta.is_finite() || delta < 0.0 {
                return inconsistent(format!(
                    "incremental length decreases from {} to {} at {}",
                    self.incremental_length[i - 1],
                    self.incremental_length[i],
                    i
                ));
            }
            if (delta - step).abs() > LENGTH_TOLERANCE {
                return inconsistent(format!(
                    "incremental length step {} does not match progressive length {} at {}",
                    delta, step, i
                ));
            }
        }

        for (label, &index) in &self.index_disc {
            if index >= n {
                return inconsistent(format!(
                    "landmark {} points at sample {} beyond {} samples",
                    label, index, n
                ));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    pub fn derivatives(&self) -> &[Vector3<f64>] {
        &self.derivatives
    }

    pub fn progressive_length(&self) -> &[f64] {
        &self.progressive_length
    }

    pub fn incremental_length(&self) -> &[f64] {
        &self.incremental_length
    }

    pub fn index_disc(&self) -> &BTreeMap<String, usize> {
        &self.index_disc
    }

    pub fn regions_labels(&self) -> &[String] {
        &self.regions_labels
    }

    /// Total arc length from the first to the last sample.
    pub fn length(&self) -> f64 {
        self.incremental_length.last().copied().unwrap_or(0.0)
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(SliceSelectError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    pub fn point(&self, index: usize) -> Result<&Vector3<f64>> {
        self.check_index(index)?;
        Ok(&self.points[index])
    }

    pub fn derivative(&self, index: usize) -> Result<&Vector3<f64>> {
        self.check_index(index)?;
        Ok(&self.derivatives[index])
    }

    pub fn landmark_index(&self, label: &str) -> Result<usize> {
        self.index_disc
            .get(label)
            .copied()
            .ok_or_else(|| SliceSelectError::UnknownLandmark(format!("label {:?}", label)))
    }

    pub fn region_label(&self, region: usize) -> Result<&str> {
        self.regions_labels
            .get(region)
            .map(String::as_str)
            .ok_or_else(|| SliceSelectError::UnknownLandmark(format!("region number {}", region)))
    }

    /// Resolves a region number to the sample index of its landmark.
    pub fn region_index(&self, region: usize) -> Result<usize> {
        self.landmark_index(self.region_label(region)?)
    }
}

#[cfg(test)]
mod centerline_tests {
    use super::*;
    use crate::utils::test_utils::{landmarks, straight_centerline};
    use approx::assert_relative_eq;

    fn helix(n: usize) -> Centerline {
        let points: Vec<_> = (0..n)
            .map(|i| {
                let t = i as f64 * 0.2;
                Vector3::new(5.0 * t.cos(), 5.0 * t.sin(), 0.7 * i as f64)
            })
            .collect();
        let derivatives = vec![Vector3::new(0.0, 0.0, 1.0); n];
        Centerline::from_points(points, derivatives, landmarks(&[("C2", n - 1), ("T1", 0)]), vec![])
            .unwrap()
    }

    #[test]
    fn test_straight_lengths() {
        let cl = straight_centerline(11, 1.0);
        assert_eq!(cl.len(), 11);
        assert_eq!(cl.progressive_length()[0], 0.0);
        assert_relative_eq!(cl.length(), 10.0);
        for i in 1..cl.len() {
            assert_relative_eq!(cl.progressive_length()[i], 1.0);
            assert_relative_eq!(cl.incremental_length()[i], i as f64);
        }
    }

    #[test]
    fn test_arc_length_monotonic_on_curved_line() {
        let cl = helix(60);
        let inc = cl.incremental_length();
        let prog = cl.progressive_length();
        for i in 1..cl.len() {
            assert!(inc[i] >= inc[i - 1]);
            assert_relative_eq!(inc[i] - inc[i - 1], prog[i], epsilon = 1e-9);
        }
        assert_eq!(cl.landmark_index("C2").unwrap(), 59);
    }

    #[test]
    fn test_region_lookup() {
        let cl = straight_centerline(11, 1.0);
        assert_eq!(cl.region_label(1).unwrap(), "C2");
        assert_eq!(cl.region_index(1).unwrap(), 10);
        assert_eq!(cl.region_index(3).unwrap(), 0);
        assert!(matches!(
            cl.region_index(42),
            Err(SliceSelectError::UnknownLandmark(_))
        ));
        // label listed in regions but never detected on this centerline
        assert!(matches!(
            cl.region_index(0),
            Err(SliceSelectError::UnknownLandmark(_))
        ));
    }

    #[test]
    fn test_rejects_mismatched_fields() {
        let points = vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0)];
        let derivatives = vec![Vector3::zeros()];
        let err = Centerline::from_points(points, derivatives, BTreeMap::new(), vec![]);
        assert!(matches!(
            err,
            Err(SliceSelectError::InconsistentCenterline(_))
        ));
    }

    #[test]
    fn test_rejects_landmark_out_of_range() {
        let points = vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0)];
        let derivatives = points.clone();
        let err = Centerline::from_points(points, derivatives, landmarks(&[("C3", 2)]), vec![]);
        assert!(matches!(
            err,
            Err(SliceSelectError::InconsistentCenterline(_))
        ));
    }

    #[test]
    fn test_cache_rejects_inconsistent_lengths() {
        let mut cache = straight_centerline(5, 1.0).to_cache();
        cache.incremental_length[3] += 0.5;
        assert!(matches!(
            Centerline::from_cache(cache),
            Err(SliceSelectError::InconsistentCenterline(_))
        ));
    }

    #[test]
    fn test_cache_rejects_decreasing_incremental_length() {
        // the step is within tolerance of the zero progressive length, but goes backwards
        let cache = CenterlineCache {
            points: vec![[0.0, 0.0, 0.0]; 2],
            derivatives: vec![[0.0, 0.0, 1.0]; 2],
            progressive_length: vec![0.0, 0.0],
            incremental_length: vec![0.0, -9e-7],
            index_disc: landmarks(&[("C2", 1), ("T1", 0)]),
            regions_labels: vec![],
            orientation: Orientation::RPI,
        };
        assert!(matches!(
            Centerline::from_cache(cache),
            Err(SliceSelectError::InconsistentCenterline(_))
        ));
    }

    #[test]
    fn test_cache_file_round_trip() {
        let cl = helix(25).with_orientation(Orientation::LPS);
        let path = std::env::temp_dir().join(format!(
            "sliceselectrs_cache_{}.json",
            std::process::id()
        ));
        cl.save_cache(&path).unwrap();
        let loaded = Centerline::load_cache(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, cl);
        assert_eq!(loaded.orientation(), Orientation::LPS);
    }

    #[test]
    fn test_point_access_checks_bounds() {
        let cl = straight_centerline(3, 2.0);
        assert_eq!(cl.point(2).unwrap(), &Vector3::new(0.0, 0.0, 4.0));
        assert!(matches!(
            cl.derivative(3),
            Err(SliceSelectError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }
}
