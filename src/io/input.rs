use csv::ReaderBuilder;
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, SliceSelectError};
use crate::io::centerline::Centerline;

/// Utility: detect whether the file uses comma or tab as delimiter.
fn detect_delimiter<P: AsRef<Path>>(path: P) -> Result<u8> {
    let file = File::open(&path)?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    reader.read_line(&mut first_line)?;

    let tabs = first_line.matches('\t').count();
    let commas = first_line.matches(',').count();

    if tabs > commas {
        Ok(b'\t')
    } else {
        // default to comma
        Ok(b',')
    }
}

/// One row of a centerline sample table:
///
/// ```text
/// x, y, z, dx, dy, dz
/// ```
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CenterlineSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LandmarkRecord {
    pub label: String,
    pub index: usize,
}

/// Reads the header-less sample table, one row per centerline sample.
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<Vec<CenterlineSample>> {
    let delim = detect_delimiter(&path)?;
    let file = File::open(&path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delim)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut samples = Vec::new();
    for result in rdr.deserialize() {
        let sample: CenterlineSample = result?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Reads a `label,index` table (with header) mapping landmark labels to sample indices.
pub fn read_landmarks<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, usize>> {
    let delim = detect_delimiter(&path)?;
    let file = File::open(&path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delim)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut landmarks = BTreeMap::new();
    for result in rdr.deserialize() {
        let record: LandmarkRecord = result?;
        if let Some(previous) = landmarks.insert(record.label.clone(), record.index) {
            return Err(SliceSelectError::InconsistentCenterline(format!(
                "landmark {} listed twice (samples {} and {}) in {:?}",
                record.label,
                previous,
                record.index,
                path.as_ref()
            )));
        }
    }
    Ok(landmarks)
}

/// Builds a [`Centerline`] from a sample table and a landmark table; arc lengths are
/// computed from the sample positions.
pub fn read_centerline_csv<P: AsRef<Path>, Q: AsRef<Path>>(
    samples_path: P,
    landmarks_path: Q,
    regions_labels: Vec<String>,
) -> Result<Centerline> {
    let samples = read_samples(&samples_path)?;
    let landmarks = read_landmarks(&landmarks_path)?;

    let points = samples
        .iter()
        .map(|s| Vector3::new(s.x, s.y, s.z))
        .collect();
    let derivatives = samples
        .iter()
        .map(|s| Vector3::new(s.dx, s.dy, s.dz))
        .collect();

    log::debug!(
        "read {} centerline samples and {} landmarks from {:?}",
        samples.len(),
        landmarks.len(),
        samples_path.as_ref()
    );
    Centerline::from_points(points, derivatives, landmarks, regions_labels)
}
