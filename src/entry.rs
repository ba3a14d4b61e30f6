use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::frame::{Orientation, VoxelSpacing};
use crate::io::output::{write_planes, write_report, PlaneKind};
use crate::io::Centerline;
use crate::processing::{build_planes, select_equidistant_slices, SlicePlanes, SliceSelection};

const REPORT_FILE_NAME: &str = "slice_select_info.txt";

fn default_true() -> bool {
    true
}

/// Parameters of one slice selection batch, usually read from a TOML file:
///
/// ```toml
/// upper_region = 2
/// lower_region = 5
/// n_slices = 7
/// orientation = "RPI"
/// output_dir = "derivatives/slice_select"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceSelectConfig {
    /// Region number of the upper boundary landmark.
    pub upper_region: usize,
    /// Region number of the lower boundary landmark.
    pub lower_region: usize,
    pub n_slices: usize,
    /// Orientation the plane descriptors are written in.
    #[serde(default)]
    pub orientation: Orientation,
    pub output_dir: PathBuf,
    #[serde(default = "default_true")]
    pub write_slice_planes: bool,
    #[serde(default = "default_true")]
    pub write_orthogonal_planes: bool,
}

impl SliceSelectConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse slice selection config")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    fn plane_kinds(&self) -> Vec<PlaneKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.write_slice_planes {
            kinds.push(PlaneKind::Slice);
        }
        if self.write_orthogonal_planes {
            kinds.push(PlaneKind::Orthogonal);
        }
        kinds
    }
}

/// One subject of a batch: its centerline and the voxel size of the image it was
/// extracted from.
#[derive(Debug, Clone)]
pub struct Subject {
    pub name: String,
    pub centerline: Centerline,
    pub spacing: VoxelSpacing,
}

#[derive(Debug, Clone)]
pub struct SubjectReport {
    pub subject: String,
    pub output_dir: PathBuf,
    pub selection: SliceSelection,
    pub planes: Vec<SlicePlanes>,
    pub files: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct SubjectOutcome {
    pub subject: String,
    pub result: Result<SubjectReport>,
}

/// Subject names become a directory under `output_dir`, so they must be a single
/// plain path component.
fn check_subject_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        bail!("Invalid subject name {:?}: must be a single directory name", name);
    }
    Ok(())
}

/// Selects slices for a single subject and writes its planes and report to
/// `<output_dir>/<subject>/<upper>_to_<lower>-<n>_slices/`.
pub fn process_subject(subject: &Subject, config: &SliceSelectConfig) -> Result<SubjectReport> {
    check_subject_name(&subject.name)?;
    let centerline = &subject.centerline;
    let upper_label = centerline
        .region_label(config.upper_region)
        .context("Failed to resolve upper boundary")?;
    let lower_label = centerline
        .region_label(config.lower_region)
        .context("Failed to resolve lower boundary")?;
    let upper = centerline
        .landmark_index(upper_label)
        .with_context(|| format!("Upper landmark {} not found", upper_label))?;
    let lower = centerline
        .landmark_index(lower_label)
        .with_context(|| format!("Lower landmark {} not found", lower_label))?;

    let selection = select_equidistant_slices(centerline, upper, lower, config.n_slices)
        .with_context(|| {
            format!(
                "slice selection between {} (sample {}) and {} (sample {}) failed",
                upper_label, upper, lower_label, lower
            )
        })?;
    let planes = build_planes(
        centerline,
        &selection.indices,
        &subject.spacing,
        config.orientation,
    )
    .context("Failed to build planes")?;

    let output_dir = config.output_dir.join(&subject.name).join(format!(
        "{}_to_{}-{}_slices",
        upper_label, lower_label, config.n_slices
    ));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Could not create output directory: {:?}", output_dir))?;

    write_report(output_dir.join(REPORT_FILE_NAME), &selection)?;
    let files = write_planes(&output_dir, &planes, &config.plane_kinds())?;

    Ok(SubjectReport {
        subject: subject.name.clone(),
        output_dir,
        selection,
        planes,
        files,
    })
}

/// Processes every subject independently and in parallel.
///
/// Subject names are checked up front: an unsafe or repeated name fails the whole
/// batch before anything is written. After that a failing subject does not stop the
/// others; each outcome carries its own result and the caller decides whether to abort
/// or skip.
pub fn run_batch(subjects: &[Subject], config: &SliceSelectConfig) -> Result<Vec<SubjectOutcome>> {
    let mut seen = HashSet::with_capacity(subjects.len());
    for subject in subjects {
        check_subject_name(&subject.name)?;
        if !seen.insert(subject.name.as_str()) {
            bail!("Subject {:?} appears more than once in the batch", subject.name);
        }
    }

    let outcomes: Vec<SubjectOutcome> = subjects
        .par_iter()
        .map(|subject| SubjectOutcome {
            subject: subject.name.clone(),
            result: process_subject(subject, config)
                .with_context(|| format!("process_subject({}) failed", subject.name)),
        })
        .collect();

    let failed: Vec<&SubjectOutcome> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    for outcome in &failed {
        if let Err(e) = &outcome.result {
            log::warn!("{:#}", e);
        }
    }
    log::info!(
        "slice selection: {}/{} subjects processed successfully",
        outcomes.len() - failed.len(),
        outcomes.len()
    );

    Ok(outcomes)
}
