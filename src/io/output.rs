use anyhow::{anyhow, bail, Context};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::io::plane::PointNormalPlane;
use crate::processing::{SlicePlanes, SliceSelection};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaneKind {
    Slice,
    Orthogonal,
}

impl PlaneKind {
    pub fn get_plane<'a>(&self, planes: &'a SlicePlanes) -> &'a PointNormalPlane {
        match self {
            PlaneKind::Slice => &planes.slice,
            PlaneKind::Orthogonal => &planes.orthogonal,
        }
    }

    // Get the object string for filenames
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaneKind::Slice => "slice",
            PlaneKind::Orthogonal => "orthog",
        }
    }

    /// `plane_<kind>_<ORIENTATION>_<index>.json`
    pub fn file_name(&self, planes: &SlicePlanes) -> String {
        format!(
            "plane_{}_{}_{}.json",
            self.as_str(),
            self.get_plane(planes).orientation(),
            planes.index
        )
    }
}

/// Writes one JSON descriptor per plane of the requested kinds into `output_dir`.
pub fn write_planes(
    output_dir: impl AsRef<Path>,
    planes: &[SlicePlanes],
    kinds: &[PlaneKind],
) -> anyhow::Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir).context(format!(
        "Could not create output directory: {:?}",
        output_dir
    ))?;

    let jobs: Vec<(PlaneKind, &SlicePlanes)> = kinds
        .iter()
        .flat_map(|kind| planes.iter().map(move |p| (*kind, p)))
        .collect();
    let total = jobs.len();

    let results: Vec<anyhow::Result<PathBuf>> = jobs
        .par_iter()
        .map(|(kind, p)| {
            let name = kind.file_name(p);
            kind.get_plane(p)
                .write_json(output_dir.join(&name))
                .map_err(|e| anyhow!("Failed [{}]: {}", name, e))
        })
        .collect();

    let success_count = results.iter().filter(|r| r.is_ok()).count();
    let fail_count = total - success_count;

    log::info!(
        "plane descriptors in {:?}: {}/{} written successfully{}",
        output_dir,
        success_count,
        total,
        if fail_count > 0 {
            format!(", {} failures", fail_count)
        } else {
            String::new()
        }
    );

    if fail_count > 0 {
        let errors = results
            .into_iter()
            .filter_map(|r| r.err())
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Failed to write {} plane descriptors:\n{}", fail_count, errors);
    }

    results.into_iter().collect()
}

/// Writes the diagnostic report of a slice selection to `path`.
pub fn write_report(path: impl AsRef<Path>, selection: &SliceSelection) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Could not create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    selection
        .write_report(&mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| format!("Could not write report {:?}", path))?;
    Ok(())
}
