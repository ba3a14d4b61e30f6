use nalgebra::Vector3;

use crate::error::{Result, SliceSelectError};
use crate::frame::{Orientation, VoxelSpacing};
use crate::io::centerline::Centerline;
use crate::io::plane::{PointNormalPlane, Space};

pub const NEAR_ZERO_THRESHOLD: f64 = 1e-6;

/// Unit tangent of the centerline at sample `iz`, in the centerline's orientation.
///
/// In-plane derivative components are scaled by the voxel size along x and y; the
/// third component is the slice spacing itself since derivatives are taken per slice
/// index.
pub fn tangent_vector(
    centerline: &Centerline,
    iz: usize,
    spacing: &VoxelSpacing,
) -> Result<Vector3<f64>> {
    let d = centerline.derivative(iz)?;
    let tangent = Vector3::new(d.x * spacing.px(), d.y * spacing.py(), spacing.pz());
    let norm = tangent.norm();
    if !(norm > NEAR_ZERO_THRESHOLD) {
        return Err(SliceSelectError::DegenerateTangent { index: iz, norm });
    }
    Ok(tangent / norm)
}

/// Plane through sample `iz` orthogonal to the centerline, in physical space and
/// expressed in `dest`.
///
/// Precondition: the centerline points are physical coordinates, so only the
/// orientation changes.
pub fn orthogonal_plane(
    centerline: &Centerline,
    iz: usize,
    spacing: &VoxelSpacing,
    dest: Orientation,
) -> Result<PointNormalPlane> {
    let origin = centerline.point(iz)?;
    let tangent = tangent_vector(centerline, iz, spacing)?;
    Ok(
        PointNormalPlane::new(*origin, tangent, centerline.orientation(), Space::Phys)
            .reoriented(dest),
    )
}

/// Axis-aligned plane through sample `iz`: the normal is the slicing axis of the
/// working grid.
pub fn slice_plane(
    centerline: &Centerline,
    iz: usize,
    dest: Orientation,
) -> Result<PointNormalPlane> {
    let origin = centerline.point(iz)?;
    Ok(
        PointNormalPlane::new(*origin, Vector3::z(), centerline.orientation(), Space::Phys)
            .reoriented(dest),
    )
}

/// Both planes built for one selected sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicePlanes {
    pub index: usize,
    pub slice: PointNormalPlane,
    pub orthogonal: PointNormalPlane,
}

pub fn build_planes(
    centerline: &Centerline,
    indices: &[usize],
    spacing: &VoxelSpacing,
    dest: Orientation,
) -> Result<Vec<SlicePlanes>> {
    indices
        .iter()
        .map(|&iz| {
            Ok(SlicePlanes {
                index: iz,
                slice: slice_plane(centerline, iz, dest)?,
                orthogonal: orthogonal_plane(centerline, iz, spacing, dest)?,
            })
        })
        .collect()
}
