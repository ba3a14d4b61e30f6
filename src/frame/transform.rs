use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SliceSelectError};

/// Physical size of one voxel along each grid axis [mm].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct VoxelSpacing {
    px: f64,
    py: f64,
    pz: f64,
}

impl VoxelSpacing {
    pub fn new(px: f64, py: f64, pz: f64) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !(valid(px) && valid(py) && valid(pz)) {
            return Err(SliceSelectError::InvalidSpacing { px, py, pz });
        }
        Ok(Self { px, py, pz })
    }

    pub fn isotropic(size: f64) -> Result<Self> {
        Self::new(size, size, size)
    }

    pub fn px(&self) -> f64 {
        self.px
    }

    pub fn py(&self) -> f64 {
        self.py
    }

    pub fn pz(&self) -> f64 {
        self.pz
    }

    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.px, self.py, self.pz)
    }
}

impl TryFrom<[f64; 3]> for VoxelSpacing {
    type Error = SliceSelectError;

    fn try_from(v: [f64; 3]) -> Result<Self> {
        VoxelSpacing::new(v[0], v[1], v[2])
    }
}

impl From<VoxelSpacing> for [f64; 3] {
    fn from(s: VoxelSpacing) -> [f64; 3] {
        [s.px, s.py, s.pz]
    }
}

/// Homogeneous voxel-index -> physical [mm] transform of an image grid.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelToPhysical {
    affine: Matrix4<f64>,
    inverse: Matrix4<f64>,
}

impl VoxelToPhysical {
    /// Accepts any invertible affine; the bottom row must be `[0, 0, 0, 1]`.
    pub fn from_matrix(affine: Matrix4<f64>) -> Result<Self> {
        let bottom = affine.row(3);
        if bottom[0] != 0.0 || bottom[1] != 0.0 || bottom[2] != 0.0 || bottom[3] != 1.0 {
            return Err(SliceSelectError::SingularTransform);
        }
        let inverse = affine
            .try_inverse()
            .ok_or(SliceSelectError::SingularTransform)?;
        Ok(Self { affine, inverse })
    }

    /// Axis-aligned grid: per-axis scaling followed by a translation to `origin`.
    pub fn from_spacing(spacing: VoxelSpacing, origin: Point3<f64>) -> Self {
        let mut affine = Matrix4::identity();
        affine[(0, 0)] = spacing.px();
        affine[(1, 1)] = spacing.py();
        affine[(2, 2)] = spacing.pz();
        affine[(0, 3)] = origin.x;
        affine[(1, 3)] = origin.y;
        affine[(2, 3)] = origin.z;
        let mut inverse = Matrix4::identity();
        inverse[(0, 0)] = 1.0 / spacing.px();
        inverse[(1, 1)] = 1.0 / spacing.py();
        inverse[(2, 2)] = 1.0 / spacing.pz();
        inverse[(0, 3)] = -origin.x / spacing.px();
        inverse[(1, 3)] = -origin.y / spacing.py();
        inverse[(2, 3)] = -origin.z / spacing.pz();
        Self { affine, inverse }
    }

    pub fn affine(&self) -> &Matrix4<f64> {
        &self.affine
    }

    pub fn pixel_to_physical(&self, voxel: &Point3<f64>) -> Point3<f64> {
        self.affine.transform_point(voxel)
    }

    pub fn physical_to_pixel(&self, physical: &Point3<f64>) -> Point3<f64> {
        self.inverse.transform_point(physical)
    }

    /// Voxel size recovered from the column norms of the linear part, so rotated
    /// grids report the same spacing as their axis-aligned counterpart.
    pub fn spacing(&self) -> Result<VoxelSpacing> {
        let linear: Matrix3<f64> = self.affine.fixed_view::<3, 3>(0, 0).into_owned();
        VoxelSpacing::new(
            linear.column(0).norm(),
            linear.column(1).norm(),
            linear.column(2).norm(),
        )
    }
}

/// Applies the voxel -> physical transform to a single voxel coordinate.
pub fn pixel_to_physical(voxel: &Point3<f64>, transform: &VoxelToPhysical) -> Point3<f64> {
    transform.pixel_to_physical(voxel)
}
