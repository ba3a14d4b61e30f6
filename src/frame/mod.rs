//! Coordinate frames: anatomical orientation codes and voxel <-> physical transforms.

pub mod orientation;
pub mod transform;

pub use orientation::{permute, AxisLabel, Orientation};
pub use transform::{pixel_to_physical, VoxelSpacing, VoxelToPhysical};
