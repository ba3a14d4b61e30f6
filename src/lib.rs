pub mod entry;
pub mod error;
pub mod frame;
pub mod io;
pub mod processing;
mod utils;

#[cfg(feature = "python")]
mod binding;

pub use entry::{process_subject, run_batch, SliceSelectConfig, Subject, SubjectOutcome};
pub use error::{Result, SliceSelectError};
pub use frame::{permute, Orientation, VoxelSpacing, VoxelToPhysical};
pub use io::{Centerline, PointNormalPlane, Space};
pub use processing::{
    build_planes, orthogonal_plane, select_equidistant_slices, slice_plane, SliceSelection,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// This is the module importable from Python:
///
/// ```python
/// import sliceselectrs as ss
/// cl = ss.PyCenterline.from_csv("ctl.csv", "discs.csv", ["PMJ", "C1", "C2", "C3"])
/// idx, dist = ss.select_slices(cl, cl.region_index(2), cl.region_index(3), 5)
/// ss.orthogonal_plane(cl, idx[1], (0.5, 0.5, 1.0), "RAS").write_json("plane")
/// ```
#[cfg(feature = "python")]
#[pymodule]
fn sliceselectrs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // honour RUST_LOG from the calling interpreter; a second import keeps the first logger
    let _ = env_logger::try_init();
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    binding::register(m)
}
