pub mod classes;

use classes::{PyCenterline, PyPointNormalPlane};
use pyo3::exceptions::{PyIOError, PyIndexError, PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::error::SliceSelectError;
use crate::frame::{permute, VoxelSpacing};
use crate::processing::{self, select_between_regions, select_equidistant_slices};

impl From<SliceSelectError> for PyErr {
    fn from(err: SliceSelectError) -> PyErr {
        let msg = err.to_string();
        match err {
            SliceSelectError::InvalidOrientation { .. }
            | SliceSelectError::InvalidSliceCount { .. }
            | SliceSelectError::DegenerateSpan { .. }
            | SliceSelectError::LandmarkOrder { .. }
            | SliceSelectError::InvalidSpacing { .. }
            | SliceSelectError::MalformedPlaneDescriptor(_) => PyValueError::new_err(msg),
            SliceSelectError::IndexOutOfRange { .. } => PyIndexError::new_err(msg),
            SliceSelectError::UnknownLandmark(_) => PyKeyError::new_err(msg),
            SliceSelectError::Io(_) => PyIOError::new_err(msg),
            _ => PyRuntimeError::new_err(msg),
        }
    }
}

/// Selects ``n_slices`` samples between two landmark indices, equally spaced in arc
/// length along the centerline.
///
/// Arguments:
///
/// - ``centerline`` – PyCenterline to select on
/// - ``upper`` – Sample index of the upper landmark
/// - ``lower`` – Sample index of the lower landmark, below ``upper``
/// - ``n_slices`` – Number of slices including both landmarks (>= 2)
///
/// Returns:
///
/// A tuple ``(indices, interslice_dist)``.
///
/// Example:
///
/// .. code-block:: python
///
///    import sliceselectrs as ss
///    idx, dist = ss.select_slices(cl, cl.region_index(2), cl.region_index(5), 7)
#[pyfunction]
#[pyo3(name = "select_slices")]
pub fn select_slices_py(
    centerline: PyRef<'_, PyCenterline>,
    upper: usize,
    lower: usize,
    n_slices: usize,
) -> PyResult<(Vec<usize>, Vec<f64>)> {
    let selection = select_equidistant_slices(&centerline.inner, upper, lower, n_slices)?;
    Ok((selection.indices, selection.interslice_dist))
}

/// Same as ``select_slices`` with both bounds given as region numbers.
#[pyfunction]
#[pyo3(name = "select_slices_between_regions")]
pub fn select_slices_between_regions_py(
    centerline: PyRef<'_, PyCenterline>,
    upper_region: usize,
    lower_region: usize,
    n_slices: usize,
) -> PyResult<(Vec<usize>, Vec<f64>)> {
    let selection =
        select_between_regions(&centerline.inner, upper_region, lower_region, n_slices)?;
    Ok((selection.indices, selection.interslice_dist))
}

/// Plane through sample ``iz`` orthogonal to the centerline, in physical space.
///
/// ``spacing`` is the voxel size ``(px, py, pz)`` in mm.
#[pyfunction]
#[pyo3(name = "orthogonal_plane", signature = (centerline, iz, spacing, orientation = "RPI"))]
pub fn orthogonal_plane_py(
    centerline: PyRef<'_, PyCenterline>,
    iz: usize,
    spacing: (f64, f64, f64),
    orientation: &str,
) -> PyResult<PyPointNormalPlane> {
    let spacing = VoxelSpacing::new(spacing.0, spacing.1, spacing.2)?;
    let plane = processing::orthogonal_plane(
        &centerline.inner,
        iz,
        &spacing,
        orientation.parse()?,
    )?;
    Ok(PyPointNormalPlane::from(&plane))
}

/// Axis-aligned plane through sample ``iz``.
#[pyfunction]
#[pyo3(name = "slice_plane", signature = (centerline, iz, orientation = "RPI"))]
pub fn slice_plane_py(
    centerline: PyRef<'_, PyCenterline>,
    iz: usize,
    orientation: &str,
) -> PyResult<PyPointNormalPlane> {
    let plane = processing::slice_plane(&centerline.inner, iz, orientation.parse()?)?;
    Ok(PyPointNormalPlane::from(&plane))
}

/// Expresses ``point`` given in ``source`` orientation in ``dest`` orientation.
#[pyfunction]
#[pyo3(name = "permute")]
pub fn permute_py(point: (f64, f64, f64), source: &str, dest: &str) -> PyResult<(f64, f64, f64)> {
    let p = permute(&nalgebra::Vector3::new(point.0, point.1, point.2), source, dest)?;
    Ok((p.x, p.y, p.z))
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(select_slices_py, m)?)?;
    m.add_function(wrap_pyfunction!(select_slices_between_regions_py, m)?)?;
    m.add_function(wrap_pyfunction!(orthogonal_plane_py, m)?)?;
    m.add_function(wrap_pyfunction!(slice_plane_py, m)?)?;
    m.add_function(wrap_pyfunction!(permute_py, m)?)?;

    m.add_class::<PyPointNormalPlane>()?;
    m.add_class::<PyCenterline>()?;
    Ok(())
}
