use nalgebra::Vector3;
use pyo3::prelude::*;
use std::collections::BTreeMap;

use crate::frame::Orientation;
use crate::io::input::read_centerline_csv;
use crate::io::{Centerline, PointNormalPlane, Space};

fn to_tuple(v: Vector3<f64>) -> (f64, f64, f64) {
    (v.x, v.y, v.z)
}

fn to_vector(t: (f64, f64, f64)) -> Vector3<f64> {
    Vector3::new(t.0, t.1, t.2)
}

fn parse_space(space: &str) -> PyResult<Space> {
    match space {
        "pix" => Ok(Space::Pix),
        "phys" => Ok(Space::Phys),
        other => Err(pyo3::exceptions::PyValueError::new_err(format!(
            "unknown space {:?}, expected \"pix\" or \"phys\"",
            other
        ))),
    }
}

/// Python representation of a point-normal plane
///
/// Attributes:
///     origin (float, float, float): Point on the plane
///     normal (float, float, float): Normal vector of the plane
///     orientation (str): Three letter orientation code, e.g. "RPI"
///     space (str): "phys" for millimetres, "pix" for voxel indices
///
/// Example:
///     >>> plane = PyPointNormalPlane(
///     ...     origin=(1.0, 2.0, 3.0),
///     ...     normal=(0.0, 0.0, 1.0),
///     ...     orientation="RPI",
///     ...     space="phys"
///     ... )
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyPointNormalPlane {
    #[pyo3(get, set)]
    pub origin: (f64, f64, f64),
    #[pyo3(get, set)]
    pub normal: (f64, f64, f64),
    #[pyo3(get, set)]
    pub orientation: String,
    #[pyo3(get, set)]
    pub space: String,
}

#[pymethods]
impl PyPointNormalPlane {
    #[new]
    #[pyo3(signature = (origin, normal, orientation = "RPI", space = "phys"))]
    fn new(
        origin: (f64, f64, f64),
        normal: (f64, f64, f64),
        orientation: &str,
        space: &str,
    ) -> PyResult<Self> {
        let plane = PyPointNormalPlane {
            origin,
            normal,
            orientation: orientation.to_string(),
            space: space.to_string(),
        };
        // reject bad codes at construction time rather than on export
        plane.to_rust()?;
        Ok(plane)
    }

    /// Serializes the plane to its JSON descriptor.
    fn to_json(&self) -> PyResult<String> {
        Ok(self.to_rust()?.to_json_string()?)
    }

    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        Ok(PyPointNormalPlane::from(&PointNormalPlane::from_json_str(json)?))
    }

    /// Writes the JSON descriptor to `path` and returns the path actually written.
    fn write_json(&self, path: &str) -> PyResult<String> {
        let written = self.to_rust()?.write_json(path)?;
        Ok(written.to_string_lossy().into_owned())
    }

    #[staticmethod]
    fn read_json(path: &str) -> PyResult<Self> {
        Ok(PyPointNormalPlane::from(&PointNormalPlane::read_json(path)?))
    }

    /// Same plane expressed in another orientation.
    fn reoriented(&self, orientation: &str) -> PyResult<Self> {
        let dest: Orientation = orientation.parse()?;
        Ok(PyPointNormalPlane::from(&self.to_rust()?.reoriented(dest)))
    }

    fn __repr__(&self) -> String {
        format!(
            "PointNormalPlane(origin=({:.2}, {:.2}, {:.2}), normal=({:.3}, {:.3}, {:.3}), orientation={}, space={})",
            self.origin.0,
            self.origin.1,
            self.origin.2,
            self.normal.0,
            self.normal.1,
            self.normal.2,
            self.orientation,
            self.space
        )
    }
}

impl PyPointNormalPlane {
    pub fn to_rust(&self) -> PyResult<PointNormalPlane> {
        let orientation: Orientation = self.orientation.parse()?;
        Ok(PointNormalPlane::new(
            to_vector(self.origin),
            to_vector(self.normal),
            orientation,
            parse_space(&self.space)?,
        ))
    }
}

impl From<&PointNormalPlane> for PyPointNormalPlane {
    fn from(plane: &PointNormalPlane) -> Self {
        Self {
            origin: to_tuple(plane.origin()),
            normal: to_tuple(plane.normal()),
            orientation: plane.orientation().to_string(),
            space: match plane.space() {
                Space::Pix => "pix".to_string(),
                Space::Phys => "phys".to_string(),
            },
        }
    }
}

/// Python handle on a spinal cord centerline
///
/// Args:
///     points (List[(float, float, float)]): sample positions in mm
///     derivatives (List[(float, float, float)]): per-slice derivatives at each sample
///     index_disc (Dict[str, int]): landmark label to sample index
///     regions_labels (List[str]): landmark label of each region number
///     orientation (str): orientation of points and derivatives (default: "RPI")
///
/// Example:
///     >>> cl = PyCenterline.from_csv("ctl.csv", "discs.csv", ["PMJ", "C1", "C2"])
///     >>> len(cl), cl.length
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyCenterline {
    pub inner: Centerline,
}

#[pymethods]
impl PyCenterline {
    #[new]
    #[pyo3(signature = (points, derivatives, index_disc, regions_labels, orientation = "RPI"))]
    fn new(
        points: Vec<(f64, f64, f64)>,
        derivatives: Vec<(f64, f64, f64)>,
        index_disc: BTreeMap<String, usize>,
        regions_labels: Vec<String>,
        orientation: &str,
    ) -> PyResult<Self> {
        let orientation: Orientation = orientation.parse()?;
        let inner = Centerline::from_points(
            points.into_iter().map(to_vector).collect(),
            derivatives.into_iter().map(to_vector).collect(),
            index_disc,
            regions_labels,
        )?
        .with_orientation(orientation);
        Ok(PyCenterline { inner })
    }

    #[staticmethod]
    #[pyo3(signature = (samples_path, landmarks_path, regions_labels, orientation = "RPI"))]
    fn from_csv(
        samples_path: &str,
        landmarks_path: &str,
        regions_labels: Vec<String>,
        orientation: &str,
    ) -> PyResult<Self> {
        let orientation: Orientation = orientation.parse()?;
        let inner = read_centerline_csv(samples_path, landmarks_path, regions_labels)?
            .with_orientation(orientation);
        Ok(PyCenterline { inner })
    }

    #[staticmethod]
    fn load_cache(path: &str) -> PyResult<Self> {
        Ok(PyCenterline {
            inner: Centerline::load_cache(path)?,
        })
    }

    fn save_cache(&self, path: &str) -> PyResult<()> {
        Ok(self.inner.save_cache(path)?)
    }

    /// Total arc length in mm.
    #[getter]
    fn length(&self) -> f64 {
        self.inner.length()
    }

    #[getter]
    fn orientation(&self) -> String {
        self.inner.orientation().to_string()
    }

    #[getter]
    fn points(&self) -> Vec<(f64, f64, f64)> {
        self.inner.points().iter().map(|p| to_tuple(*p)).collect()
    }

    #[getter]
    fn incremental_length(&self) -> Vec<f64> {
        self.inner.incremental_length().to_vec()
    }

    fn landmark_index(&self, label: &str) -> PyResult<usize> {
        Ok(self.inner.landmark_index(label)?)
    }

    fn region_index(&self, region: usize) -> PyResult<usize> {
        Ok(self.inner.region_index(region)?)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Centerline(len={}, length={:.2} mm, landmarks={}, orientation={})",
            self.inner.len(),
            self.inner.length(),
            self.inner.index_disc().len(),
            self.inner.orientation()
        )
    }
}
