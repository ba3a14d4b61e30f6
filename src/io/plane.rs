use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SliceSelectError};
use crate::frame::Orientation;

/// Coordinate space a plane descriptor is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    /// Voxel index space of the image grid.
    Pix,
    /// Physical space [mm].
    Phys,
}

/// Plane given by one point on it and its normal vector.
///
/// Serialized as a flat JSON object with exactly the keys `origin`, `normal`,
/// `orientation` and `space`:
///
/// ```json
/// {"origin":[1.0,2.0,3.0],"normal":[0.0,0.0,1.0],"orientation":"RPI","space":"phys"}
/// ```
///
/// The normal is stored as computed; use [`PointNormalPlane::unit_normal`] when a
/// strict unit vector is required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointNormalPlane {
    origin: [f64; 3],
    normal: [f64; 3],
    orientation: Orientation,
    space: Space,
}

impl PointNormalPlane {
    pub fn new(
        origin: Vector3<f64>,
        normal: Vector3<f64>,
        orientation: Orientation,
        space: Space,
    ) -> Self {
        Self {
            origin: origin.into(),
            normal: normal.into(),
            orientation,
            space,
        }
    }

    pub fn origin(&self) -> Vector3<f64> {
        Vector3::from(self.origin)
    }

    pub fn normal(&self) -> Vector3<f64> {
        Vector3::from(self.normal)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn space(&self) -> Space {
        self.space
    }

    /// Normal scaled to unit length, `None` when it is numerically zero.
    pub fn unit_normal(&self) -> Option<Vector3<f64>> {
        self.normal().try_normalize(f64::EPSILON)
    }

    /// Same plane with origin and normal expressed in `dest`.
    pub fn reoriented(&self, dest: Orientation) -> Self {
        Self::new(
            self.orientation.permute(&self.origin(), dest),
            self.orientation.permute(&self.normal(), dest),
            dest,
            self.space,
        )
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SliceSelectError::MalformedPlaneDescriptor(e.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SliceSelectError::MalformedPlaneDescriptor(e.to_string()))
    }

    /// Writes the descriptor to `path`, appending `.json` unless the name already ends
    /// in `json`. Returns the path actually written.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = json_path(path.as_ref());
        fs::write(&path, self.to_json_string()?)?;
        Ok(path)
    }

    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(&path)?;
        Self::from_json_str(&data).map_err(|e| match e {
            SliceSelectError::MalformedPlaneDescriptor(msg) => {
                SliceSelectError::MalformedPlaneDescriptor(format!(
                    "{}: {}",
                    path.as_ref().display(),
                    msg
                ))
            }
            other => other,
        })
    }
}

fn json_path(path: &Path) -> PathBuf {
    let ends_in_json = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("json"));
    if ends_in_json {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod plane_tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_plane() -> PointNormalPlane {
        PointNormalPlane::new(
            Vector3::new(-12.25, 3.1, 140.000001),
            Vector3::new(0.1, -0.2, 0.9746794344808963),
            Orientation::RAS,
            Space::Phys,
        )
    }

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sliceselectrs_plane_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_json_layout() {
        let plane = PointNormalPlane::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 0.0, 1.0),
            Orientation::RPI,
            Space::Phys,
        );
        assert_eq!(
            plane.to_json_string().unwrap(),
            r#"{"origin":[1.0,2.0,3.0],"normal":[0.0,0.0,1.0],"orientation":"RPI","space":"phys"}"#
        );
    }

    #[test]
    fn test_round_trip_field_by_field_and_bytes() {
        let plane = sample_plane();
        let json = plane.to_json_string().unwrap();
        let back = PointNormalPlane::from_json_str(&json).unwrap();
        assert_eq!(back, plane);
        assert_eq!(back.origin(), plane.origin());
        assert_eq!(back.normal(), plane.normal());
        assert_eq!(back.orientation(), plane.orientation());
        assert_eq!(back.space(), plane.space());
        assert_eq!(back.to_json_string().unwrap(), json);
    }

    #[test]
    fn test_round_trip_keeps_every_bit() {
        let values = [
            0.9746794344808963,
            1.2192912317973579,
            -0.1 - 0.2,
            1.0 / 3.0,
            140.000001,
            f64::MIN_POSITIVE,
            -2.2250738585072014e-300,
            1e21 + 1.0,
        ];
        for w in values.windows(3) {
            let plane = PointNormalPlane::new(
                Vector3::new(w[0], w[1], w[2]),
                Vector3::new(w[2], w[0], w[1]),
                Orientation::LPS,
                Space::Pix,
            );
            let back = PointNormalPlane::from_json_str(&plane.to_json_string().unwrap()).unwrap();
            for (a, b) in back.origin().iter().zip(plane.origin().iter()) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
            for (a, b) in back.normal().iter().zip(plane.normal().iter()) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn test_file_round_trip_appends_extension() {
        let plane = sample_plane();
        let written = plane.write_json(temp_path("plane_orthog_RAS_7")).unwrap();
        assert!(written.to_string_lossy().ends_with("plane_orthog_RAS_7.json"));
        let first = fs::read_to_string(&written).unwrap();
        let loaded = PointNormalPlane::read_json(&written).unwrap();
        assert_eq!(loaded, plane);

        let rewritten = loaded.write_json(&written).unwrap();
        assert_eq!(rewritten, written);
        assert_eq!(fs::read_to_string(&rewritten).unwrap(), first);
        fs::remove_file(&written).ok();
    }

    #[test]
    fn test_malformed_descriptors() {
        let cases = [
            r#"{"normal":[0.0,0.0,1.0],"orientation":"RPI","space":"phys"}"#,
            r#"{"origin":[1.0,2.0],"normal":[0.0,0.0,1.0],"orientation":"RPI","space":"phys"}"#,
            r#"{"origin":"here","normal":[0.0,0.0,1.0],"orientation":"RPI","space":"phys"}"#,
            r#"{"origin":[1.0,2.0,3.0],"normal":[0.0,0.0,1.0],"orientation":"RPQ","space":"phys"}"#,
            r#"{"origin":[1.0,2.0,3.0],"normal":[0.0,0.0,1.0],"orientation":"RPI","space":"world"}"#,
            r#"{"origin":[1.0,2.0,3.0],"normal":[0.0,0.0,1.0],"orientation":"RPI","space":"phys","extra":1}"#,
            "not json",
        ];
        for json in cases {
            assert!(
                matches!(
                    PointNormalPlane::from_json_str(json),
                    Err(SliceSelectError::MalformedPlaneDescriptor(_))
                ),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn test_reoriented_keeps_geometry() {
        let plane = sample_plane();
        let lps = plane.reoriented(Orientation::LPS);
        assert_eq!(lps.orientation(), Orientation::LPS);
        assert_relative_eq!(lps.origin(), Vector3::new(12.25, -3.1, 140.000001));
        assert_eq!(lps.reoriented(Orientation::RAS), plane);
    }

    #[test]
    fn test_unit_normal() {
        let plane = PointNormalPlane::new(
            Vector3::zeros(),
            Vector3::new(0.0, 3.0, 4.0),
            Orientation::RPI,
            Space::Pix,
        );
        assert_relative_eq!(plane.unit_normal().unwrap(), Vector3::new(0.0, 0.6, 0.8));
        let flat = PointNormalPlane::new(Vector3::zeros(), Vector3::zeros(), Orientation::RPI, Space::Pix);
        assert!(flat.unit_normal().is_none());
    }
}
