use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SliceSelectError};

/// Direction a single image axis points toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisLabel {
    Right,
    Left,
    Anterior,
    Posterior,
    Superior,
    Inferior,
}

impl AxisLabel {
    pub const ALL: [AxisLabel; 6] = [
        AxisLabel::Right,
        AxisLabel::Left,
        AxisLabel::Anterior,
        AxisLabel::Posterior,
        AxisLabel::Superior,
        AxisLabel::Inferior,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'R' => Some(AxisLabel::Right),
            'L' => Some(AxisLabel::Left),
            'A' => Some(AxisLabel::Anterior),
            'P' => Some(AxisLabel::Posterior),
            'S' => Some(AxisLabel::Superior),
            'I' => Some(AxisLabel::Inferior),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            AxisLabel::Right => 'R',
            AxisLabel::Left => 'L',
            AxisLabel::Anterior => 'A',
            AxisLabel::Posterior => 'P',
            AxisLabel::Superior => 'S',
            AxisLabel::Inferior => 'I',
        }
    }

    /// The other member of the anatomical pair (R<->L, A<->P, S<->I).
    pub fn opposite(&self) -> Self {
        match self {
            AxisLabel::Right => AxisLabel::Left,
            AxisLabel::Left => AxisLabel::Right,
            AxisLabel::Anterior => AxisLabel::Posterior,
            AxisLabel::Posterior => AxisLabel::Anterior,
            AxisLabel::Superior => AxisLabel::Inferior,
            AxisLabel::Inferior => AxisLabel::Superior,
        }
    }

    /// Anatomical pair this label belongs to: 0 = R/L, 1 = A/P, 2 = S/I.
    pub fn pair(&self) -> usize {
        match self {
            AxisLabel::Right | AxisLabel::Left => 0,
            AxisLabel::Anterior | AxisLabel::Posterior => 1,
            AxisLabel::Superior | AxisLabel::Inferior => 2,
        }
    }
}

/// A 3-letter anatomical orientation code such as `RAS` or `RPI`.
///
/// Only codes naming exactly one letter of each anatomical pair can be built, so every
/// `Orientation` value can be permuted into every other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Orientation([AxisLabel; 3]);

impl Orientation {
    pub const RPI: Orientation = Orientation([
        AxisLabel::Right,
        AxisLabel::Posterior,
        AxisLabel::Inferior,
    ]);
    pub const RAS: Orientation = Orientation([
        AxisLabel::Right,
        AxisLabel::Anterior,
        AxisLabel::Superior,
    ]);
    pub const LPS: Orientation = Orientation([
        AxisLabel::Left,
        AxisLabel::Posterior,
        AxisLabel::Superior,
    ]);

    pub fn new(axes: [AxisLabel; 3]) -> Result<Self> {
        let mut seen = [false; 3];
        for axis in &axes {
            if std::mem::replace(&mut seen[axis.pair()], true) {
                return Err(SliceSelectError::InvalidOrientation {
                    code: axes.iter().map(AxisLabel::as_char).collect(),
                });
            }
        }
        Ok(Orientation(axes))
    }

    pub fn axes(&self) -> [AxisLabel; 3] {
        self.0
    }

    /// Every valid orientation code (3! axis orders x 2^3 signs = 48).
    pub fn all() -> Vec<Orientation> {
        let mut codes = Vec::with_capacity(48);
        for a in AxisLabel::ALL {
            for b in AxisLabel::ALL {
                for c in AxisLabel::ALL {
                    if let Ok(o) = Orientation::new([a, b, c]) {
                        codes.push(o);
                    }
                }
            }
        }
        codes
    }

    /// Expresses `v`, given in `self`, in the `dest` orientation.
    ///
    /// Each destination axis takes the source coordinate of the same anatomical pair,
    /// negated when the two letters are opposite members of the pair.
    pub fn permute(&self, v: &Vector3<f64>, dest: Orientation) -> Vector3<f64> {
        let mut out = Vector3::zeros();
        for (k, dest_axis) in dest.0.iter().enumerate() {
            // construction guarantees exactly one match
            let (j, src_axis) = self
                .0
                .iter()
                .enumerate()
                .find(|(_, a)| a.pair() == dest_axis.pair())
                .unwrap_or((k, dest_axis));
            out[k] = if src_axis == dest_axis { v[j] } else { -v[j] };
        }
        out
    }
}

/// Permutes `point` between two orientation codes given as strings.
pub fn permute(point: &Vector3<f64>, source: &str, dest: &str) -> Result<Vector3<f64>> {
    let source: Orientation = source.parse()?;
    let dest: Orientation = dest.parse()?;
    Ok(source.permute(point, dest))
}

impl FromStr for Orientation {
    type Err = SliceSelectError;

    fn from_str(code: &str) -> Result<Self> {
        let invalid = || SliceSelectError::InvalidOrientation {
            code: code.to_string(),
        };
        let labels: Vec<AxisLabel> = code
            .chars()
            .map(AxisLabel::from_char)
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;
        let axes: [AxisLabel; 3] = labels.try_into().map_err(|_| invalid())?;
        Orientation::new(axes).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Orientation {
    type Error = SliceSelectError;

    fn try_from(code: String) -> Result<Self> {
        code.parse()
    }
}

impl From<Orientation> for String {
    fn from(o: Orientation) -> String {
        o.to_string()
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for axis in &self.0 {
            write!(f, "{}", axis.as_char())?;
        }
        Ok(())
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::RPI
    }
}

#[cfg(test)]
mod orientation_tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_parse_and_display() {
        for code in ["RAS", "RPI", "LPS", "AIL", "SRP"] {
            let o: Orientation = code.parse().unwrap();
            assert_eq!(o.to_string(), code);
        }
    }

    #[test]
    fn test_rejects_invalid_codes() {
        for code in ["", "RA", "RASX", "RRS", "RLA", "XYZ", "ras", "SIA"] {
            assert!(
                matches!(
                    code.parse::<Orientation>(),
                    Err(SliceSelectError::InvalidOrientation { .. })
                ),
                "{} should be rejected",
                code
            );
        }
    }

    #[test]
    fn test_all_has_48_codes() {
        let all = Orientation::all();
        assert_eq!(all.len(), 48);
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 48);
    }

    #[test]
    fn test_rpi_to_ras_flips_y_and_z() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        let out = Orientation::RPI.permute(&p, Orientation::RAS);
        assert_eq!(out, Vector3::new(1.0, -2.0, -3.0));
    }

    #[test]
    fn test_permute_reorders_axes() {
        // x points R, y points A, z points S -> dest axes S, R, P
        let p = Vector3::new(1.0, 2.0, 3.0);
        let out = permute(&p, "RAS", "SRP").unwrap();
        assert_eq!(out, Vector3::new(3.0, 1.0, -2.0));
    }

    #[test]
    fn test_permute_rejects_bad_code() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert!(permute(&p, "RAS", "RAA").is_err());
        assert!(permute(&p, "QAS", "RAS").is_err());
    }

    #[test]
    fn test_permute_is_involution_for_all_pairs() {
        let mut rng = StdRng::seed_from_u64(7);
        let all = Orientation::all();
        for a in &all {
            for b in &all {
                let p = Vector3::new(
                    rng.random_range(-100.0..100.0),
                    rng.random_range(-100.0..100.0),
                    rng.random_range(-100.0..100.0),
                );
                let back = b.permute(&a.permute(&p, *b), *a);
                assert_relative_eq!(back, p, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Orientation::LPS).unwrap();
        assert_eq!(json, "\"LPS\"");
        let back: Orientation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Orientation::LPS);
        assert!(serde_json::from_str::<Orientation>("\"LLS\"").is_err());
    }
}
