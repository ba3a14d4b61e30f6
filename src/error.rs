use thiserror::Error;

/// Errors raised by the slice selection core.
///
/// None of these are retried internally: they either describe a precondition the
/// caller violated or an inconsistency in the upstream centerline data.
#[derive(Debug, Error)]
pub enum SliceSelectError {
    #[error("invalid orientation code {code:?}: expected one letter from each of R/L, A/P, S/I")]
    InvalidOrientation { code: String },

    #[error("invalid slice count {requested}: at least 2 slices are required")]
    InvalidSliceCount { requested: usize },

    #[error("degenerate span: upper and lower landmark both resolve to sample {index}")]
    DegenerateSpan { index: usize },

    #[error("upper landmark index {upper} lies below lower landmark index {lower}")]
    LandmarkOrder { upper: usize, lower: usize },

    #[error(
        "centerline exhausted walking down from sample {start}: covered {covered:.4} of {target:.4}"
    )]
    CenterlineExhausted {
        start: usize,
        target: f64,
        covered: f64,
    },

    #[error("degenerate tangent at sample {index}: norm {norm:e}")]
    DegenerateTangent { index: usize, norm: f64 },

    #[error("sample index {index} is out of range for a centerline of {len} samples")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown landmark: {0}")]
    UnknownLandmark(String),

    #[error("inconsistent centerline: {0}")]
    InconsistentCenterline(String),

    #[error("invalid voxel spacing ({px}, {py}, {pz}): all components must be positive")]
    InvalidSpacing { px: f64, py: f64, pz: f64 },

    #[error("voxel to physical transform is not invertible")]
    SingularTransform,

    #[error("malformed plane descriptor: {0}")]
    MalformedPlaneDescriptor(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SliceSelectError>;
