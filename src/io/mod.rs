pub mod centerline;
pub mod input;
pub mod output;
pub mod plane;

pub use centerline::{Centerline, CenterlineCache};
pub use input::read_centerline_csv;
pub use output::{write_planes, write_report, PlaneKind};
pub use plane::{PointNormalPlane, Space};
