pub mod planes;
pub mod slice_select;

pub use planes::{build_planes, orthogonal_plane, slice_plane, tangent_vector, SlicePlanes};
pub use slice_select::{
    nearest_sample_at_distance, select_between_regions, select_equidistant_slices,
    walk_arc_length, ArcWalk, SelectLog, SliceSelection,
};
