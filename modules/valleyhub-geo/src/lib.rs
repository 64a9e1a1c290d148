pub mod gazetteer;
pub mod geofence;
pub mod grid;
pub mod seed;

pub use gazetteer::{neighborhood_of, resolve_by_text, resolve_place_text};
pub use geofence::parse_feature_collection;
pub use grid::{cell_of, cells_covering, ring, GRID_RESOLUTION, RING_STEPS};
