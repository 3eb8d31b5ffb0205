//! Building the street graph from raw segment geometry and persisting it

mod builder;
mod snapshot;

pub use builder::{BuildOptions, StreetSegment, build_street_graph, count_components};
pub use snapshot::{GraphSnapshot, SnapshotEdge};
