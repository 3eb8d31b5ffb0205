//! Pedestrian street network model

pub mod components;
pub mod extended;
pub mod network;

pub use components::{StreetEdge, StreetNode};
pub use extended::ExtendedGraph;
pub use network::{IndexedPoint, IndexedSegment, StreetGraph};
