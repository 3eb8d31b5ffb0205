//! Data model for pedestrian accessibility analysis
//!
//! Street network, located points of interest and buildings, run parameters
//! and the accessibility weight table.

pub mod locations;
pub mod params;
pub mod streets;
pub mod weights;

pub use locations::{Building, LocatedPoint, LocationId, Poi, PoiCollection, SnapKind, location_point};
pub use params::{CostMetric, ReachParams, SnapMode, Strategy, StrategyKind};
pub use streets::{ExtendedGraph, StreetEdge, StreetGraph, StreetNode};
pub use weights::{AccessibilityWeights, SubgroupWeight};
