// Re-export key components
pub use crate::algo::{
    BuildingReach, BuildingReachReport, PoiReach, PoiReachReport, ReachComparison, ReachEngine,
    Region, ScoredBuilding, compare_poi_reach, isochron, pca_index, score_buildings,
    weighted_sum_index,
};
pub use crate::loading::{BuildOptions, StreetSegment, build_street_graph};
pub use crate::model::{
    AccessibilityWeights, Building, CostMetric, ExtendedGraph, LocationId, Poi, PoiCollection,
    ReachParams, SnapMode, Strategy, StreetGraph,
};
pub use crate::routing::{ReachableSet, reachable, shortest_path};

// Core types for the street network
pub use crate::Error;
pub use crate::Length; // meters
pub use crate::StreetNodeId;
pub use crate::WalkingTime; // minutes
