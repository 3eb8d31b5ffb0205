//! Location snapping, regions, reach aggregation and scoring

mod compare;
mod index;
mod locate;
mod pca;
mod reach;
mod region;

pub use compare::{ReachComparison, ReachTotals, compare_poi_reach};
pub use index::{PCA_VARIANCE_THRESHOLD, ScoredBuilding, pca_index, score_buildings, weighted_sum_index};
pub use locate::{locate_at_nodes, locate_on_edges, nearest_node, snap_to_edge};
pub use pca::{Pca, standardize, symmetric_eigen};
pub use reach::{BuildingReach, BuildingReachReport, PoiReach, PoiReachReport, ReachEngine};
pub use region::{FALLBACK_RADIUS_FACTOR, Region, isochron, isochron_from_reach, region_from_boundary};
