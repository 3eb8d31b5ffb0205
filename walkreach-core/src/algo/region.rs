//! Turning a reachable set into a region
//!
//! The isochron is the convex hull of the reachable set's boundary nodes. It
//! overestimates reach where the street network is concave. Where no hull can
//! be formed (dead ends, tiny budgets) a circle of `0.8 × budget` around the
//! source stands in.

use std::f64::consts::TAU;

use geo::{Area, Contains, ConvexHull, Coord, LineString, MultiPoint, Point, Polygon};
use petgraph::graph::NodeIndex;

use crate::{
    CostMetric, Error,
    model::StreetGraph,
    routing::{ReachableSet, reachable},
};

/// Radius of the fallback circle relative to the budget
pub const FALLBACK_RADIUS_FACTOR: f64 = 0.8;

const CIRCLE_SEGMENTS: usize = 64;

/// Region reachable from a source
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// Convex hull of the boundary nodes
    Isochron(Polygon<f64>),
    /// Fallback circle around the source
    Buffer { center: Point<f64>, radius: f64 },
}

impl Region {
    /// Circle of `0.8 × budget` around `center`
    pub fn fallback(center: Point<f64>, budget: f64) -> Self {
        Self::Buffer {
            center,
            radius: FALLBACK_RADIUS_FACTOR * budget,
        }
    }

    /// Strict interior test: points on the boundary are outside
    pub fn contains(&self, point: &Point<f64>) -> bool {
        match self {
            Self::Isochron(polygon) => polygon.contains(point),
            Self::Buffer { center, radius } => {
                (point.x() - center.x()).hypot(point.y() - center.y()) < *radius
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Buffer { .. })
    }

    /// Polygon geometry, the circle approximated with 64 segments
    pub fn to_polygon(&self) -> Polygon<f64> {
        match self {
            Self::Isochron(polygon) => polygon.clone(),
            Self::Buffer { center, radius } => {
                let ring: LineString<f64> = (0..CIRCLE_SEGMENTS)
                    .map(|step| {
                        let angle = TAU * step as f64 / CIRCLE_SEGMENTS as f64;
                        Coord {
                            x: center.x() + radius * angle.cos(),
                            y: center.y() + radius * angle.sin(),
                        }
                    })
                    .collect();
                // Polygon::new closes the ring
                Polygon::new(ring, vec![])
            }
        }
    }
}

/// Hull of `boundary`, or the fallback circle when fewer than 3 points are
/// given or they are collinear
pub fn region_from_boundary(boundary: &[Point<f64>], source: Point<f64>, budget: f64) -> Region {
    if boundary.len() < 3 {
        return Region::fallback(source, budget);
    }

    let hull = MultiPoint::new(boundary.to_vec()).convex_hull();
    if hull.unsigned_area() > 0.0 {
        Region::Isochron(hull)
    } else {
        Region::fallback(source, budget)
    }
}

/// Region of an already computed reachable set
///
/// # Errors
///
/// Returns an error if the set's source is not in `graph`
pub fn isochron_from_reach(graph: &StreetGraph, reach: &ReachableSet) -> Result<Region, Error> {
    let source = graph
        .node_position(reach.source())
        .ok_or(Error::InvalidNodeIndex)?;
    let boundary: Vec<Point<f64>> = reach
        .boundary_nodes(graph)
        .into_iter()
        .filter_map(|node| graph.node_position(node))
        .collect();

    Ok(region_from_boundary(&boundary, source, reach.budget()))
}

/// Reachability search followed by region derivation
///
/// # Errors
///
/// Returns an error if `source` is not in `graph` or the budget is invalid
pub fn isochron(
    graph: &StreetGraph,
    source: NodeIndex,
    metric: CostMetric,
    budget: f64,
) -> Result<Region, Error> {
    let reach = reachable(graph, source, metric, budget)?;
    isochron_from_reach(graph, &reach)
}
