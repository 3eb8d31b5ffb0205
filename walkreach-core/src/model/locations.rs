//! Points of interest, residential buildings and their network positions

use geo::{Geometry, Point};
use petgraph::graph::NodeIndex;

/// Stable identifier of a POI or building
pub type LocationId = i64;

/// Point of interest (park, school, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: LocationId,
    pub geometry: Point<f64>,
    /// Category used for aggregation and scoring
    pub subgroup: String,
}

/// Residential building
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: LocationId,
    pub geometry: Point<f64>,
    pub floors: u32,
    pub apartments: u32,
}

/// A named table of POIs, e.g. all parks
#[derive(Debug, Clone, PartialEq)]
pub struct PoiCollection {
    pub name: String,
    pub pois: Vec<Poi>,
}

impl PoiCollection {
    pub fn new(name: impl Into<String>, pois: Vec<Poi>) -> Self {
        Self {
            name: name.into(),
            pois,
        }
    }
}

/// How a [`LocatedPoint`] was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    /// Pre-existing nearest node
    Node,
    /// Node inserted on (or coinciding with an endpoint of) the nearest edge
    Edge,
}

/// A location paired with its resolved network node.
///
/// Resolve once and keep it: snapping again after further graph mutation can
/// yield a different node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatedPoint {
    pub point: Point<f64>,
    pub node: NodeIndex,
    pub kind: SnapKind,
}

/// Representative point of a location geometry.
///
/// Multi-points are located by their first member.
pub fn location_point(geometry: &Geometry<f64>) -> Option<Point<f64>> {
    match geometry {
        Geometry::Point(point) => Some(*point),
        Geometry::MultiPoint(points) => points.0.first().copied(),
        _ => None,
    }
}
