//! Street network components - nodes and edges

use geo::Point;

use crate::{Length, WalkingTime, model::CostMetric};

/// Street graph node, identified by its exact planar position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreetNode {
    /// Node coordinates
    pub geometry: Point<f64>,
}

/// Street graph edge (street segment or a piece of one)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreetEdge {
    pub length: Length,
    pub time: WalkingTime,
}

impl StreetEdge {
    pub fn new(length: Length, time: WalkingTime) -> Self {
        Self { length, time }
    }

    /// Weight of the edge under the given cost metric
    pub fn cost(&self, metric: CostMetric) -> f64 {
        match metric {
            CostMetric::Length => self.length,
            CostMetric::Time => self.time,
        }
    }
}
