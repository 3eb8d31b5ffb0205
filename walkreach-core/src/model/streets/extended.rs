//! Street graph extended with snapped locations

use std::ops::Deref;

use geo::Point;
use petgraph::graph::NodeIndex;

use super::network::StreetGraph;
use crate::Error;

/// A street graph into which locations have been merged by edge snapping.
///
/// Derived from a base [`StreetGraph`] which stays untouched. Mutation is only
/// possible through [`ExtendedGraph::snap_to_edge`]; reads go through `Deref`.
#[derive(Debug, Clone)]
pub struct ExtendedGraph {
    graph: StreetGraph,
    inserted: usize,
}

impl ExtendedGraph {
    pub fn from_base(base: &StreetGraph) -> Self {
        Self {
            graph: base.clone(),
            inserted: 0,
        }
    }

    /// Resolves `point` onto its nearest edge, splitting that edge.
    ///
    /// Not idempotent: snapping a nearby point after other insertions may pick
    /// another edge. Keep the returned node instead of snapping again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyGraph`] if the graph has no edges, or
    /// [`Error::InvalidCoordinate`] for a non-finite point
    pub fn snap_to_edge(&mut self, point: &Point<f64>) -> Result<NodeIndex, Error> {
        let before = self.graph.node_count();
        let node = self.graph.split_nearest_edge(point)?;
        if self.graph.node_count() > before {
            self.inserted += 1;
        }
        Ok(node)
    }

    /// Snaps every point in order, returning one node per point
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyGraph`] if the graph has no edges
    pub fn extend_with<'a, I>(&mut self, points: I) -> Result<Vec<NodeIndex>, Error>
    where
        I: IntoIterator<Item = &'a Point<f64>>,
    {
        points
            .into_iter()
            .map(|point| self.snap_to_edge(point))
            .collect()
    }

    /// Number of nodes created by snapping
    pub fn inserted_nodes(&self) -> usize {
        self.inserted
    }

    pub fn into_inner(self) -> StreetGraph {
        self.graph
    }
}

impl Deref for ExtendedGraph {
    type Target = StreetGraph;

    fn deref(&self) -> &Self::Target {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use geo::point;

    use super::*;
    use crate::loading::{BuildOptions, StreetSegment, build_street_graph};

    #[test]
    fn extension_leaves_base_untouched() {
        let segments = vec![StreetSegment::from_coords(&[(0.0, 0.0), (10.0, 0.0)], 10.0, 2.0)];
        let base = build_street_graph(&segments, &BuildOptions::default()).unwrap();

        let mut extended = ExtendedGraph::from_base(&base);
        let nodes = extended
            .extend_with(&[point! { x: 3.0, y: 1.0 }, point! { x: 6.0, y: -1.0 }])
            .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(extended.inserted_nodes(), 2);
        assert_eq!(extended.node_count(), 4);
        assert_eq!(base.node_count(), 2);
        assert_eq!(base.edge_count(), 1);
    }

    #[test]
    fn snapping_a_coincident_point_reuses_the_node() {
        let segments = vec![StreetSegment::from_coords(&[(0.0, 0.0), (10.0, 0.0)], 10.0, 2.0)];
        let base = build_street_graph(&segments, &BuildOptions::default()).unwrap();

        let mut extended = ExtendedGraph::from_base(&base);
        let first = extended.snap_to_edge(&point! { x: 4.0, y: 2.0 }).unwrap();
        let second = extended.snap_to_edge(&point! { x: 4.0, y: -2.0 }).unwrap();

        assert_eq!(first, second);
        assert_eq!(extended.inserted_nodes(), 1);
    }
}
