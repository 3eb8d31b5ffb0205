//! Street graph with coordinate interning and spatial indices

use geo::{Coord, Line, LineLocatePoint, Point};
use hashbrown::HashMap;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::{GeomWithData, Line as IndexedLine};

use super::components::{StreetEdge, StreetNode};
use crate::Error;

/// Node position stored in the node R-tree
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;
/// Edge geometry stored in the edge R-tree
pub type IndexedSegment = GeomWithData<IndexedLine<[f64; 2]>, EdgeIndex>;

/// Exact bit pattern of a coordinate. `-0.0` and `0.0` share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordKey(u64, u64);

impl CoordKey {
    fn new(coord: Coord<f64>) -> Self {
        Self(canonical_bits(coord.x), canonical_bits(coord.y))
    }
}

fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 { 0.0f64.to_bits() } else { value.to_bits() }
}

/// Undirected pedestrian network.
///
/// A node is its position: inserting the same coordinate twice yields the
/// same node. Nodes are never removed, so node indices are dense and reflect
/// insertion order. Edges can be removed by edge snapping (see
/// [`ExtendedGraph`](super::ExtendedGraph)), which is why the graph is a
/// `StableGraph`.
#[derive(Debug, Clone, Default)]
pub struct StreetGraph {
    pub(crate) graph: StableUnGraph<StreetNode, StreetEdge>,
    node_lookup: HashMap<CoordKey, NodeIndex>,
    node_tree: RTree<IndexedPoint>,
    edge_tree: RTree<IndexedSegment>,
}

impl StreetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &StableUnGraph<StreetNode, StreetEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_position(&self, node: NodeIndex) -> Option<Point<f64>> {
        self.graph.node_weight(node).map(|n| n.geometry)
    }

    /// Node located exactly at `coord`, if any
    pub fn node_at(&self, coord: Coord<f64>) -> Option<NodeIndex> {
        self.node_lookup.get(&CoordKey::new(coord)).copied()
    }

    pub fn edge_between(&self, a: NodeIndex, b: NodeIndex) -> Option<StreetEdge> {
        self.graph
            .find_edge(a, b)
            .and_then(|e| self.graph.edge_weight(e))
            .copied()
    }

    /// Neighbours of `node` with the connecting edge
    pub fn edges(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, &StreetEdge)> + '_ {
        self.graph.edges(node).map(move |edge| {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            (other, edge.weight())
        })
    }

    pub fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.edges(node).map(|(other, _)| other)
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Returns the node at `coord`, creating it when absent
    pub(crate) fn intern_node(&mut self, coord: Coord<f64>) -> Result<NodeIndex, Error> {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(Error::InvalidCoordinate {
                x: coord.x,
                y: coord.y,
            });
        }

        let key = CoordKey::new(coord);
        if let Some(&node) = self.node_lookup.get(&key) {
            return Ok(node);
        }

        let node = self.graph.add_node(StreetNode {
            geometry: coord.into(),
        });
        self.node_lookup.insert(key, node);
        self.node_tree
            .insert(IndexedPoint::new([coord.x, coord.y], node));
        Ok(node)
    }

    /// Connects `a` and `b`. An existing edge between them takes the new weights.
    pub(crate) fn upsert_edge(&mut self, a: NodeIndex, b: NodeIndex, weight: StreetEdge) -> EdgeIndex {
        if let Some(edge) = self.graph.find_edge(a, b) {
            self.graph[edge] = weight;
            return edge;
        }

        let edge = self.graph.add_edge(a, b, weight);
        let segment = self.indexed_segment(a, b, edge);
        self.edge_tree.insert(segment);
        edge
    }

    /// Connects `a` and `b`, keeping the smaller length and time where an
    /// edge between them already exists
    fn connect_cheapest(&mut self, a: NodeIndex, b: NodeIndex, weight: StreetEdge) -> EdgeIndex {
        match self.graph.find_edge(a, b) {
            Some(edge) => {
                let existing = &mut self.graph[edge];
                existing.length = existing.length.min(weight.length);
                existing.time = existing.time.min(weight.time);
                edge
            }
            None => self.upsert_edge(a, b, weight),
        }
    }

    pub(crate) fn remove_edge(&mut self, edge: EdgeIndex) -> Option<StreetEdge> {
        let (a, b) = self.graph.edge_endpoints(edge)?;
        let segment = self.indexed_segment(a, b, edge);
        self.edge_tree.remove(&segment);
        self.graph.remove_edge(edge)
    }

    fn indexed_segment(&self, a: NodeIndex, b: NodeIndex, edge: EdgeIndex) -> IndexedSegment {
        let from = self.graph[a].geometry;
        let to = self.graph[b].geometry;
        IndexedSegment::new(
            IndexedLine::new([from.x(), from.y()], [to.x(), to.y()]),
            edge,
        )
    }

    /// Node minimizing the Euclidean distance to `point`.
    ///
    /// Among equidistant nodes the one inserted first wins, which matches a
    /// linear scan in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyGraph`] if the graph has no nodes
    pub fn nearest_node(&self, point: &Point<f64>) -> Result<NodeIndex, Error> {
        let query = [point.x(), point.y()];
        let mut candidates = self.node_tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = candidates.next().ok_or(Error::EmptyGraph)?;

        let mut chosen = first.data;
        for (candidate, distance) in candidates {
            if distance > best {
                break;
            }
            chosen = chosen.min(candidate.data);
        }
        Ok(chosen)
    }

    /// Edge minimizing the point-to-segment distance to `point`, lowest
    /// edge index on ties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyGraph`] if the graph has no edges
    pub fn nearest_edge(&self, point: &Point<f64>) -> Result<EdgeIndex, Error> {
        let query = [point.x(), point.y()];
        let mut candidates = self.edge_tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = candidates.next().ok_or(Error::EmptyGraph)?;

        let mut chosen = first.data;
        for (candidate, distance) in candidates {
            if distance > best {
                break;
            }
            chosen = chosen.min(candidate.data);
        }
        Ok(chosen)
    }

    /// Projects `point` onto its nearest edge `(u, v)` and replaces that edge
    /// with `(u, new)` and `(new, v)`.
    ///
    /// Lengths are split at the projection; times follow the length ratio.
    /// A projection landing on `u` or `v` returns that endpoint and leaves the
    /// graph untouched. When the projection hits another existing node, edges
    /// already joining it to `u` or `v` keep their cheaper weights.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if `point` cannot be projected
    pub(crate) fn split_nearest_edge(&mut self, point: &Point<f64>) -> Result<NodeIndex, Error> {
        let invalid = || Error::InvalidCoordinate {
            x: point.x(),
            y: point.y(),
        };
        if !point.x().is_finite() || !point.y().is_finite() {
            return Err(invalid());
        }

        let edge = self.nearest_edge(point)?;
        let (u, v) = self
            .graph
            .edge_endpoints(edge)
            .ok_or(Error::InvalidNodeIndex)?;
        let weight = self.graph[edge];
        let start = self.graph[u].geometry;
        let end = self.graph[v].geometry;

        if start == end {
            return Ok(u);
        }

        let segment = Line::new(start, end);
        let fraction = segment
            .line_locate_point(point)
            .ok_or_else(invalid)?
            .clamp(0.0, 1.0);
        if fraction <= 0.0 {
            return Ok(u);
        }
        if fraction >= 1.0 {
            return Ok(v);
        }

        let projected = segment.start + segment.delta() * fraction;
        let new_node = self.intern_node(projected)?;
        if new_node == u || new_node == v {
            return Ok(new_node);
        }

        let head_length = weight.length * fraction;
        let tail_length = weight.length - head_length;
        // Time is divided by the length ratio, whatever metric is used later
        let ratio = if weight.length > 0.0 {
            head_length / weight.length
        } else {
            fraction
        };
        let head_time = weight.time * ratio;
        let tail_time = weight.time - head_time;

        self.remove_edge(edge);
        self.connect_cheapest(u, new_node, StreetEdge::new(head_length, head_time));
        self.connect_cheapest(new_node, v, StreetEdge::new(tail_length, tail_time));

        log::trace!(
            "Split edge {u:?}-{v:?} at fraction {fraction:.3}, inserted node {new_node:?}"
        );
        Ok(new_node)
    }
}

#[cfg(test)]
mod tests {
    use geo::{coord, point};

    use super::*;

    fn line_graph() -> (StreetGraph, NodeIndex, NodeIndex) {
        let mut graph = StreetGraph::new();
        let a = graph.intern_node(coord! { x: 0.0, y: 0.0 }).unwrap();
        let b = graph.intern_node(coord! { x: 10.0, y: 0.0 }).unwrap();
        graph.upsert_edge(a, b, StreetEdge::new(10.0, 2.0));
        (graph, a, b)
    }

    #[test]
    fn identical_coordinates_share_a_node() {
        let mut graph = StreetGraph::new();
        let a = graph.intern_node(coord! { x: 1.5, y: 2.5 }).unwrap();
        let b = graph.intern_node(coord! { x: 1.5, y: 2.5 }).unwrap();
        let zero = graph.intern_node(coord! { x: 0.0, y: 0.0 }).unwrap();
        let negative_zero = graph.intern_node(coord! { x: -0.0, y: 0.0 }).unwrap();
        assert_eq!(a, b);
        assert_eq!(zero, negative_zero);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn near_duplicates_stay_distinct() {
        let mut graph = StreetGraph::new();
        let a = graph.intern_node(coord! { x: 1.0, y: 1.0 }).unwrap();
        let b = graph
            .intern_node(coord! { x: 1.0 + f64::EPSILON, y: 1.0 })
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let mut graph = StreetGraph::new();
        assert!(matches!(
            graph.intern_node(coord! { x: f64::NAN, y: 0.0 }),
            Err(Error::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn repeated_edge_takes_latest_weights() {
        let (mut graph, a, b) = line_graph();
        graph.upsert_edge(b, a, StreetEdge::new(7.0, 1.0));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_between(a, b), Some(StreetEdge::new(7.0, 1.0)));
    }

    #[test]
    fn nearest_node_prefers_first_inserted_on_ties() {
        let (graph, a, _) = line_graph();
        assert_eq!(graph.nearest_node(&point! { x: 5.0, y: 3.0 }).unwrap(), a);
    }

    #[test]
    fn nearest_node_on_empty_graph_fails() {
        let graph = StreetGraph::new();
        assert!(matches!(
            graph.nearest_node(&point! { x: 0.0, y: 0.0 }),
            Err(Error::EmptyGraph)
        ));
        assert!(matches!(
            graph.nearest_edge(&point! { x: 0.0, y: 0.0 }),
            Err(Error::EmptyGraph)
        ));
    }

    #[test]
    fn split_divides_weights_proportionally() {
        let (mut graph, a, b) = line_graph();
        let new = graph.split_nearest_edge(&point! { x: 2.5, y: 4.0 }).unwrap();

        assert_eq!(graph.node_position(new), Some(point! { x: 2.5, y: 0.0 }));
        assert!(graph.edge_between(a, b).is_none());
        let head = graph.edge_between(a, new).unwrap();
        let tail = graph.edge_between(new, b).unwrap();
        assert!((head.length - 2.5).abs() < 1e-9);
        assert!((head.length + tail.length - 10.0).abs() < 1e-9);
        assert!((head.time - 0.5).abs() < 1e-9);
        assert!((head.time + tail.time - 2.0).abs() < 1e-9);
    }

    #[test]
    fn split_beyond_endpoint_returns_endpoint() {
        let (mut graph, _, b) = line_graph();
        let node = graph.split_nearest_edge(&point! { x: 14.0, y: 1.0 }).unwrap();
        assert_eq!(node, b);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn split_of_zero_length_edge_does_not_divide_by_zero() {
        let mut graph = StreetGraph::new();
        let a = graph.intern_node(coord! { x: 0.0, y: 0.0 }).unwrap();
        let b = graph.intern_node(coord! { x: 10.0, y: 0.0 }).unwrap();
        graph.upsert_edge(a, b, StreetEdge::new(0.0, 3.0));

        let new = graph.split_nearest_edge(&point! { x: 4.0, y: 0.0 }).unwrap();
        let head = graph.edge_between(a, new).unwrap();
        let tail = graph.edge_between(new, b).unwrap();
        assert_eq!(head.length, 0.0);
        assert_eq!(tail.length, 0.0);
        assert!((head.time - 1.2).abs() < 1e-9);
        assert!(head.time.is_finite() && tail.time.is_finite());
    }

    #[test]
    fn nearest_edge_prefers_lowest_index_on_ties() {
        let mut graph = StreetGraph::new();
        let a = graph.intern_node(coord! { x: 0.0, y: 4.0 }).unwrap();
        let b = graph.intern_node(coord! { x: 10.0, y: 4.0 }).unwrap();
        let c = graph.intern_node(coord! { x: 0.0, y: 0.0 }).unwrap();
        let d = graph.intern_node(coord! { x: 10.0, y: 0.0 }).unwrap();
        let upper = graph.upsert_edge(a, b, StreetEdge::new(10.0, 2.0));
        let lower = graph.upsert_edge(c, d, StreetEdge::new(10.0, 2.0));
        assert!(upper < lower);

        let query = point! { x: 5.0, y: 2.0 };
        assert_eq!(graph.nearest_edge(&query).unwrap(), upper);

        let new = graph.split_nearest_edge(&query).unwrap();
        assert_eq!(graph.node_position(new), Some(point! { x: 5.0, y: 4.0 }));
        assert!(graph.edge_between(a, b).is_none());
        assert_eq!(graph.edge_between(c, d), Some(StreetEdge::new(10.0, 2.0)));
    }

    #[test]
    fn split_onto_existing_node_keeps_shorter_street() {
        let (mut graph, a, b) = line_graph();
        let middle = graph.intern_node(coord! { x: 5.0, y: 0.0 }).unwrap();
        graph.upsert_edge(a, middle, StreetEdge::new(2.0, 0.4));

        let node = graph.split_nearest_edge(&point! { x: 5.0, y: 1.0 }).unwrap();
        assert_eq!(node, middle);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.edge_between(a, b).is_none());
        assert_eq!(graph.edge_between(a, middle), Some(StreetEdge::new(2.0, 0.4)));
        assert_eq!(graph.edge_between(middle, b), Some(StreetEdge::new(5.0, 1.0)));
    }

    #[test]
    fn split_of_unprojectable_point_fails() {
        let (mut graph, _, _) = line_graph();
        assert!(matches!(
            graph.split_nearest_edge(&point! { x: 5.0, y: f64::NAN }),
            Err(Error::InvalidCoordinate { .. })
        ));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn split_keeps_edge_index_consistent() {
        let (mut graph, _, _) = line_graph();
        graph.split_nearest_edge(&point! { x: 5.0, y: 1.0 }).unwrap();
        let second = graph.split_nearest_edge(&point! { x: 7.5, y: -1.0 }).unwrap();
        assert_eq!(graph.node_position(second), Some(point! { x: 7.5, y: 0.0 }));
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.node_count(), 4);
    }
}
