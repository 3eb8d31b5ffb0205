use std::collections::BinaryHeap;

use geo::{LineString, Point};
use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use super::state::State;
use crate::{CostMetric, Error, model::StreetGraph};

/// Node sequence of a shortest path with its total cost
#[derive(Debug, Clone, PartialEq)]
pub struct WalkingPath {
    pub nodes: Vec<NodeIndex>,
    pub cost: f64,
}

impl WalkingPath {
    /// Path geometry through the node positions
    pub fn to_line_string(&self, graph: &StreetGraph) -> LineString<f64> {
        self.nodes
            .iter()
            .filter_map(|&node| graph.node_position(node))
            .map(|point| point.0)
            .collect()
    }
}

/// Dijkstra from `start` stopping at `target`.
/// Returns `None` when `target` is not connected to `start`.
///
/// # Errors
///
/// Returns an error if either node is not in the graph
pub fn shortest_path(
    graph: &StreetGraph,
    start: NodeIndex,
    target: NodeIndex,
    metric: CostMetric,
) -> Result<Option<WalkingPath>, Error> {
    let inner = graph.graph();
    if inner.node_weight(start).is_none() || inner.node_weight(target).is_none() {
        return Err(Error::InvalidNodeIndex);
    }

    let mut distances: HashMap<NodeIndex, f64> = HashMap::new();
    let mut predecessors: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut heap = BinaryHeap::new();

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            break;
        }

        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        for (next, edge) in graph.edges(node) {
            let next_cost = cost + edge.cost(metric);
            let improved = distances.get(&next).is_none_or(|&known| next_cost < known);
            if improved {
                distances.insert(next, next_cost);
                predecessors.insert(next, node);
                heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    let Some(&cost) = distances.get(&target) else {
        return Ok(None);
    };

    // Follow predecessors backward from target to start
    let mut nodes = vec![target];
    let mut current = target;
    while current != start {
        match predecessors.get(&current) {
            Some(&previous) => {
                nodes.push(previous);
                current = previous;
            }
            None => return Ok(None),
        }
    }
    nodes.reverse();

    Ok(Some(WalkingPath { nodes, cost }))
}

/// Shortest path between the nearest nodes of two arbitrary points
///
/// # Errors
///
/// Returns [`Error::EmptyGraph`] if the graph has no nodes
pub fn shortest_path_between_points(
    graph: &StreetGraph,
    from: &Point<f64>,
    to: &Point<f64>,
    metric: CostMetric,
) -> Result<Option<WalkingPath>, Error> {
    let start = graph.nearest_node(from)?;
    let target = graph.nearest_node(to)?;
    shortest_path(graph, start, target, metric)
}

#[cfg(test)]
mod tests {
    use geo::{coord, point};

    use super::*;
    use crate::loading::{BuildOptions, StreetSegment, build_street_graph};

    /// Short but slow street vs long but fast detour between (0,0) and (10,0)
    fn two_routes() -> StreetGraph {
        let segments = vec![
            StreetSegment::from_coords(&[(0.0, 0.0), (10.0, 0.0)], 10.0, 9.0),
            StreetSegment::from_coords(&[(0.0, 0.0), (5.0, 5.0)], 8.0, 1.0),
            StreetSegment::from_coords(&[(5.0, 5.0), (10.0, 0.0)], 8.0, 1.0),
            StreetSegment::from_coords(&[(50.0, 50.0), (60.0, 50.0)], 10.0, 1.0),
        ];
        build_street_graph(&segments, &BuildOptions::default()).unwrap()
    }

    #[test]
    fn metric_changes_the_route() {
        let graph = two_routes();
        let start = graph.node_at(coord! { x: 0.0, y: 0.0 }).unwrap();
        let end = graph.node_at(coord! { x: 10.0, y: 0.0 }).unwrap();

        let by_length = shortest_path(&graph, start, end, CostMetric::Length)
            .unwrap()
            .unwrap();
        assert_eq!(by_length.nodes, vec![start, end]);
        assert_eq!(by_length.cost, 10.0);

        let by_time = shortest_path(&graph, start, end, CostMetric::Time)
            .unwrap()
            .unwrap();
        assert_eq!(by_time.nodes.len(), 3);
        assert_eq!(by_time.cost, 2.0);
        assert_eq!(by_time.to_line_string(&graph).0.len(), 3);
    }

    #[test]
    fn disconnected_target_has_no_path() {
        let graph = two_routes();
        let path = shortest_path_between_points(
            &graph,
            &point! { x: 0.0, y: 1.0 },
            &point! { x: 55.0, y: 49.0 },
            CostMetric::Length,
        )
        .unwrap();
        assert!(path.is_none());
    }

    #[test]
    fn path_to_itself_is_trivial() {
        let graph = two_routes();
        let start = graph.node_at(coord! { x: 5.0, y: 5.0 }).unwrap();
        let path = shortest_path(&graph, start, start, CostMetric::Time)
            .unwrap()
            .unwrap();
        assert_eq!(path.nodes, vec![start]);
        assert_eq!(path.cost, 0.0);
    }
}
