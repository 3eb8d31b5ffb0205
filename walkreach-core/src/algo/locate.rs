//! Resolving arbitrary locations onto the street graph

use geo::Point;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::{
    Error,
    model::{ExtendedGraph, LocatedPoint, SnapKind, StreetGraph},
};

/// Nearest existing node to `point`, see [`StreetGraph::nearest_node`]
///
/// # Errors
///
/// Returns [`Error::EmptyGraph`] if the graph has no nodes
pub fn nearest_node(graph: &StreetGraph, point: &Point<f64>) -> Result<NodeIndex, Error> {
    graph.nearest_node(point)
}

/// Inserts `point` on its nearest edge, see [`ExtendedGraph::snap_to_edge`]
///
/// # Errors
///
/// Returns [`Error::EmptyGraph`] if the graph has no edges
pub fn snap_to_edge(graph: &mut ExtendedGraph, point: &Point<f64>) -> Result<NodeIndex, Error> {
    graph.snap_to_edge(point)
}

/// Node-snaps every point. Read-only, so lookups run in parallel.
///
/// # Errors
///
/// Returns [`Error::EmptyGraph`] if the graph has no nodes
pub fn locate_at_nodes(
    graph: &StreetGraph,
    points: &[Point<f64>],
) -> Result<Vec<LocatedPoint>, Error> {
    points
        .par_iter()
        .map(|point| {
            Ok(LocatedPoint {
                point: *point,
                node: graph.nearest_node(point)?,
                kind: SnapKind::Node,
            })
        })
        .collect()
}

/// Edge-snaps every point sequentially, in slice order.
///
/// # Errors
///
/// Returns [`Error::EmptyGraph`] if the graph has no edges
pub fn locate_on_edges(
    graph: &mut ExtendedGraph,
    points: &[Point<f64>],
) -> Result<Vec<LocatedPoint>, Error> {
    let located = points
        .iter()
        .map(|point| {
            let node = graph.snap_to_edge(point)?;
            log::trace!("Snapped {point:?} to node {node:?}");
            Ok(LocatedPoint {
                point: *point,
                node,
                kind: SnapKind::Edge,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    log::debug!(
        "Snapped {} locations, graph now has {} nodes",
        located.len(),
        graph.node_count()
    );
    Ok(located)
}
