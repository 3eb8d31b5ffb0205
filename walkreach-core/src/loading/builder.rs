use geo::{Coord, LineString, MultiLineString};
use hashbrown::HashSet;
use itertools::Itertools;
use log::{info, warn};
use petgraph::unionfind::UnionFind;
use petgraph::visit::NodeIndexable;

use crate::{Error, model::StreetEdge, model::StreetGraph};

/// Raw street segment: one logical street feature
#[derive(Debug, Clone, PartialEq)]
pub struct StreetSegment {
    /// One or more connected polylines
    pub geometry: MultiLineString<f64>,
    /// Total length in meters
    pub length: f64,
    /// Total walking time in minutes
    pub time: f64,
}

impl StreetSegment {
    pub fn new(geometry: impl Into<MultiLineString<f64>>, length: f64, time: f64) -> Self {
        Self {
            geometry: geometry.into(),
            length,
            time,
        }
    }

    pub fn from_coords(coords: &[(f64, f64)], length: f64, time: f64) -> Self {
        Self::new(LineString::from(coords.to_vec()), length, time)
    }
}

/// Options of the graph builder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Insert every `(x, y)` as `(y, x)`
    pub swap_xy: bool,
}

/// Builds the undirected street graph from raw segments.
///
/// Every pair of consecutive coordinates becomes an edge carrying the
/// *whole* segment's length and time; weights are not divided between the
/// pieces of a multi-point segment. Coordinates are merged only on exact
/// equality.
///
/// # Errors
///
/// Returns an error if a weight is negative or not finite, or a coordinate
/// is not finite
pub fn build_street_graph(
    segments: &[StreetSegment],
    options: &BuildOptions,
) -> Result<StreetGraph, Error> {
    let mut graph = StreetGraph::new();

    for (index, segment) in segments.iter().enumerate() {
        let weight = validated_weight(index, segment.length, segment.time)?;

        for line in &segment.geometry {
            for (from, to) in line.coords().tuple_windows() {
                let a = graph.intern_node(oriented(*from, options))?;
                let b = graph.intern_node(oriented(*to, options))?;
                graph.upsert_edge(a, b, weight);
            }
        }
    }

    info!(
        "Built street graph with {} nodes and {} edges from {} segments",
        graph.node_count(),
        graph.edge_count(),
        segments.len()
    );

    let components = count_components(&graph);
    if components > 1 {
        warn!(
            "Street graph has {components} disconnected components. \
            Locations in small components reach little; near-duplicate \
            coordinates in the source data are a common cause."
        );
    }

    Ok(graph)
}

fn oriented(coord: Coord<f64>, options: &BuildOptions) -> Coord<f64> {
    if options.swap_xy {
        Coord {
            x: coord.y,
            y: coord.x,
        }
    } else {
        coord
    }
}

/// Checks that both weights are finite and non-negative
pub(crate) fn validated_weight(
    segment: usize,
    length: f64,
    time: f64,
) -> Result<StreetEdge, Error> {
    for (metric, value) in [("length", length), ("time", time)] {
        if !value.is_finite() {
            return Err(Error::InvalidWeight { metric, segment });
        }
        if value < 0.0 {
            return Err(Error::NegativeWeight {
                metric,
                value,
                segment,
            });
        }
    }
    Ok(StreetEdge::new(length, time))
}

/// Number of connected components, isolated nodes included
pub fn count_components(graph: &StreetGraph) -> usize {
    let inner = graph.graph();
    let mut sets = UnionFind::<usize>::new(inner.node_bound());
    for edge in inner.edge_indices() {
        if let Some((a, b)) = inner.edge_endpoints(edge) {
            sets.union(a.index(), b.index());
        }
    }

    inner
        .node_indices()
        .map(|node| sets.find_mut(node.index()))
        .collect::<HashSet<_>>()
        .len()
}
