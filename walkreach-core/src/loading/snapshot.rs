//! JSON snapshot of a street graph for reuse across runs

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use hashbrown::HashMap;
use log::info;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use super::builder::validated_weight;
use crate::{Error, model::StreetGraph};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: usize,
    pub target: usize,
    pub length: f64,
    pub time: f64,
}

/// Node positions in insertion order plus edges referring to them by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<[f64; 2]>,
    pub edges: Vec<SnapshotEdge>,
}

impl From<&StreetGraph> for GraphSnapshot {
    fn from(graph: &StreetGraph) -> Self {
        let inner = graph.graph();
        let mut positions: HashMap<NodeIndex, usize> = HashMap::with_capacity(inner.node_count());
        let mut nodes = Vec::with_capacity(inner.node_count());
        for node in inner.node_indices() {
            let point = inner[node].geometry;
            positions.insert(node, nodes.len());
            nodes.push([point.x(), point.y()]);
        }

        let edges = inner
            .edge_indices()
            .filter_map(|edge| {
                let (a, b) = inner.edge_endpoints(edge)?;
                let weight = inner[edge];
                Some(SnapshotEdge {
                    source: positions[&a],
                    target: positions[&b],
                    length: weight.length,
                    time: weight.time,
                })
            })
            .collect();

        Self { nodes, edges }
    }
}

impl GraphSnapshot {
    /// Rebuilds the graph, validating weights the way the builder does
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate node positions, dangling edge ends or
    /// invalid weights
    pub fn into_graph(self) -> Result<StreetGraph, Error> {
        let mut graph = StreetGraph::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for [x, y] in self.nodes {
            let before = graph.node_count();
            let node = graph.intern_node(geo::Coord { x, y })?;
            if graph.node_count() == before {
                return Err(Error::SnapshotError(format!(
                    "Duplicate node position ({x}, {y})"
                )));
            }
            nodes.push(node);
        }

        for (index, edge) in self.edges.into_iter().enumerate() {
            let weight = validated_weight(index, edge.length, edge.time)?;
            let (Some(&a), Some(&b)) = (nodes.get(edge.source), nodes.get(edge.target)) else {
                return Err(Error::SnapshotError(format!(
                    "Edge {index} refers to a missing node ({} - {})",
                    edge.source, edge.target
                )));
            };
            graph.upsert_edge(a, b, weight);
        }

        Ok(graph)
    }
}

impl StreetGraph {
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_snapshot(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), &GraphSnapshot::from(self))?;
        info!("Saved street graph snapshot to {}", path.display());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds an invalid graph
    pub fn load_snapshot(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open snapshot '{}': {}", path.display(), e),
            )
        })?;
        let snapshot: GraphSnapshot = serde_json::from_reader(BufReader::new(file))?;
        let graph = snapshot.into_graph()?;
        info!(
            "Loaded street graph snapshot with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}
