use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::graph::NodeIndex;
use petgraph::visit::NodeIndexable;

use super::state::State;
use crate::{CostMetric, Error, model::StreetGraph};

/// Nodes reachable from a source within a budget, with their costs
#[derive(Debug, Clone)]
pub struct ReachableSet {
    source: NodeIndex,
    metric: CostMetric,
    budget: f64,
    costs: HashMap<NodeIndex, f64>,
}

impl ReachableSet {
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    pub fn metric(&self) -> CostMetric {
        self.metric
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Always at least one: the source
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.costs.contains_key(&node)
    }

    pub fn cost(&self, node: NodeIndex) -> Option<f64> {
        self.costs.get(&node).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, f64)> + '_ {
        self.costs.iter().map(|(&node, &cost)| (node, cost))
    }

    /// Reached nodes with at least one neighbour outside the set, in node
    /// index order
    pub fn boundary_nodes(&self, graph: &StreetGraph) -> Vec<NodeIndex> {
        let mut boundary: Vec<NodeIndex> = self
            .costs
            .keys()
            .copied()
            .filter(|&node| graph.neighbors(node).any(|next| !self.contains(next)))
            .collect();
        boundary.sort_unstable();
        boundary
    }

    /// Reached nodes as a bit set over the graph's node indices
    pub fn membership(&self, graph: &StreetGraph) -> FixedBitSet {
        let mut members = FixedBitSet::with_capacity(graph.graph().node_bound());
        for node in self.costs.keys() {
            members.insert(node.index());
        }
        members
    }
}

/// Cost-bounded Dijkstra from `source`.
///
/// Nodes whose shortest cost exceeds `budget` are neither returned nor
/// expanded. The source is always present with cost 0.
///
/// # Errors
///
/// Returns an error if `source` is not in the graph or the budget is negative
/// or not finite
pub fn reachable(
    graph: &StreetGraph,
    source: NodeIndex,
    metric: CostMetric,
    budget: f64,
) -> Result<ReachableSet, Error> {
    if graph.graph().node_weight(source).is_none() {
        return Err(Error::InvalidNodeIndex);
    }
    if !budget.is_finite() || budget < 0.0 {
        return Err(Error::InvalidData(format!(
            "Reach budget must be a finite non-negative number, got {budget}"
        )));
    }

    let mut costs: HashMap<NodeIndex, f64> = HashMap::new();
    let mut heap = BinaryHeap::new();

    heap.push(State {
        cost: 0.0,
        node: source,
    });
    costs.insert(source, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if let Some(&best) = costs.get(&node) {
            if cost > best {
                continue;
            }
        }

        for (next, edge) in graph.edges(node) {
            let next_cost = cost + edge.cost(metric);
            if next_cost > budget {
                continue;
            }

            match costs.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    Ok(ReachableSet {
        source,
        metric,
        budget,
        costs,
    })
}
