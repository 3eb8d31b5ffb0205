use std::cmp::Ordering;

use petgraph::graph::NodeIndex;

/// Heap entry of the cost-bounded searches
#[derive(Copy, Clone, PartialEq)]
pub(super) struct State {
    pub(super) cost: f64,
    pub(super) node: NodeIndex,
}

// Costs are finite and non-negative, never NaN
impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the cheapest entry, lower node first on ties
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
