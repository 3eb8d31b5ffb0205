//! Shortest-path searches over the street graph

mod reachability;
mod shortest_path;
mod state;

pub use reachability::{ReachableSet, reachable};
pub use shortest_path::{WalkingPath, shortest_path, shortest_path_between_points};
