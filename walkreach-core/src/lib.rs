//! Pedestrian accessibility engine: cost-bounded reach between buildings and
//! points of interest over a street network, and per-building service indices.

pub mod algo;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

use petgraph::graph::NodeIndex;

pub use error::Error;
pub use model::{CostMetric, SnapMode, Strategy};

pub type StreetNodeId = NodeIndex;
/// Meters
pub type Length = f64;
/// Minutes
pub type WalkingTime = f64;
