//! Run parameters: cost metric, snapping mode and reach strategy

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Edge weight used as the additive path cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostMetric {
    /// Meters
    Length,
    /// Minutes
    Time,
}

impl FromStr for CostMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length" => Ok(Self::Length),
            "time" => Ok(Self::Time),
            other => Err(Error::UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for CostMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length => f.write_str("length"),
            Self::Time => f.write_str("time"),
        }
    }
}

/// How an arbitrary location is resolved onto the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapMode {
    /// Nearest pre-existing node, graph untouched
    Node,
    /// Projection onto the nearest edge, which is split in two
    Edge,
}

impl FromStr for SnapMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Self::Node),
            "edge" => Ok(Self::Edge),
            other => Err(Error::UnknownSnapMode(other.to_string())),
        }
    }
}

/// Name of a region derivation strategy, as found in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Isochron,
    Absolute,
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "isochron" => Ok(Self::Isochron),
            "absolute" => Ok(Self::Absolute),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

/// Region derivation strategy for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Convex hull of the reachable boundary, membership by point-in-polygon
    Isochron { snap: SnapMode },
    /// Every location merged into the graph first, membership by node id
    Absolute,
}

impl Strategy {
    /// The absolute strategy always snaps to edges, `snap` only matters
    /// for the isochron strategy.
    pub fn new(kind: StrategyKind, snap: SnapMode) -> Self {
        match kind {
            StrategyKind::Isochron => Self::Isochron { snap },
            StrategyKind::Absolute => Self::Absolute,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Isochron { .. } => StrategyKind::Isochron,
            Self::Absolute => StrategyKind::Absolute,
        }
    }
}

/// Cost metric and budget of a reachability query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachParams {
    pub metric: CostMetric,
    pub budget: f64,
}

impl ReachParams {
    /// # Errors
    ///
    /// Returns an error if the budget is negative or not finite
    pub fn new(metric: CostMetric, budget: f64) -> Result<Self, Error> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(Error::InvalidData(format!(
                "Reach budget must be a finite non-negative number, got {budget}"
            )));
        }
        Ok(Self { metric, budget })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("length".parse::<CostMetric>().unwrap(), CostMetric::Length);
        assert_eq!("time".parse::<CostMetric>().unwrap(), CostMetric::Time);
        assert_eq!("edge".parse::<SnapMode>().unwrap(), SnapMode::Edge);
        assert_eq!(
            "absolute".parse::<StrategyKind>().unwrap(),
            StrategyKind::Absolute
        );
    }

    #[test]
    fn unknown_names_are_errors() {
        assert!(matches!(
            "distance".parse::<CostMetric>(),
            Err(Error::UnknownMetric(_))
        ));
        assert!(matches!(
            "egde".parse::<SnapMode>(),
            Err(Error::UnknownSnapMode(_))
        ));
        assert!(matches!(
            "hull".parse::<StrategyKind>(),
            Err(Error::UnknownStrategy(_))
        ));
    }

    #[test]
    fn negative_budget_is_rejected() {
        assert!(ReachParams::new(CostMetric::Length, -1.0).is_err());
        assert!(ReachParams::new(CostMetric::Time, f64::NAN).is_err());
        assert!(ReachParams::new(CostMetric::Time, 0.0).is_ok());
    }

    #[test]
    fn absolute_ignores_snap_mode() {
        assert_eq!(
            Strategy::new(StrategyKind::Absolute, SnapMode::Node),
            Strategy::Absolute
        );
        assert_eq!(
            Strategy::new(StrategyKind::Isochron, SnapMode::Node).kind(),
            StrategyKind::Isochron
        );
    }
}
