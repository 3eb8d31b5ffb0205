//! TOML run configuration

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkreach_core::model::{CostMetric, ReachParams, SnapMode, Strategy, StrategyKind};

use crate::PipelineError;

/// One POI table and the collection name it is reported under
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoiSource {
    pub name: String,
    pub path: PathBuf,
}

/// Inputs, parameters and outputs of one batch run.
///
/// ```toml
/// streets = "data/pedestrian_network.csv"
/// buildings = "data/buildings.csv"
/// weights = "data/accessibility_weights.csv"
/// metric = "length"
/// budget = 800
/// strategy = "isochron"
/// snap = "edge"
///
/// [[pois]]
/// name = "parks"
/// path = "data/parks.csv"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Street segments: `geom`, `meters`, `minutes`
    pub streets: PathBuf,
    /// Buildings: `id`, `geom`, `floors`, `apartments`
    pub buildings: PathBuf,
    /// POI tables: `id`, `geom`, `subgroup`
    #[serde(default)]
    pub pois: Vec<PoiSource>,
    /// Weight table: `subgroup_id`, `gr_weights`, `sgr_weights`. Buildings
    /// are only scored when present.
    #[serde(default)]
    pub weights: Option<PathBuf>,
    #[serde(default = "default_metric")]
    pub metric: CostMetric,
    #[serde(default = "default_budget")]
    pub budget: f64,
    #[serde(default = "default_strategy")]
    pub strategy: StrategyKind,
    /// Only used by the isochron strategy
    #[serde(default = "default_snap")]
    pub snap: SnapMode,
    /// Street coordinates come in `(y, x)` order
    #[serde(default)]
    pub swap_xy: bool,
    /// Loaded when the file exists, written after building otherwise
    #[serde(default)]
    pub graph_snapshot: Option<PathBuf>,
    /// Also run the other strategy and write a per-POI comparison
    #[serde(default)]
    pub compare_strategies: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_metric() -> CostMetric {
    CostMetric::Length
}

fn default_budget() -> f64 {
    1000.0
}

fn default_strategy() -> StrategyKind {
    StrategyKind::Isochron
}

fn default_snap() -> SnapMode {
    SnapMode::Edge
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl RunConfig {
    /// Reads the configuration at `path`. Relative paths inside it resolve
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to read config '{}': {}", path.display(), e),
            )
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if `content` is not a valid configuration
    pub fn from_toml_str(content: &str) -> Result<Self, PipelineError> {
        let config: Self = toml::from_str(content)?;
        config.reach_params()?;
        Ok(config)
    }

    pub fn run_strategy(&self) -> Strategy {
        Strategy::new(self.strategy, self.snap)
    }

    /// # Errors
    ///
    /// Returns an error if the budget is negative or not finite
    pub fn reach_params(&self) -> Result<ReachParams, PipelineError> {
        Ok(ReachParams::new(self.metric, self.budget)?)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.streets);
        resolve(&mut self.buildings);
        resolve(&mut self.output_dir);
        for source in &mut self.pois {
            resolve(&mut source.path);
        }
        if let Some(path) = self.weights.as_mut() {
            resolve(path);
        }
        if let Some(path) = self.graph_snapshot.as_mut() {
            resolve(path);
        }
    }
}
