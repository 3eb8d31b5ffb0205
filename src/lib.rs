//! Batch accessibility runs: load tables, compute reach, write results.
//!
//! The algorithms live in [`walkreach_core`]; this crate reads a TOML run
//! configuration, loads CSV tables with WKT geometry columns and writes
//! GeoJSON and CSV result tables.

mod config;
mod error;
pub mod io;
mod pipeline;

pub use config::{PoiSource, RunConfig};
pub use error::PipelineError;
pub use pipeline::{RunSummary, load_or_build_graph, run_pipeline};

pub use walkreach_core;

/// Installs an `env_logger` logger filtered at `level`, overridable through
/// `RUST_LOG`. Does nothing if the host already installed a logger.
pub fn init_logging(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
