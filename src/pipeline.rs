use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use log::info;
use walkreach_core::algo::{
    BuildingReachReport, PoiReachReport, ReachComparison, ReachEngine, ScoredBuilding,
    compare_poi_reach, score_buildings,
};
use walkreach_core::loading::{BuildOptions, build_street_graph};
use walkreach_core::model::{SnapMode, Strategy, StreetGraph};

use crate::io::{
    building_reach_to_geojson, poi_reach_to_geojson, read_buildings, read_pois,
    read_street_segments, read_weights, write_comparison, write_geojson, write_scored_buildings,
};
use crate::{PipelineError, RunConfig};

/// Everything one run computed, plus the files it wrote
#[derive(Debug)]
pub struct RunSummary {
    pub poi_reach: Vec<PoiReachReport>,
    pub building_reach: BuildingReachReport,
    /// Empty when no weight table is configured
    pub scored: Vec<ScoredBuilding>,
    /// One table per POI collection when strategy comparison is on
    pub comparisons: Vec<Vec<ReachComparison>>,
    pub outputs: Vec<PathBuf>,
}

/// Loads the configured snapshot when it exists, otherwise builds the graph
/// from the street table and writes the snapshot for the next run.
///
/// # Errors
///
/// Returns an error if a table or the snapshot cannot be read or written
pub fn load_or_build_graph(config: &RunConfig) -> Result<StreetGraph, PipelineError> {
    if let Some(snapshot) = &config.graph_snapshot
        && snapshot.exists()
    {
        return Ok(StreetGraph::load_snapshot(snapshot)?);
    }

    let segments = read_street_segments(&config.streets)?;
    let options = BuildOptions {
        swap_xy: config.swap_xy,
    };
    let graph = build_street_graph(&segments, &options)?;

    if let Some(snapshot) = &config.graph_snapshot {
        graph.save_snapshot(snapshot)?;
    }
    Ok(graph)
}

/// The strategy a comparison runs against the configured one
fn counterpart(strategy: Strategy) -> Strategy {
    match strategy {
        Strategy::Isochron { .. } => Strategy::Absolute,
        Strategy::Absolute => Strategy::Isochron {
            snap: SnapMode::Edge,
        },
    }
}

/// Builds the graph, computes POI and building reach under the configured
/// strategy, scores the buildings and writes every table to the output
/// directory.
///
/// # Errors
///
/// Returns an error if an input cannot be read, a location cannot be snapped
/// or an output cannot be written
pub fn run_pipeline(config: &RunConfig) -> Result<RunSummary, PipelineError> {
    let start = Instant::now();
    let params = config.reach_params()?;
    let strategy = config.run_strategy();

    let graph = load_or_build_graph(config)?;
    let buildings = read_buildings(&config.buildings)?;
    let collections = config
        .pois
        .iter()
        .map(|source| read_pois(&source.name, &source.path))
        .collect::<Result<Vec<_>, _>>()?;

    fs::create_dir_all(&config.output_dir)?;
    let mut outputs = Vec::new();

    let engine = ReachEngine::new(&graph, &buildings, &collections, strategy, params)?;
    let poi_reach = engine.poi_reach_all()?;
    for report in &poi_reach {
        let path = config
            .output_dir
            .join(format!("poi_reach_{}.geojson", report.collection));
        write_geojson(&path, &poi_reach_to_geojson(report)?)?;
        outputs.push(path);
    }

    let building_reach = engine.building_reach()?;
    let path = config.output_dir.join("building_reach.geojson");
    write_geojson(&path, &building_reach_to_geojson(&building_reach)?)?;
    outputs.push(path);

    let scored = match &config.weights {
        Some(weights_path) => {
            let weights = read_weights(weights_path)?;
            let scored = score_buildings(building_reach.rows.clone(), &weights);
            let path = config.output_dir.join("scored_buildings.csv");
            write_scored_buildings(BufWriter::new(File::create(&path)?), &scored)?;
            outputs.push(path);
            scored
        }
        None => Vec::new(),
    };

    let mut comparisons = Vec::new();
    if config.compare_strategies {
        let other = ReachEngine::new(
            &graph,
            &buildings,
            &collections,
            counterpart(strategy),
            params,
        )?;
        for (report, other_report) in poi_reach.iter().zip(other.poi_reach_all()?) {
            let (absolute, isochron) = match engine.strategy() {
                Strategy::Absolute => (&report.rows, &other_report.rows),
                Strategy::Isochron { .. } => (&other_report.rows, &report.rows),
            };
            let rows = compare_poi_reach(absolute, isochron);
            let path = config
                .output_dir
                .join(format!("strategy_comparison_{}.csv", report.collection));
            write_comparison(BufWriter::new(File::create(&path)?), &rows)?;
            outputs.push(path);
            comparisons.push(rows);
        }
    }

    info!(
        "Run finished in {:.2?}, wrote {} tables to {}",
        start.elapsed(),
        outputs.len(),
        config.output_dir.display()
    );

    Ok(RunSummary {
        poi_reach,
        building_reach,
        scored,
        comparisons,
        outputs,
    })
}
