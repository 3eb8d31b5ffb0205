//! Isochron and absolute strategies on the same inputs

use geo::point;
use walkreach_core::algo::{ReachEngine, compare_poi_reach};
use walkreach_core::loading::{BuildOptions, StreetSegment, build_street_graph};
use walkreach_core::model::{
    Building, CostMetric, Poi, PoiCollection, ReachParams, SnapMode, Strategy, StreetGraph,
};

const SIZE: usize = 6;
const BLOCK: f64 = 50.0;

fn grid() -> StreetGraph {
    let mut segments = Vec::new();
    for i in 0..=SIZE {
        let c = BLOCK * i as f64;
        for j in 0..SIZE {
            let from = BLOCK * j as f64;
            let to = from + BLOCK;
            segments.push(StreetSegment::from_coords(&[(from, c), (to, c)], BLOCK, 0.6));
            segments.push(StreetSegment::from_coords(&[(c, from), (c, to)], BLOCK, 0.6));
        }
    }
    build_street_graph(&segments, &BuildOptions::default()).unwrap()
}

/// Buildings in the middle of every block side, one metre off the street
fn buildings() -> Vec<Building> {
    let mut buildings = Vec::new();
    let mut id = 0;
    for i in 0..SIZE {
        for j in 0..=SIZE {
            id += 1;
            buildings.push(Building {
                id,
                geometry: point! { x: BLOCK * i as f64 + BLOCK / 2.0, y: BLOCK * j as f64 + 1.0 },
                floors: 5,
                apartments: 10,
            });
        }
    }
    buildings
}

fn parks() -> Vec<PoiCollection> {
    vec![PoiCollection::new(
        "parks",
        vec![
            Poi {
                id: 100,
                geometry: point! { x: 150.0, y: 160.0 },
                subgroup: "park".to_string(),
            },
            Poi {
                id: 101,
                geometry: point! { x: 20.0, y: 280.0 },
                subgroup: "park".to_string(),
            },
        ],
    )]
}

#[test]
fn both_strategies_report_the_same_shape() {
    let graph = grid();
    let buildings = buildings();
    let collections = parks();
    let params = ReachParams::new(CostMetric::Length, 120.0).unwrap();

    let absolute =
        ReachEngine::new(&graph, &buildings, &collections, Strategy::Absolute, params).unwrap();
    let isochron = ReachEngine::new(
        &graph,
        &buildings,
        &collections,
        Strategy::Isochron {
            snap: SnapMode::Edge,
        },
        params,
    )
    .unwrap();

    let exact = absolute.poi_reach(0).unwrap();
    let approx = isochron.poi_reach(0).unwrap();

    for report in [&exact, &approx] {
        assert_eq!(report.collection, "parks");
        for row in &report.rows {
            assert!(row.buildings_within_reach > 0);
            assert_eq!(row.apartments_within_reach, 10 * row.buildings_within_reach as u64);
        }
    }

    let rows = compare_poi_reach(&exact.rows, &approx.rows);
    let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![100, 101]);
}

#[test]
fn absolute_extension_is_deterministic() {
    let graph = grid();
    let buildings = buildings();
    let collections = parks();
    let params = ReachParams::new(CostMetric::Time, 2.0).unwrap();

    let first =
        ReachEngine::new(&graph, &buildings, &collections, Strategy::Absolute, params).unwrap();
    let second =
        ReachEngine::new(&graph, &buildings, &collections, Strategy::Absolute, params).unwrap();

    assert_eq!(first.poi_reach_all().unwrap(), second.poi_reach_all().unwrap());
    assert_eq!(
        first.building_reach().unwrap(),
        second.building_reach().unwrap()
    );

    let extended = first.extended_graph().unwrap();
    assert_eq!(extended.inserted_nodes(), buildings.len() + 2);
    assert_eq!(graph.node_count(), (SIZE + 1) * (SIZE + 1));
}

#[test]
fn building_reach_matches_poi_reach() {
    let graph = grid();
    let buildings = buildings();
    let collections = parks();
    let params = ReachParams::new(CostMetric::Length, 120.0).unwrap();
    let engine =
        ReachEngine::new(&graph, &buildings, &collections, Strategy::Absolute, params).unwrap();

    let served: usize = engine
        .poi_reach(0)
        .unwrap()
        .rows
        .iter()
        .map(|row| row.buildings_within_reach)
        .sum();
    let reached: usize = engine
        .building_reach()
        .unwrap()
        .rows
        .iter()
        .map(|row| row.count("park"))
        .sum();

    // Undirected graph: reach is symmetric
    assert_eq!(served, reached);
}
