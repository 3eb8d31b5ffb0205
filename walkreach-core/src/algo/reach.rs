//! POI and building reach aggregation under either region strategy

use std::borrow::Cow;
use std::collections::BTreeMap;

use geo::Point;
use log::{debug, info, warn};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use super::locate::{locate_at_nodes, locate_on_edges};
use super::region::{Region, isochron_from_reach};
use crate::{
    Error,
    model::{
        Building, ExtendedGraph, LocationId, PoiCollection, ReachParams, SnapMode, Strategy,
        StreetGraph,
    },
    routing::reachable,
};

/// Buildings served by one POI
#[derive(Debug, Clone, PartialEq)]
pub struct PoiReach {
    pub id: LocationId,
    pub geometry: Point<f64>,
    pub subgroup: String,
    pub buildings_within_reach: usize,
    pub apartments_within_reach: u64,
    /// Only set by the isochron strategy
    pub region: Option<Region>,
}

/// Per-POI reach of one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoiReachReport {
    pub collection: String,
    /// POIs serving at least one building, in input order
    pub rows: Vec<PoiReach>,
    /// POIs that reach no building
    pub unserved_pois: Vec<LocationId>,
    /// POIs whose isochron fell back to the circular buffer
    pub fallbacks: Vec<LocationId>,
}

/// POIs reachable from one building, counted per subgroup
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingReach {
    pub id: LocationId,
    pub geometry: Point<f64>,
    pub floors: u32,
    pub apartments: u32,
    /// Only set by the isochron strategy
    pub region: Option<Region>,
    /// Subgroups with at least one reachable POI
    pub subgroup_counts: BTreeMap<String, usize>,
}

impl BuildingReach {
    /// Reachable POIs of `subgroup`, 0 when absent
    pub fn count(&self, subgroup: &str) -> usize {
        self.subgroup_counts.get(subgroup).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingReachReport {
    pub rows: Vec<BuildingReach>,
    /// Buildings whose isochron fell back to the circular buffer
    pub fallbacks: Vec<LocationId>,
}

/// Locations merged into the graph once, before any query
#[derive(Debug)]
struct AbsoluteNetwork {
    graph: ExtendedGraph,
    building_nodes: Vec<NodeIndex>,
    poi_nodes: Vec<Vec<NodeIndex>>,
}

#[derive(Debug)]
enum Network {
    Isochron { snap: SnapMode },
    Absolute(AbsoluteNetwork),
}

/// What a single source reaches
struct SourceReach {
    region: Option<Region>,
    targets: Vec<usize>,
}

/// Computes reach tables for one run.
///
/// Under [`Strategy::Absolute`] every building and then every POI collection
/// (in order) is edge-snapped into an extended graph when the engine is
/// created. Queries afterwards are read-only and run in parallel.
#[derive(Debug)]
pub struct ReachEngine<'a> {
    base: &'a StreetGraph,
    buildings: &'a [Building],
    collections: &'a [PoiCollection],
    params: ReachParams,
    network: Network,
}

impl<'a> ReachEngine<'a> {
    /// # Errors
    ///
    /// Returns [`Error::EmptyGraph`] if a location must be snapped onto a graph
    /// without edges
    pub fn new(
        base: &'a StreetGraph,
        buildings: &'a [Building],
        collections: &'a [PoiCollection],
        strategy: Strategy,
        params: ReachParams,
    ) -> Result<Self, Error> {
        let network = match strategy {
            Strategy::Isochron { snap } => Network::Isochron { snap },
            Strategy::Absolute => Network::Absolute(extend_network(base, buildings, collections)?),
        };

        Ok(Self {
            base,
            buildings,
            collections,
            params,
            network,
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self.network {
            Network::Isochron { snap } => Strategy::Isochron { snap },
            Network::Absolute(_) => Strategy::Absolute,
        }
    }

    /// The extended graph of the absolute strategy
    pub fn extended_graph(&self) -> Option<&ExtendedGraph> {
        match &self.network {
            Network::Absolute(network) => Some(&network.graph),
            Network::Isochron { .. } => None,
        }
    }

    /// Buildings served by every POI of collection `index`
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or a POI cannot be located
    pub fn poi_reach(&self, index: usize) -> Result<PoiReachReport, Error> {
        let collection = self.collections.get(index).ok_or_else(|| {
            Error::InvalidData(format!("No POI collection with index {index}"))
        })?;
        let sources: Vec<Point<f64>> = collection.pois.iter().map(|poi| poi.geometry).collect();

        let reaches = match &self.network {
            Network::Isochron { snap } => {
                let targets: Vec<Point<f64>> =
                    self.buildings.iter().map(|b| b.geometry).collect();
                self.isochron_reach(*snap, &sources, &targets)?
            }
            Network::Absolute(network) => absolute_reach(
                &network.graph,
                &network.poi_nodes[index],
                &network.building_nodes,
                self.params,
            )?,
        };

        let mut report = PoiReachReport {
            collection: collection.name.clone(),
            ..PoiReachReport::default()
        };
        for (poi, reach) in collection.pois.iter().zip(reaches) {
            if reach.region.as_ref().is_some_and(Region::is_fallback) {
                warn!(
                    "Isochron of POI {} ({}) fell back to a circular buffer",
                    poi.id, collection.name
                );
                report.fallbacks.push(poi.id);
            }

            if reach.targets.is_empty() {
                debug!("POI {} ({}) reaches no buildings, dropped", poi.id, poi.subgroup);
                report.unserved_pois.push(poi.id);
                continue;
            }

            let apartments_within_reach = reach
                .targets
                .iter()
                .map(|&i| u64::from(self.buildings[i].apartments))
                .sum();
            report.rows.push(PoiReach {
                id: poi.id,
                geometry: poi.geometry,
                subgroup: poi.subgroup.clone(),
                buildings_within_reach: reach.targets.len(),
                apartments_within_reach,
                region: reach.region,
            });
        }

        info!(
            "Computed reach of {} POIs in '{}': {} serve buildings, {} fallbacks",
            collection.pois.len(),
            collection.name,
            report.rows.len(),
            report.fallbacks.len()
        );
        Ok(report)
    }

    /// [`ReachEngine::poi_reach`] for every collection, in order
    ///
    /// # Errors
    ///
    /// Returns an error if a POI cannot be located
    pub fn poi_reach_all(&self) -> Result<Vec<PoiReachReport>, Error> {
        (0..self.collections.len())
            .map(|index| self.poi_reach(index))
            .collect()
    }

    /// Reachable POIs of every collection per building, counted by subgroup
    ///
    /// # Errors
    ///
    /// Returns an error if a building cannot be located
    pub fn building_reach(&self) -> Result<BuildingReachReport, Error> {
        let sources: Vec<Point<f64>> = self.buildings.iter().map(|b| b.geometry).collect();
        // Flattened POI list, subgroups resolved through it
        let pois: Vec<&str> = self
            .collections
            .iter()
            .flat_map(|c| c.pois.iter().map(|poi| poi.subgroup.as_str()))
            .collect();

        let reaches = match &self.network {
            Network::Isochron { snap } => {
                let targets: Vec<Point<f64>> = self
                    .collections
                    .iter()
                    .flat_map(|c| c.pois.iter().map(|poi| poi.geometry))
                    .collect();
                self.isochron_reach(*snap, &sources, &targets)?
            }
            Network::Absolute(network) => {
                let targets: Vec<NodeIndex> = network.poi_nodes.concat();
                absolute_reach(
                    &network.graph,
                    &network.building_nodes,
                    &targets,
                    self.params,
                )?
            }
        };

        let mut report = BuildingReachReport::default();
        for (building, reach) in self.buildings.iter().zip(reaches) {
            if reach.region.as_ref().is_some_and(Region::is_fallback) {
                warn!(
                    "Isochron of building {} fell back to a circular buffer",
                    building.id
                );
                report.fallbacks.push(building.id);
            }

            let mut subgroup_counts = BTreeMap::new();
            for &i in &reach.targets {
                *subgroup_counts.entry(pois[i].to_string()).or_insert(0) += 1;
            }

            report.rows.push(BuildingReach {
                id: building.id,
                geometry: building.geometry,
                floors: building.floors,
                apartments: building.apartments,
                region: reach.region,
                subgroup_counts,
            });
        }

        info!(
            "Computed reach of {} buildings, {} fallbacks",
            report.rows.len(),
            report.fallbacks.len()
        );
        Ok(report)
    }

    /// Isochron per source, targets tested by point-in-region.
    ///
    /// Edge snapping happens on a private copy of the base graph, all of it
    /// before the first query.
    fn isochron_reach(
        &self,
        snap: SnapMode,
        sources: &[Point<f64>],
        targets: &[Point<f64>],
    ) -> Result<Vec<SourceReach>, Error> {
        let (graph, located) = match snap {
            SnapMode::Node => (
                Cow::Borrowed(self.base),
                locate_at_nodes(self.base, sources)?,
            ),
            SnapMode::Edge => {
                let mut extended = ExtendedGraph::from_base(self.base);
                let located = locate_on_edges(&mut extended, sources)?;
                (Cow::Owned(extended.into_inner()), located)
            }
        };
        let graph: &StreetGraph = &graph;
        let params = self.params;

        located
            .par_iter()
            .map(|source| {
                let reach = reachable(graph, source.node, params.metric, params.budget)?;
                let region = isochron_from_reach(graph, &reach)?;
                let targets = targets
                    .iter()
                    .enumerate()
                    .filter(|(_, point)| region.contains(point))
                    .map(|(i, _)| i)
                    .collect();
                Ok(SourceReach {
                    region: Some(region),
                    targets,
                })
            })
            .collect()
    }
}

fn extend_network(
    base: &StreetGraph,
    buildings: &[Building],
    collections: &[PoiCollection],
) -> Result<AbsoluteNetwork, Error> {
    let mut graph = ExtendedGraph::from_base(base);

    let building_points: Vec<Point<f64>> = buildings.iter().map(|b| b.geometry).collect();
    let building_nodes = locate_on_edges(&mut graph, &building_points)?
        .into_iter()
        .map(|located| located.node)
        .collect();

    let mut poi_nodes = Vec::with_capacity(collections.len());
    for collection in collections {
        let points: Vec<Point<f64>> = collection.pois.iter().map(|poi| poi.geometry).collect();
        let nodes = locate_on_edges(&mut graph, &points)?
            .into_iter()
            .map(|located| located.node)
            .collect::<Vec<_>>();
        poi_nodes.push(nodes);
    }

    info!(
        "Extended street graph with {} new nodes ({} nodes, {} edges)",
        graph.inserted_nodes(),
        graph.node_count(),
        graph.edge_count()
    );

    Ok(AbsoluteNetwork {
        graph,
        building_nodes,
        poi_nodes,
    })
}

/// Exact reach per source node, targets tested by node membership
fn absolute_reach(
    graph: &StreetGraph,
    sources: &[NodeIndex],
    targets: &[NodeIndex],
    params: ReachParams,
) -> Result<Vec<SourceReach>, Error> {
    sources
        .par_iter()
        .map(|&source| {
            let reach = reachable(graph, source, params.metric, params.budget)?;
            let members = reach.membership(graph);
            let targets = targets
                .iter()
                .enumerate()
                .filter(|(_, node)| members.contains(node.index()))
                .map(|(i, _)| i)
                .collect();
            Ok(SourceReach {
                region: None,
                targets,
            })
        })
        .collect()
}
