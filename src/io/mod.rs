//! Table readers and result sinks

mod sinks;
mod tables;

pub use sinks::{
    building_reach_to_geojson, poi_reach_to_geojson, write_comparison, write_geojson,
    write_scored_buildings,
};
pub use tables::{
    read_buildings, read_buildings_from, read_pois, read_pois_from, read_street_segments,
    read_street_segments_from, read_weights, read_weights_from,
};
