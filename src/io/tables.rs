//! CSV input tables with WKT geometry columns

use std::fs::File;
use std::io::Read;
use std::path::Path;

use geo::{Geometry, MultiLineString};
use log::info;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use walkreach_core::loading::StreetSegment;
use walkreach_core::model::{
    AccessibilityWeights, Building, LocationId, Poi, PoiCollection, location_point,
};
use wkt::TryFromWkt;

use crate::PipelineError;

#[derive(Debug, Deserialize)]
struct SegmentRecord {
    geom: String,
    meters: f64,
    minutes: f64,
}

#[derive(Debug, Deserialize)]
struct BuildingRecord {
    id: LocationId,
    geom: String,
    floors: u32,
    #[serde(alias = "appartments")]
    apartments: u32,
}

#[derive(Debug, Deserialize)]
struct PoiRecord {
    id: LocationId,
    geom: String,
    subgroup: String,
}

#[derive(Debug, Deserialize)]
struct WeightRecord {
    subgroup_id: String,
    gr_weights: f64,
    sgr_weights: f64,
}

fn open(path: &Path) -> Result<File, PipelineError> {
    File::open(path).map_err(|e| {
        PipelineError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        ))
    })
}

fn deserialize_records<T, R>(reader: R) -> Result<Vec<T>, PipelineError>
where
    T: DeserializeOwned,
    R: Read,
{
    csv::Reader::from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(PipelineError::from)
}

fn parse_geometry(wkt: &str) -> Result<Geometry<f64>, PipelineError> {
    Geometry::try_from_wkt_str(wkt)
        .map_err(|e| PipelineError::Wkt(format!("Failed to parse '{wkt}': {e}")))
}

fn parse_lines(wkt: &str) -> Result<MultiLineString<f64>, PipelineError> {
    match parse_geometry(wkt)? {
        Geometry::LineString(line) => Ok(line.into()),
        Geometry::MultiLineString(lines) => Ok(lines),
        _ => Err(PipelineError::Wkt(format!(
            "Expected a (multi) line string, got '{wkt}'"
        ))),
    }
}

fn parse_location(wkt: &str) -> Result<geo::Point<f64>, PipelineError> {
    let geometry = parse_geometry(wkt)?;
    location_point(&geometry)
        .ok_or_else(|| PipelineError::Wkt(format!("Expected a (multi) point, got '{wkt}'")))
}

pub fn read_street_segments_from<R: Read>(reader: R) -> Result<Vec<StreetSegment>, PipelineError> {
    deserialize_records::<SegmentRecord, _>(reader)?
        .into_iter()
        .map(|record| {
            Ok(StreetSegment::new(
                parse_lines(&record.geom)?,
                record.meters,
                record.minutes,
            ))
        })
        .collect()
}

/// Street segments with columns `geom` (WKT), `meters`, `minutes`
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row is malformed
pub fn read_street_segments(path: &Path) -> Result<Vec<StreetSegment>, PipelineError> {
    let segments = read_street_segments_from(open(path)?)?;
    info!("Read {} street segments from {}", segments.len(), path.display());
    Ok(segments)
}

pub fn read_buildings_from<R: Read>(reader: R) -> Result<Vec<Building>, PipelineError> {
    deserialize_records::<BuildingRecord, _>(reader)?
        .into_iter()
        .map(|record| {
            Ok(Building {
                id: record.id,
                geometry: parse_location(&record.geom)?,
                floors: record.floors,
                apartments: record.apartments,
            })
        })
        .collect()
}

/// Buildings with columns `id`, `geom` (WKT), `floors`, `apartments`
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row is malformed
pub fn read_buildings(path: &Path) -> Result<Vec<Building>, PipelineError> {
    let buildings = read_buildings_from(open(path)?)?;
    info!("Read {} buildings from {}", buildings.len(), path.display());
    Ok(buildings)
}

pub fn read_pois_from<R: Read>(
    name: impl Into<String>,
    reader: R,
) -> Result<PoiCollection, PipelineError> {
    let pois = deserialize_records::<PoiRecord, _>(reader)?
        .into_iter()
        .map(|record| {
            Ok(Poi {
                id: record.id,
                geometry: parse_location(&record.geom)?,
                subgroup: record.subgroup,
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;
    Ok(PoiCollection::new(name, pois))
}

/// POI table with columns `id`, `geom` (WKT), `subgroup`
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row is malformed
pub fn read_pois(name: &str, path: &Path) -> Result<PoiCollection, PipelineError> {
    let collection = read_pois_from(name, open(path)?)?;
    info!(
        "Read {} POIs of '{}' from {}",
        collection.pois.len(),
        name,
        path.display()
    );
    Ok(collection)
}

pub fn read_weights_from<R: Read>(reader: R) -> Result<AccessibilityWeights, PipelineError> {
    let records = deserialize_records::<WeightRecord, _>(reader)?;
    let weights = AccessibilityWeights::new(
        records
            .into_iter()
            .map(|r| (r.subgroup_id, r.gr_weights, r.sgr_weights)),
    )?;
    Ok(weights)
}

/// Weight table with columns `subgroup_id`, `gr_weights`, `sgr_weights`
///
/// # Errors
///
/// Returns an error if the file cannot be read, a row is malformed or a
/// weight is not positive
pub fn read_weights(path: &Path) -> Result<AccessibilityWeights, PipelineError> {
    read_weights_from(open(path)?)
}

#[cfg(test)]
mod tests {
    use geo::point;

    use super::*;

    #[test]
    fn segments_accept_line_and_multi_line_strings() {
        let csv = "\
geom,meters,minutes
\"LINESTRING (0 0, 10 0, 10 5)\",15,0.2
\"MULTILINESTRING ((0 0, 0 10), (5 5, 6 6))\",12.5,0.15
";
        let segments = read_street_segments_from(csv.as_bytes()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].geometry.0.len(), 1);
        assert_eq!(segments[0].geometry.0[0].0.len(), 3);
        assert_eq!(segments[1].geometry.0.len(), 2);
        assert_eq!(segments[1].length, 12.5);
    }

    #[test]
    fn point_geometry_in_segments_is_rejected() {
        let csv = "geom,meters,minutes\n\"POINT (1 1)\",1,1\n";
        assert!(matches!(
            read_street_segments_from(csv.as_bytes()),
            Err(PipelineError::Wkt(_))
        ));
    }

    #[test]
    fn buildings_accept_both_apartment_spellings() {
        let csv = "id,geom,floors,appartments\n7,\"POINT (1 2)\",5,40\n";
        let buildings = read_buildings_from(csv.as_bytes()).unwrap();
        assert_eq!(buildings[0].apartments, 40);
        assert_eq!(buildings[0].geometry, point! { x: 1.0, y: 2.0 });

        let csv = "id,geom,floors,apartments\n8,\"POINT (3 4)\",2,6\n";
        assert_eq!(read_buildings_from(csv.as_bytes()).unwrap()[0].floors, 2);
    }

    #[test]
    fn multi_point_poi_uses_first_point() {
        let csv = "id,geom,subgroup\n1,\"MULTIPOINT ((4 5), (9 9))\",park\n";
        let parks = read_pois_from("parks", csv.as_bytes()).unwrap();
        assert_eq!(parks.name, "parks");
        assert_eq!(parks.pois[0].geometry, point! { x: 4.0, y: 5.0 });
        assert_eq!(parks.pois[0].subgroup, "park");
    }

    #[test]
    fn weights_keep_table_order() {
        let csv = "subgroup_id,gr_weights,sgr_weights\nschool,1,0.5\npark,2,3\n";
        let weights = read_weights_from(csv.as_bytes()).unwrap();
        let names: Vec<_> = weights.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["school", "park"]);
        assert_eq!(weights.get("park").unwrap().factor(), 6.0);
    }

    #[test]
    fn non_positive_weight_is_rejected() {
        let csv = "subgroup_id,gr_weights,sgr_weights\npark,0,3\n";
        assert!(matches!(
            read_weights_from(csv.as_bytes()),
            Err(PipelineError::Core(_))
        ));
    }
}
