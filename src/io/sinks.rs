//! Result tables as GeoJSON feature collections and CSV

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::Point;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::{Map, Value, json};
use walkreach_core::algo::{
    BuildingReach, BuildingReachReport, PoiReachReport, ReachComparison, Region, ScoredBuilding,
};
use wkt::ToWkt;

use crate::PipelineError;

fn point_geometry(point: &Point<f64>) -> Geometry {
    Geometry::new(GeoJsonValue::from(point))
}

fn region_geometry(region: Option<&Region>) -> Value {
    region.map_or(Value::Null, |region| {
        json!(Geometry::new(GeoJsonValue::from(&region.to_polygon())))
    })
}

fn to_feature(value: Value) -> Result<Feature, PipelineError> {
    serde_json::from_value::<Feature>(value).map_err(|e| PipelineError::GeoJson(e.to_string()))
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    }
}

/// One point feature per serving POI. Under the isochron strategy the
/// region polygon is attached as the `service_area` property.
///
/// # Errors
///
/// Returns an error if a feature cannot be assembled
pub fn poi_reach_to_geojson(report: &PoiReachReport) -> Result<FeatureCollection, PipelineError> {
    let features = report
        .rows
        .iter()
        .map(|row| {
            to_feature(json!({
                "type": "Feature",
                "geometry": point_geometry(&row.geometry),
                "properties": {
                    "id": row.id,
                    "collection": report.collection,
                    "subgroup": row.subgroup,
                    "buildings_within_reach": row.buildings_within_reach,
                    "apartments_within_reach": row.apartments_within_reach,
                    "service_area": region_geometry(row.region.as_ref()),
                }
            }))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(collection(features))
}

fn building_properties(row: &BuildingReach) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("id".into(), json!(row.id));
    properties.insert("floors".into(), json!(row.floors));
    properties.insert("apartments".into(), json!(row.apartments));
    for (subgroup, count) in &row.subgroup_counts {
        properties.insert(subgroup.clone(), json!(count));
    }
    properties.insert(
        "service_area".into(),
        region_geometry(row.region.as_ref()),
    );
    properties
}

/// One point feature per building, a property per reached subgroup
///
/// # Errors
///
/// Returns an error if a feature cannot be assembled
pub fn building_reach_to_geojson(
    report: &BuildingReachReport,
) -> Result<FeatureCollection, PipelineError> {
    let features = report
        .rows
        .iter()
        .map(|row| {
            to_feature(json!({
                "type": "Feature",
                "geometry": point_geometry(&row.geometry),
                "properties": building_properties(row),
            }))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(collection(features))
}

/// # Errors
///
/// Returns an error if the file cannot be written
pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> Result<(), PipelineError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, collection)
        .map_err(|e| PipelineError::GeoJson(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

/// Scored building table. Every subgroup observed in any row gets a count
/// column, 0 where a building reaches none.
///
/// # Errors
///
/// Returns an error if a record cannot be written
pub fn write_scored_buildings<W: Write>(
    writer: W,
    rows: &[ScoredBuilding],
) -> Result<(), PipelineError> {
    let subgroups: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.reach.subgroup_counts.keys().map(String::as_str))
        .collect();

    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["id", "geom", "floors", "apartments"];
    header.extend(subgroups.iter().copied());
    header.extend(["service_index", "service_index_pca"]);
    csv.write_record(&header)?;

    for row in rows {
        let reach = &row.reach;
        let mut record = vec![
            reach.id.to_string(),
            reach.geometry.wkt_string(),
            reach.floors.to_string(),
            reach.apartments.to_string(),
        ];
        record.extend(subgroups.iter().map(|s| reach.count(s).to_string()));
        record.push(row.service_index.to_string());
        record.push(row.service_index_pca.to_string());
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Per-POI comparison table; missing sides are written as empty fields
///
/// # Errors
///
/// Returns an error if a record cannot be written
pub fn write_comparison<W: Write>(
    writer: W,
    rows: &[ReachComparison],
) -> Result<(), PipelineError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "id",
        "subgroup",
        "buildings_within_reach_absolute",
        "apartments_within_reach_absolute",
        "buildings_within_reach_isochron",
        "apartments_within_reach_isochron",
        "different",
    ])?;

    let field = |value: Option<String>| value.unwrap_or_default();
    for row in rows {
        csv.write_record([
            row.id.to_string(),
            row.subgroup.clone(),
            field(row.absolute.map(|t| t.buildings.to_string())),
            field(row.absolute.map(|t| t.apartments.to_string())),
            field(row.isochron.map(|t| t.buildings.to_string())),
            field(row.isochron.map(|t| t.apartments.to_string())),
            row.is_different().to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}
