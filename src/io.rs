// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! GeoJSON input and output for point sets, boundaries and gap results.

use crate::error::GapError;
use crate::pipeline::GapOutput;
use crate::points::{PointSet, SpatialRef};
use crate::tiles::TileOutcome;
use geo::{Geometry, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use serde_json::json;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error(transparent)]
    Geometry(#[from] GapError),
    #[error("Failed to serialize GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("In '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<LoadError>,
    },
}

fn in_file(path: &Path) -> impl FnOnce(LoadError) -> LoadError + '_ {
    move |err| match err {
        LoadError::Io { .. } => err,
        other => LoadError::File {
            path: path.to_path_buf(),
            source: Box::new(other),
        },
    }
}

/// Reads the legacy `crs` member, `{"type": "name", "properties": {"name": ...}}`.
fn crs_name(members: Option<&JsonObject>) -> Option<SpatialRef> {
    members?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()
        .map(|name| SpatialRef(name.to_string()))
}

fn crs_member(srs: &SpatialRef) -> JsonObject {
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        json!({ "type": "name", "properties": { "name": srs.0 } }),
    );
    members
}

fn to_geo(index: usize, geometry: geojson::Geometry) -> Result<Geometry<f64>, GapError> {
    Geometry::<f64>::try_from(geometry).map_err(|err| GapError::InvalidGeometry {
        index,
        reason: err.to_string(),
    })
}

fn feature_geometry(index: usize, feature: Feature) -> Result<Geometry<f64>, GapError> {
    match feature.geometry {
        Some(geometry) => to_geo(index, geometry),
        None => Err(GapError::InvalidGeometry {
            index,
            reason: "feature has no geometry".to_string(),
        }),
    }
}

fn geometries(geojson: GeoJson) -> Result<(Vec<Geometry<f64>>, Option<SpatialRef>), GapError> {
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            let srs = crs_name(collection.foreign_members.as_ref());
            let geometries = collection
                .features
                .into_iter()
                .enumerate()
                .map(|(index, feature)| feature_geometry(index, feature))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((geometries, srs))
        }
        GeoJson::Feature(feature) => {
            let srs = crs_name(feature.foreign_members.as_ref());
            Ok((vec![feature_geometry(0, feature)?], srs))
        }
        GeoJson::Geometry(geometry) => {
            let srs = crs_name(geometry.foreign_members.as_ref());
            Ok((vec![to_geo(0, geometry)?], srs))
        }
    }
}

/// Parses a FeatureCollection, Feature or bare Geometry into a point set.
///
/// The spatial reference comes from a `crs` member when there is one and
/// defaults to WGS 84 otherwise. Geometries are not checked here; non-point
/// elements are rejected when the point set is used.
pub fn parse_point_set(text: &str) -> Result<PointSet, LoadError> {
    let geojson: GeoJson = text.parse()?;
    let (geometries, srs) = geometries(geojson)?;
    Ok(PointSet::new(geometries, srs.unwrap_or_default()))
}

pub fn read_point_set(path: &Path) -> Result<PointSet, LoadError> {
    read_text(path)
        .and_then(|text| parse_point_set(&text))
        .map_err(in_file(path))
}

/// Collects every polygon in a GeoJSON document into one multipolygon.
pub fn parse_boundary(text: &str) -> Result<MultiPolygon<f64>, LoadError> {
    let geojson: GeoJson = text.parse()?;
    let (geometries, _) = geometries(geojson)?;

    let mut polygons = Vec::new();
    for (index, geometry) in geometries.into_iter().enumerate() {
        match geometry {
            Geometry::Polygon(polygon) => polygons.push(polygon),
            Geometry::MultiPolygon(multi) => polygons.extend(multi),
            _ => warn!(index, "ignoring non-polygon boundary geometry"),
        }
    }

    Ok(MultiPolygon(polygons))
}

pub fn read_boundary(path: &Path) -> Result<MultiPolygon<f64>, LoadError> {
    read_text(path)
        .and_then(|text| parse_boundary(&text))
        .map_err(in_file(path))
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn feature(geometry: geojson::Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn properties(kind: &str) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), kind.into());
    properties
}

/// Converts a run's output to a FeatureCollection.
///
/// Polygons become `kind = "gap"` features, point groups `kind =
/// "cluster_points"` features carrying their cluster index, and raw
/// intersections `kind = "intersection"` features.
pub fn gap_output_to_geojson(output: &GapOutput) -> FeatureCollection {
    let mut features = Vec::new();

    match output {
        GapOutput::Polygons(polygons) => {
            for polygon in &polygons.polygons {
                features.push(feature(geojson::Geometry::from(polygon), properties("gap")));
            }

            for (cluster, group) in polygons.point_groups.iter().flatten().enumerate() {
                let mut properties = properties("cluster_points");
                properties.insert("cluster".to_string(), JsonValue::from(cluster));
                features.push(feature(geojson::Geometry::from(group), properties));
            }
        }
        GapOutput::Points(points) => {
            for point in &points.points {
                features.push(feature(geojson::Geometry::from(point), properties("intersection")));
            }
        }
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(crs_member(output.srs())),
    }
}

/// One MultiPolygon feature per tile carrying its row, column, status and
/// the parameters that produced its gaps.
pub fn tile_outcomes_to_geojson(outcomes: &[TileOutcome], srs: &SpatialRef) -> FeatureCollection {
    let features = outcomes
        .iter()
        .map(|outcome| {
            let mut properties = properties("tile");
            properties.insert("row".to_string(), JsonValue::from(outcome.row));
            properties.insert("col".to_string(), JsonValue::from(outcome.col));
            properties.insert("status".to_string(), json!(outcome.status));
            properties.insert("params".to_string(), json!(outcome.params));
            feature(geojson::Geometry::from(&outcome.gaps), properties)
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(crs_member(srs)),
    }
}

pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> Result<(), LoadError> {
    let file = File::create(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::to_writer(BufWriter::new(file), collection)
        .map_err(LoadError::from)
        .map_err(in_file(path))
}
