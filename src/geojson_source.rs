//! Readers for the raw source files.
//!
//! - `stations.geojson` / `trains.geojson`: feature collections with
//!   Point / LineString geometries.
//! - `schedules.json`: a flat JSON list of timing records.
//!
//! Structural problems are fatal to the run; missing optional fields
//! and missing geometries are not.

use crate::schedule::{ScheduleRecord, normalize_time};
use geojson::{Feature, GeoJson, Value as GeometryValue};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} as GeoJSON")]
    Geojson {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },
    #[error("failed to parse {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: expected a FeatureCollection")]
    NotAFeatureCollection { path: PathBuf },
    #[error("{path}: feature {index} is missing required property \"{property}\"")]
    MissingProperty {
        path: PathBuf,
        index: usize,
        property: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct StationRecord {
    pub code: String,
    pub name: String,
    pub state: Option<String>,
    pub zone: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TrainRecord {
    pub number: String,
    pub name: String,
    pub train_type: Option<String>,
    pub zone: Option<String>,
    pub from_station_code: Option<String>,
    pub to_station_code: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub distance_km: Option<i32>,
    pub duration_h: Option<i32>,
    pub duration_m: Option<i32>,
    /// Class configuration document, stored verbatim when it is already
    /// a string, otherwise re-serialized.
    pub classes: Option<String>,
    /// Raw route geometry, GeoJSON coordinate order (lon, lat).
    pub route: Option<Vec<(f64, f64)>>,
}

pub fn read_stations(path: &Path) -> Result<Vec<StationRecord>, SourceError> {
    let content = read_file(path)?;
    parse_stations(path, &content)
}

pub fn read_trains(path: &Path) -> Result<Vec<TrainRecord>, SourceError> {
    let content = read_file(path)?;
    parse_trains(path, &content)
}

pub fn read_schedules(path: &Path) -> Result<Vec<ScheduleRecord>, SourceError> {
    let content = read_file(path)?;
    parse_schedules(path, &content)
}

fn read_file(path: &Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_feature_collection(path: &Path, content: &str) -> Result<Vec<Feature>, SourceError> {
    let geojson: GeoJson = content.parse().map_err(|source| SourceError::Geojson {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        _ => Err(SourceError::NotAFeatureCollection {
            path: path.to_path_buf(),
        }),
    }
}

fn parse_stations(path: &Path, content: &str) -> Result<Vec<StationRecord>, SourceError> {
    let features = parse_feature_collection(path, content)?;
    let mut stations = Vec::with_capacity(features.len());

    for (index, feature) in features.iter().enumerate() {
        let code = require_str(path, index, feature, "code")?;
        let name = require_str(path, index, feature, "name")?;

        let (longitude, latitude) = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(GeometryValue::Point(coords)) if coords.len() >= 2 => {
                (Some(coords[0]), Some(coords[1]))
            }
            _ => (None, None),
        };

        stations.push(StationRecord {
            code,
            name,
            state: opt_str(feature, "state"),
            zone: opt_str(feature, "zone"),
            address: opt_str(feature, "address"),
            latitude,
            longitude,
        });
    }

    Ok(stations)
}

fn parse_trains(path: &Path, content: &str) -> Result<Vec<TrainRecord>, SourceError> {
    let features = parse_feature_collection(path, content)?;
    let mut trains = Vec::with_capacity(features.len());

    for (index, feature) in features.iter().enumerate() {
        let number = require_str(path, index, feature, "number")?;
        let name = require_str(path, index, feature, "name")?;

        let route = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(GeometryValue::LineString(coords)) => Some(
                coords
                    .iter()
                    .filter(|position| position.len() >= 2)
                    .map(|position| (position[0], position[1]))
                    .collect::<Vec<(f64, f64)>>(),
            ),
            _ => None,
        };

        trains.push(TrainRecord {
            number,
            name,
            train_type: opt_str(feature, "type"),
            zone: opt_str(feature, "zone"),
            from_station_code: opt_str(feature, "from_station_code"),
            to_station_code: opt_str(feature, "to_station_code"),
            departure_time: opt_str(feature, "departure"),
            arrival_time: opt_str(feature, "arrival"),
            distance_km: opt_i32(feature, "distance"),
            duration_h: opt_i32(feature, "duration_h"),
            duration_m: opt_i32(feature, "duration_m"),
            classes: classes_document(feature),
            route,
        });
    }

    Ok(trains)
}

#[derive(Deserialize)]
struct RawScheduleEntry {
    train_number: String,
    station_code: String,
    #[serde(default)]
    day: Option<i32>,
    #[serde(default)]
    arrival: Option<String>,
    #[serde(default)]
    departure: Option<String>,
    // stop_number also appears in the feed; ordering is re-derived from
    // (day, departure) so it is deliberately ignored.
}

fn parse_schedules(path: &Path, content: &str) -> Result<Vec<ScheduleRecord>, SourceError> {
    let entries: Vec<RawScheduleEntry> =
        serde_json::from_str(content).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(entries
        .into_iter()
        .map(|entry| ScheduleRecord {
            train_number: entry.train_number,
            station_code: entry.station_code,
            day: entry.day,
            arrival: normalize_time(entry.arrival),
            departure: normalize_time(entry.departure),
        })
        .collect())
}

fn property<'a>(feature: &'a Feature, key: &str) -> Option<&'a serde_json::Value> {
    feature.properties.as_ref().and_then(|props| props.get(key))
}

fn require_str(
    path: &Path,
    index: usize,
    feature: &Feature,
    key: &'static str,
) -> Result<String, SourceError> {
    property(feature, key)
        .and_then(|value| value.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| SourceError::MissingProperty {
            path: path.to_path_buf(),
            index,
            property: key,
        })
}

fn opt_str(feature: &Feature, key: &str) -> Option<String> {
    property(feature, key)
        .and_then(|value| value.as_str())
        .map(|s| s.to_string())
}

fn opt_i32(feature: &Feature, key: &str) -> Option<i32> {
    match property(feature, key)? {
        serde_json::Value::Number(n) => n.as_i64().map(|v| v as i32),
        serde_json::Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// The classes property is kept as a raw JSON document: strings pass
/// through verbatim, objects are re-serialized, nulls drop out.
fn classes_document(feature: &Feature) -> Option<String> {
    match property(feature, "classes")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stations_parse_with_and_without_geometry() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"code": "NDLS", "name": "New Delhi", "state": "Delhi", "zone": "NR"},
                    "geometry": {"type": "Point", "coordinates": [77.2194, 28.6430]}
                },
                {
                    "type": "Feature",
                    "properties": {"code": "XXXX", "name": "Phantom Halt"},
                    "geometry": null
                }
            ]
        }"#;

        let stations = parse_stations(Path::new("stations.json"), content).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].code, "NDLS");
        assert_eq!(stations[0].longitude, Some(77.2194));
        assert_eq!(stations[0].latitude, Some(28.6430));
        assert_eq!(stations[1].code, "XXXX");
        assert!(stations[1].latitude.is_none());
    }

    #[test]
    fn station_without_code_is_a_fatal_error() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "Nameless"}, "geometry": null}
            ]
        }"#;
        let err = parse_stations(Path::new("stations.json"), content).unwrap_err();
        assert!(matches!(
            err,
            SourceError::MissingProperty { index: 0, property: "code", .. }
        ));
    }

    #[test]
    fn non_feature_collection_is_rejected() {
        let content = r#"{"type": "Point", "coordinates": [77.0, 28.0]}"#;
        let err = parse_stations(Path::new("stations.json"), content).unwrap_err();
        assert!(matches!(err, SourceError::NotAFeatureCollection { .. }));
    }

    #[test]
    fn trains_parse_route_geometry_and_properties() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {
                        "number": "12301",
                        "name": "Rajdhani Express",
                        "from_station_code": "HWH",
                        "to_station_code": "NDLS",
                        "type": "Raj",
                        "distance": 1447,
                        "duration_h": 17,
                        "duration_m": 5,
                        "departure": "16:55",
                        "arrival": "10:00",
                        "classes": {"1A": 1, "2A": 2, "3A": 5}
                    },
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[88.342, 22.583], [87.321, 23.248]]
                    }
                }
            ]
        }"#;

        let trains = parse_trains(Path::new("trains.json"), content).unwrap();
        assert_eq!(trains.len(), 1);
        let train = &trains[0];
        assert_eq!(train.number, "12301");
        assert_eq!(train.distance_km, Some(1447));
        assert_eq!(train.route.as_ref().unwrap().len(), 2);
        assert_eq!(train.route.as_ref().unwrap()[0], (88.342, 22.583));

        // Object-shaped classes re-serialize to a JSON document that the
        // seat generator can parse back.
        let classes = crate::seat_layout::parse_classes_config(train.classes.as_deref());
        assert_eq!(classes.len(), 3);
    }

    #[test]
    fn train_without_geometry_has_no_route() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"number": "54783", "name": "Passenger", "distance": "420"},
                    "geometry": null
                }
            ]
        }"#;
        let trains = parse_trains(Path::new("trains.json"), content).unwrap();
        assert!(trains[0].route.is_none());
        // Numeric strings are accepted for distance.
        assert_eq!(trains[0].distance_km, Some(420));
    }

    #[test]
    fn schedules_normalize_the_none_literal() {
        let content = r#"[
            {"train_number": "12301", "station_code": "HWH", "day": 1,
             "arrival": "None", "departure": "16:55:00", "stop_number": 1},
            {"train_number": "12301", "station_code": "NDLS", "day": 2,
             "arrival": "10:00:00", "departure": "None", "stop_number": 2},
            {"train_number": "12301", "station_code": "CNB", "day": null,
             "arrival": null, "departure": null}
        ]"#;

        let records = parse_schedules(Path::new("schedules.json"), content).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].arrival, None);
        assert_eq!(records[0].departure.as_deref(), Some("16:55:00"));
        assert_eq!(records[1].departure, None);
        assert_eq!(records[2].day, None);
    }

    #[test]
    fn malformed_schedule_list_is_fatal() {
        let err = parse_schedules(Path::new("schedules.json"), "{\"not\": \"a list\"}")
            .unwrap_err();
        assert!(matches!(err, SourceError::Json { .. }));
    }
}
