//! Converts a train's raw route geometry into a draft ordered stop list.
//!
//! Each coordinate is matched against the station index; consecutive
//! duplicates collapse so only distinct accepted stations survive.
//! Matching quality issues are reported as warnings, never as errors:
//! a coordinate that matches nothing simply contributes no stop.

use crate::spatial::SpatialIndex;

/// Default search radius for matching a route coordinate to a station.
pub const DEFAULT_MATCH_RADIUS_KM: f64 = 15.0;

/// Accepted matches farther than this still count, but get flagged.
pub const LARGE_DISTANCE_KM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    LargeDistance,
    NoStationNearby,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::LargeDistance => "LARGE_DISTANCE",
            WarningKind::NoStationNearby => "NO_STATION_NEARBY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteWarning {
    pub coordinate_index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub nearest_station_code: Option<String>,
    pub distance_km: Option<f64>,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct MappedStop {
    pub station_code: String,
    /// Index of the route coordinate that first produced this stop.
    pub coordinate_index: usize,
}

#[derive(Debug, Default)]
pub struct MappedRoute {
    /// Accepted stations in route order, consecutive duplicates collapsed.
    /// Stop sequence is list position, 1-based.
    pub stops: Vec<MappedStop>,
    pub warnings: Vec<RouteWarning>,
    pub coords_mapped: usize,
    pub coords_unmapped: usize,
}

/// Maps an ordered list of route coordinates (GeoJSON order: lon, lat)
/// to a station-stop skeleton.
pub fn map_route(
    index: &SpatialIndex,
    coordinates: &[(f64, f64)],
    threshold_km: f64,
) -> MappedRoute {
    let mut mapped = MappedRoute::default();
    let mut prev_station: Option<String> = None;

    for (idx, &(lon, lat)) in coordinates.iter().enumerate() {
        match index.find_nearest(lat, lon, threshold_km) {
            Some((station_code, distance_km)) => {
                if prev_station.as_deref() != Some(station_code) {
                    mapped.stops.push(MappedStop {
                        station_code: station_code.to_string(),
                        coordinate_index: idx,
                    });
                    prev_station = Some(station_code.to_string());
                    mapped.coords_mapped += 1;
                }

                // Flagged even when the dedup above swallowed the stop.
                if distance_km > LARGE_DISTANCE_KM {
                    mapped.warnings.push(RouteWarning {
                        coordinate_index: idx,
                        latitude: lat,
                        longitude: lon,
                        nearest_station_code: Some(station_code.to_string()),
                        distance_km: Some(distance_km),
                        kind: WarningKind::LargeDistance,
                        message: format!(
                            "Station {station_code} is {distance_km:.2}km from route point"
                        ),
                    });
                }
            }
            None => {
                mapped.coords_unmapped += 1;
                mapped.warnings.push(RouteWarning {
                    coordinate_index: idx,
                    latitude: lat,
                    longitude: lon,
                    nearest_station_code: None,
                    distance_km: None,
                    kind: WarningKind::NoStationNearby,
                    message: format!("No station within {threshold_km}km of route point"),
                });
            }
        }
    }

    mapped
}
