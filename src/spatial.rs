//! Nearest-station lookup over a fixed set of coordinates.
//!
//! Two interchangeable backends sit behind [`SpatialIndex::find_nearest`]:
//! an rstar R-tree for O(log n) queries and an exhaustive linear scan.
//! Both must return bit-identical answers for the same candidate list;
//! ties are broken by insertion order (first station at the minimum
//! distance wins).

use rstar::{AABB, PointDistance, RTree, RTreeObject};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two (lat, lon) points.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// A station that can participate in spatial matching. Stations without
/// coordinates never make it into this list.
#[derive(Debug, Clone)]
pub struct StationPoint {
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Tree entry: coordinates in (x=lon, y=lat) degree space plus the
/// position of the station in the candidate list.
#[derive(Debug, Clone, PartialEq)]
struct IndexedPoint {
    lon: f64,
    lat: f64,
    ordinal: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lon, self.lat])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.lon - point[0];
        let dy = self.lat - point[1];
        dx * dx + dy * dy
    }
}

enum Backend {
    Tree(RTree<IndexedPoint>),
    Scan,
}

pub struct SpatialIndex {
    points: Vec<StationPoint>,
    backend: Backend,
}

impl SpatialIndex {
    /// Builds the R-tree backend. Empty input degrades to the scan
    /// backend, which answers `None` unconditionally on an empty set.
    pub fn new(points: Vec<StationPoint>) -> SpatialIndex {
        if points.is_empty() {
            return SpatialIndex::linear(points);
        }

        let entries: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(ordinal, p)| IndexedPoint {
                lon: p.longitude,
                lat: p.latitude,
                ordinal,
            })
            .collect();

        SpatialIndex {
            points,
            backend: Backend::Tree(RTree::bulk_load(entries)),
        }
    }

    /// Exhaustive O(n) backend.
    pub fn linear(points: Vec<StationPoint>) -> SpatialIndex {
        SpatialIndex {
            points,
            backend: Backend::Scan,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest station to (lat, lon) within `max_distance_km`, or `None`
    /// when the set is empty or the minimum exceeds the radius.
    pub fn find_nearest(&self, lat: f64, lon: f64, max_distance_km: f64) -> Option<(&str, f64)> {
        if self.points.is_empty() {
            return None;
        }

        let best = match &self.backend {
            Backend::Scan => self.scan_nearest(lat, lon),
            Backend::Tree(tree) => self.tree_nearest(tree, lat, lon, max_distance_km),
        };

        match best {
            Some((ordinal, distance_km)) if distance_km <= max_distance_km => {
                Some((self.points[ordinal].code.as_str(), distance_km))
            }
            _ => None,
        }
    }

    fn scan_nearest(&self, lat: f64, lon: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (ordinal, p) in self.points.iter().enumerate() {
            let d = haversine_km(lat, lon, p.latitude, p.longitude);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((ordinal, d));
            }
        }
        best
    }

    fn tree_nearest(
        &self,
        tree: &RTree<IndexedPoint>,
        lat: f64,
        lon: f64,
        max_distance_km: f64,
    ) -> Option<(usize, f64)> {
        // Conservative prefilter in degree space: one degree of
        // longitude shrinks by cos(lat), so size the envelope for the
        // latitude inside the search circle closest to a pole.
        let angular_deg = (max_distance_km / EARTH_RADIUS_KM).to_degrees();
        let extreme_lat = lat.abs() + angular_deg;
        if extreme_lat >= 89.0 {
            // Degree-space envelopes degenerate near the poles.
            return self.scan_nearest(lat, lon);
        }
        let radius_deg = angular_deg / extreme_lat.to_radians().cos() * 1.05;

        // Stored longitudes stay in [-180, 180]; an envelope crossing
        // the antimeridian needs a second query shifted by 360.
        let mut centers = [Some(lon), None, None];
        if lon + radius_deg > 180.0 {
            centers[1] = Some(lon - 360.0);
        }
        if lon - radius_deg < -180.0 {
            centers[2] = Some(lon + 360.0);
        }

        let mut best: Option<(usize, f64)> = None;
        for center in centers.into_iter().flatten() {
            for candidate in tree.locate_within_distance([center, lat], radius_deg * radius_deg) {
                let p = &self.points[candidate.ordinal];
                let d = haversine_km(lat, lon, p.latitude, p.longitude);
                let replace = match best {
                    None => true,
                    // Same tie-break as the scan: first (lowest ordinal)
                    // station at the minimum distance wins.
                    Some((bo, bd)) => d < bd || (d == bd && candidate.ordinal < bo),
                };
                if replace {
                    best = Some((candidate.ordinal, d));
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stations() -> Vec<StationPoint> {
        vec![
            StationPoint {
                code: "NDLS".to_string(),
                latitude: 28.6430,
                longitude: 77.2194,
            },
            StationPoint {
                code: "DLI".to_string(),
                latitude: 28.6620,
                longitude: 77.2273,
            },
            StationPoint {
                code: "CNB".to_string(),
                latitude: 26.4535,
                longitude: 80.3508,
            },
            StationPoint {
                code: "ALD".to_string(),
                latitude: 25.4435,
                longitude: 81.8258,
            },
            StationPoint {
                code: "MGS".to_string(),
                latitude: 25.2815,
                longitude: 83.1198,
            },
            StationPoint {
                code: "BSB".to_string(),
                latitude: 25.3220,
                longitude: 83.0130,
            },
        ]
    }

    #[test]
    fn haversine_identity_is_zero() {
        assert_eq!(haversine_km(28.6430, 77.2194, 28.6430, 77.2194), 0.0);
    }

    #[test]
    fn haversine_is_symmetric() {
        let ab = haversine_km(28.6430, 77.2194, 26.4535, 80.3508);
        let ba = haversine_km(26.4535, 80.3508, 28.6430, 77.2194);
        assert_eq!(ab.to_bits(), ba.to_bits());
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        // One degree of latitude is about 111.19 km on a 6371 km sphere.
        let d = haversine_km(25.0, 80.0, 26.0, 80.0);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn empty_index_returns_none() {
        let index = SpatialIndex::new(Vec::new());
        assert!(index.find_nearest(28.6, 77.2, 1000.0).is_none());
        let scan = SpatialIndex::linear(Vec::new());
        assert!(scan.find_nearest(28.6, 77.2, 1000.0).is_none());
    }

    #[test]
    fn nearest_station_within_radius() {
        let index = SpatialIndex::new(sample_stations());
        let (code, d) = index.find_nearest(28.6448, 77.2200, 15.0).unwrap();
        assert_eq!(code, "NDLS");
        assert!(d < 1.0);
    }

    #[test]
    fn radius_cutoff_returns_none_even_when_a_nearest_exists() {
        let index = SpatialIndex::new(sample_stations());
        // Mumbai area: nearest sample station is hundreds of km away.
        assert!(index.find_nearest(19.0760, 72.8777, 15.0).is_none());
        assert!(index.find_nearest(19.0760, 72.8777, 5000.0).is_some());
    }

    #[test]
    fn backends_agree_bit_for_bit() {
        let tree = SpatialIndex::new(sample_stations());
        let scan = SpatialIndex::linear(sample_stations());

        let mut queries = Vec::new();
        for lat_step in 0..20 {
            for lon_step in 0..20 {
                queries.push((
                    24.0 + 0.3 * lat_step as f64,
                    76.0 + 0.4 * lon_step as f64,
                ));
            }
        }

        for (lat, lon) in queries {
            for radius in [5.0, 15.0, 50.0, 500.0] {
                let a = tree.find_nearest(lat, lon, radius);
                let b = scan.find_nearest(lat, lon, radius);
                match (a, b) {
                    (None, None) => {}
                    (Some((ca, da)), Some((cb, db))) => {
                        assert_eq!(ca, cb, "station mismatch at ({lat}, {lon})");
                        assert_eq!(da.to_bits(), db.to_bits(), "distance mismatch at ({lat}, {lon})");
                    }
                    (a, b) => panic!("backend disagreement at ({lat}, {lon}): {a:?} vs {b:?}"),
                }
            }
        }
    }

    #[test]
    fn backends_agree_across_the_antimeridian() {
        let stations = vec![
            StationPoint {
                code: "EAST".to_string(),
                latitude: -17.75,
                longitude: 179.99,
            },
            StationPoint {
                code: "WEST".to_string(),
                latitude: -17.75,
                longitude: -179.90,
            },
        ];
        let tree = SpatialIndex::new(stations.clone());
        let scan = SpatialIndex::linear(stations);

        // Nearest station sits on the other side of the 180 meridian.
        for (lat, lon) in [(-17.75, -179.99), (-17.75, 179.98), (-17.70, 180.0)] {
            for radius in [5.0, 15.0, 50.0] {
                let a = tree.find_nearest(lat, lon, radius);
                let b = scan.find_nearest(lat, lon, radius);
                match (a, b) {
                    (None, None) => {}
                    (Some((ca, da)), Some((cb, db))) => {
                        assert_eq!(ca, cb, "station mismatch at ({lat}, {lon})");
                        assert_eq!(da.to_bits(), db.to_bits(), "distance mismatch at ({lat}, {lon})");
                    }
                    (a, b) => panic!("backend disagreement at ({lat}, {lon}): {a:?} vs {b:?}"),
                }
            }
        }

        let (code, d) = tree.find_nearest(-17.75, -179.99, 15.0).unwrap();
        assert_eq!(code, "EAST");
        assert!(d < 3.0, "got {d}");
    }

    #[test]
    fn backends_agree_near_the_poles() {
        let stations = vec![
            StationPoint {
                code: "POLAR".to_string(),
                latitude: 89.5,
                longitude: 10.0,
            },
            StationPoint {
                code: "SOUTH".to_string(),
                latitude: -89.4,
                longitude: -120.0,
            },
        ];
        let tree = SpatialIndex::new(stations.clone());
        let scan = SpatialIndex::linear(stations);

        for (lat, lon) in [(89.6, 170.0), (89.9, -5.0), (-89.5, 60.0)] {
            for radius in [15.0, 100.0, 500.0] {
                let a = tree.find_nearest(lat, lon, radius);
                let b = scan.find_nearest(lat, lon, radius);
                assert_eq!(
                    a.map(|(c, d)| (c, d.to_bits())),
                    b.map(|(c, d)| (c, d.to_bits())),
                    "backend disagreement at ({lat}, {lon}) radius {radius}"
                );
            }
        }
    }

    #[test]
    fn ties_resolve_to_first_inserted_station() {
        let stations = vec![
            StationPoint {
                code: "AAA".to_string(),
                latitude: 20.0,
                longitude: 78.0,
            },
            StationPoint {
                code: "BBB".to_string(),
                latitude: 20.0,
                longitude: 78.0,
            },
        ];
        let tree = SpatialIndex::new(stations.clone());
        let scan = SpatialIndex::linear(stations);
        assert_eq!(tree.find_nearest(20.0, 78.0, 15.0).unwrap().0, "AAA");
        assert_eq!(scan.find_nearest(20.0, 78.0, 15.0).unwrap().0, "AAA");
    }
}
