use anyhow::{Context, Result};
use itertools::Itertools;
use junction::geojson_source::StationRecord;
use junction::models::NewStation;
use junction::postgres_tools::JunctionPostgresPool;
use junction::spatial::StationPoint;
use diesel_async::RunQueryDsl;
use std::sync::Arc;

pub struct StationImportResult {
    pub imported: usize,
    pub with_coords: usize,
    /// Candidate list for the spatial index, insertion order preserved.
    pub points: Vec<StationPoint>,
}

/// Inserts every station, ignoring codes that already exist so the
/// import can re-run. Stations without coordinates are persisted but
/// never become spatial-match candidates.
pub async fn stations_into_postgres(
    records: &[StationRecord],
    arc_conn_pool: Arc<JunctionPostgresPool>,
) -> Result<StationImportResult> {
    use junction::schema::stations::dsl as stations_dsl;

    let conn_pool = arc_conn_pool.as_ref();
    let mut conn = conn_pool
        .get()
        .await
        .context("failed to check out a connection for station import")?;

    let mut points = Vec::new();

    for chunk in &records.iter().chunks(128) {
        let mut insertable_stations = Vec::new();

        for record in chunk {
            insertable_stations.push(NewStation {
                code: record.code.clone(),
                name: record.name.clone(),
                latitude: record.latitude,
                longitude: record.longitude,
                zone: record.zone.clone(),
                state: record.state.clone(),
                address: record.address.clone(),
            });

            if let (Some(latitude), Some(longitude)) = (record.latitude, record.longitude) {
                points.push(StationPoint {
                    code: record.code.clone(),
                    latitude,
                    longitude,
                });
            }
        }

        diesel::insert_into(stations_dsl::stations)
            .values(insertable_stations)
            .on_conflict(stations_dsl::code)
            .do_nothing()
            .execute(&mut conn)
            .await
            .context("failed to insert station chunk")?;
    }

    Ok(StationImportResult {
        imported: records.len(),
        with_coords: points.len(),
        points,
    })
}
