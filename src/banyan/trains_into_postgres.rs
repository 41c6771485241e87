use anyhow::{Context, Result};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use itertools::Itertools;
use junction::geojson_source::TrainRecord;
use junction::models::{NewMappingWarning, NewTrain, NewTrainRoute, NewTrainStop};
use junction::postgres_tools::JunctionPostgresPool;
use junction::route_mapping::{DEFAULT_MATCH_RADIUS_KM, map_route};
use junction::spatial::SpatialIndex;
use std::sync::Arc;

#[derive(Default)]
pub struct TrainImportResult {
    pub imported: usize,
    pub draft_stops: usize,
    pub coords_mapped: usize,
    pub coords_unmapped: usize,
    pub warnings: usize,
}

/// Inserts trains, stores raw route geometry, and materializes each
/// train's draft stop skeleton from the spatial index. Draft rows use
/// `on_conflict do_nothing`: the Schedule Reconciler overwrites them
/// later wherever authoritative times exist.
pub async fn trains_into_postgres(
    records: &[TrainRecord],
    index: &SpatialIndex,
    arc_conn_pool: Arc<JunctionPostgresPool>,
) -> Result<TrainImportResult> {
    use junction::schema::mapping_warnings::dsl as warnings_dsl;
    use junction::schema::train_routes::dsl as routes_dsl;
    use junction::schema::train_stops::dsl as stops_dsl;
    use junction::schema::trains::dsl as trains_dsl;

    let conn_pool = arc_conn_pool.as_ref();
    let mut conn = conn_pool
        .get()
        .await
        .context("failed to check out a connection for train import")?;

    let mut result = TrainImportResult::default();

    for record in records {
        let insertable_train = NewTrain {
            number: record.number.clone(),
            name: record.name.clone(),
            train_type: record.train_type.clone(),
            zone: record.zone.clone(),
            from_station_code: record.from_station_code.clone(),
            to_station_code: record.to_station_code.clone(),
            departure_time: record.departure_time.clone(),
            arrival_time: record.arrival_time.clone(),
            distance_km: record.distance_km,
            duration_h: record.duration_h,
            duration_m: record.duration_m,
            classes: record.classes.clone(),
        };

        diesel::insert_into(trains_dsl::trains)
            .values(&insertable_train)
            .on_conflict(trains_dsl::number)
            .do_nothing()
            .execute(&mut conn)
            .await
            .with_context(|| format!("failed to insert train {}", record.number))?;

        // The insert may have been skipped by the conflict clause, so
        // the id always comes from a lookup.
        let train_id: i32 = trains_dsl::trains
            .filter(trains_dsl::number.eq(&record.number))
            .select(trains_dsl::id)
            .first(&mut conn)
            .await
            .with_context(|| format!("failed to resolve id of train {}", record.number))?;

        result.imported += 1;

        let Some(route) = record.route.as_ref() else {
            continue;
        };

        let geometry = NewTrainRoute {
            train_id,
            coordinates: serde_json::to_value(route)
                .with_context(|| format!("failed to encode route of train {}", record.number))?,
        };

        diesel::insert_into(routes_dsl::train_routes)
            .values(&geometry)
            .on_conflict(routes_dsl::train_id)
            .do_update()
            .set(routes_dsl::coordinates.eq(excluded(routes_dsl::coordinates)))
            .execute(&mut conn)
            .await
            .with_context(|| format!("failed to store route of train {}", record.number))?;

        let mapped = map_route(index, route, DEFAULT_MATCH_RADIUS_KM);
        result.coords_mapped += mapped.coords_mapped;
        result.coords_unmapped += mapped.coords_unmapped;

        let draft_stops: Vec<NewTrainStop> = mapped
            .stops
            .iter()
            .enumerate()
            .map(|(position, stop)| NewTrainStop {
                train_id,
                station_code: stop.station_code.clone(),
                stop_sequence: position as i32 + 1,
                arrival_time: None,
                departure_time: None,
                day_offset: 0,
            })
            .collect();

        for chunk in &draft_stops.iter().chunks(128) {
            diesel::insert_into(stops_dsl::train_stops)
                .values(chunk.collect::<Vec<&NewTrainStop>>())
                .on_conflict((stops_dsl::train_id, stops_dsl::stop_sequence))
                .do_nothing()
                .execute(&mut conn)
                .await
                .with_context(|| {
                    format!("failed to insert draft stops of train {}", record.number)
                })?;
        }
        result.draft_stops += draft_stops.len();

        let warning_rows: Vec<NewMappingWarning> = mapped
            .warnings
            .iter()
            .map(|warning| NewMappingWarning {
                train_number: record.number.clone(),
                coordinate_index: warning.coordinate_index as i32,
                latitude: warning.latitude,
                longitude: warning.longitude,
                nearest_station_code: warning.nearest_station_code.clone(),
                distance_km: warning.distance_km,
                warning_type: warning.kind.as_str().to_string(),
                message: warning.message.clone(),
            })
            .collect();

        for chunk in &warning_rows.iter().chunks(128) {
            diesel::insert_into(warnings_dsl::mapping_warnings)
                .values(chunk.collect::<Vec<&NewMappingWarning>>())
                .execute(&mut conn)
                .await
                .with_context(|| {
                    format!("failed to record mapping warnings of train {}", record.number)
                })?;
        }
        result.warnings += warning_rows.len();
    }

    Ok(result)
}
