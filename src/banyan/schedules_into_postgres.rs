use ahash::AHashMap;
use anyhow::{Context, Result};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use itertools::Itertools;
use junction::models::NewTrainStop;
use junction::postgres_tools::JunctionPostgresPool;
use junction::schedule::{ScheduleRecord, order_schedule};
use std::sync::Arc;

#[derive(Default)]
pub struct ScheduleImportResult {
    pub trains_matched: usize,
    pub trains_skipped: usize,
    pub trains_failed: usize,
    pub stops_upserted: usize,
}

/// Reconciles the authoritative schedule feed against the draft stops
/// the route mapper produced. Records group by train number; each
/// train's group is ordered, ranked, and upserted at
/// (train_id, stop_sequence) so drafts gain real times. One train
/// failing never aborts the rest of the feed.
pub async fn schedules_into_postgres(
    records: Vec<ScheduleRecord>,
    arc_conn_pool: Arc<JunctionPostgresPool>,
) -> Result<ScheduleImportResult> {
    use junction::schema::trains::dsl as trains_dsl;

    let conn_pool = arc_conn_pool.as_ref();
    let mut conn = conn_pool
        .get()
        .await
        .context("failed to check out a connection for schedule reconciliation")?;

    let known_trains: Vec<(i32, String)> = trains_dsl::trains
        .select((trains_dsl::id, trains_dsl::number))
        .load(&mut conn)
        .await
        .context("failed to load train numbers for schedule reconciliation")?;

    let id_by_number: AHashMap<String, i32> = known_trains
        .into_iter()
        .map(|(id, number)| (number, id))
        .collect();

    let mut grouped: AHashMap<String, Vec<ScheduleRecord>> = AHashMap::new();
    for record in records {
        grouped
            .entry(record.train_number.clone())
            .or_default()
            .push(record);
    }

    let mut result = ScheduleImportResult::default();

    // Deterministic order makes reruns log identically.
    let mut train_numbers: Vec<String> = grouped.keys().cloned().collect();
    train_numbers.sort();

    for train_number in train_numbers {
        let group = grouped.remove(&train_number).unwrap_or_default();

        let Some(&train_id) = id_by_number.get(&train_number) else {
            log::warn!("schedule feed references unknown train {train_number}, skipping");
            result.trains_skipped += 1;
            continue;
        };

        let stop_rows: Vec<NewTrainStop> = order_schedule(group)
            .into_iter()
            .map(|stop| NewTrainStop {
                train_id,
                station_code: stop.station_code,
                stop_sequence: stop.stop_sequence,
                arrival_time: stop.arrival,
                departure_time: stop.departure,
                day_offset: stop.day_offset,
            })
            .collect();

        match upsert_train_stops(&mut conn, &stop_rows).await {
            Ok(()) => {
                result.trains_matched += 1;
                result.stops_upserted += stop_rows.len();
            }
            Err(err) => {
                log::error!("schedule reconciliation failed for train {train_number}: {err}");
                result.trains_failed += 1;
            }
        }
    }

    Ok(result)
}

async fn upsert_train_stops(
    conn: &mut diesel_async::pooled_connection::bb8::PooledConnection<
        '_,
        diesel_async::AsyncPgConnection,
    >,
    stop_rows: &[NewTrainStop],
) -> Result<(), diesel::result::Error> {
    use junction::schema::train_stops::dsl as stops_dsl;

    for chunk in &stop_rows.iter().chunks(128) {
        diesel::insert_into(stops_dsl::train_stops)
            .values(chunk.collect::<Vec<&NewTrainStop>>())
            .on_conflict((stops_dsl::train_id, stops_dsl::stop_sequence))
            .do_update()
            .set((
                stops_dsl::station_code.eq(excluded(stops_dsl::station_code)),
                stops_dsl::arrival_time.eq(excluded(stops_dsl::arrival_time)),
                stops_dsl::departure_time.eq(excluded(stops_dsl::departure_time)),
                stops_dsl::day_offset.eq(excluded(stops_dsl::day_offset)),
            ))
            .execute(conn)
            .await?;
    }

    Ok(())
}
