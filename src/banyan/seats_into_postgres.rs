use ahash::AHashSet;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use itertools::Itertools;
use junction::models::NewSeat;
use junction::postgres_tools::JunctionPostgresPool;
use junction::seat_layout::{parse_classes_config, seat_rows_for_run};
use std::sync::Arc;

#[derive(Default)]
pub struct SeatGenerationResult {
    pub runs_processed: usize,
    pub runs_skipped: usize,
    pub runs_failed: usize,
    pub seats_created: usize,
    pub trains_processed: usize,
}

/// Populates seat inventory for every run in the upcoming window that
/// has none yet. The window query selects exactly the zero-seat runs
/// (anti-join on seats), so a run that already carries inventory is
/// never reloaded or regenerated. Each selected run's seats and
/// counters commit in a single transaction.
pub async fn seats_into_postgres(
    start_date: NaiveDate,
    days: u32,
    batch_size: usize,
    train_numbers: &[String],
    arc_conn_pool: Arc<JunctionPostgresPool>,
) -> Result<SeatGenerationResult> {
    use junction::schema::seats::dsl as seats_dsl;
    use junction::schema::train_runs::dsl as runs_dsl;
    use junction::schema::trains::dsl as trains_dsl;

    let conn_pool = arc_conn_pool.as_ref();
    let mut conn = conn_pool
        .get()
        .await
        .context("failed to check out a connection for seat generation")?;

    let end_date = start_date + Duration::days(i64::from(days.saturating_sub(1)));

    let mut total_query = runs_dsl::train_runs
        .inner_join(trains_dsl::trains)
        .filter(runs_dsl::run_date.ge(start_date))
        .filter(runs_dsl::run_date.le(end_date))
        .select(diesel::dsl::count_star())
        .into_boxed();

    let mut window_query = runs_dsl::train_runs
        .inner_join(trains_dsl::trains)
        .left_join(seats_dsl::seats)
        .filter(runs_dsl::run_date.ge(start_date))
        .filter(runs_dsl::run_date.le(end_date))
        .filter(seats_dsl::id.is_null())
        .select((
            runs_dsl::id,
            trains_dsl::number,
            trains_dsl::classes,
            trains_dsl::distance_km,
        ))
        .order((runs_dsl::run_date.asc(), trains_dsl::number.asc()))
        .into_boxed();

    if !train_numbers.is_empty() {
        total_query = total_query.filter(trains_dsl::number.eq_any(train_numbers));
        window_query = window_query.filter(trains_dsl::number.eq_any(train_numbers));
    }

    let runs_in_window: i64 = total_query
        .get_result(&mut conn)
        .await
        .context("failed to count runs in the seat generation window")?;

    let window: Vec<(i32, String, Option<String>, Option<i32>)> = window_query
        .load(&mut conn)
        .await
        .context("failed to load runs for seat generation")?;

    let mut result = SeatGenerationResult::default();
    let mut touched_trains: AHashSet<String> = AHashSet::new();

    // Runs filtered out by the anti-join already have inventory.
    result.runs_skipped = (runs_in_window as usize).saturating_sub(window.len());

    for (run_id, train_number, classes, distance_km) in window {
        let class_config = parse_classes_config(classes.as_deref());
        let seat_rows = seat_rows_for_run(run_id, &class_config, distance_km.map(f64::from));

        if seat_rows.is_empty() {
            log::warn!("train {train_number} run {run_id} produced no seats");
            result.runs_skipped += 1;
            continue;
        }

        match insert_run_seats(&mut conn, run_id, seat_rows, batch_size).await {
            Ok(created) => {
                result.runs_processed += 1;
                result.seats_created += created;
                touched_trains.insert(train_number);
            }
            Err(err) => {
                log::error!("seat generation failed for train {train_number} run {run_id}: {err}");
                result.runs_failed += 1;
            }
        }
    }

    result.trains_processed = touched_trains.len();

    Ok(result)
}

/// Inserts one run's inventory and its counters atomically.
async fn insert_run_seats(
    conn: &mut diesel_async::pooled_connection::bb8::PooledConnection<
        '_,
        diesel_async::AsyncPgConnection,
    >,
    run_id: i32,
    seat_rows: Vec<NewSeat>,
    batch_size: usize,
) -> Result<usize, diesel::result::Error> {
    use junction::schema::seats::dsl as seats_dsl;
    use junction::schema::train_runs::dsl as runs_dsl;

    let total = seat_rows.len();
    let batches: Vec<Vec<NewSeat>> = seat_rows
        .into_iter()
        .chunks(batch_size.max(1))
        .into_iter()
        .map(|chunk| chunk.collect())
        .collect();

    conn.build_transaction()
        .run::<_, diesel::result::Error, _>(|conn| {
            Box::pin(async move {
                for batch in &batches {
                    diesel::insert_into(seats_dsl::seats)
                        .values(batch)
                        .execute(conn)
                        .await?;
                }

                diesel::update(runs_dsl::train_runs.filter(runs_dsl::id.eq(run_id)))
                    .set((
                        runs_dsl::total_seats.eq(total as i32),
                        runs_dsl::available_seats.eq(total as i32),
                    ))
                    .execute(conn)
                    .await?;

                Ok(())
            })
        })
        .await?;

    Ok(total)
}
