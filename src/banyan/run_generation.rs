use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use itertools::Itertools;
use junction::models::NewTrainRun;
use junction::postgres_tools::JunctionPostgresPool;
use std::sync::Arc;

#[derive(Default)]
pub struct RunGenerationResult {
    pub runs_created: usize,
    pub trains_covered: usize,
}

/// Materializes one run row per (train, service date) for the given
/// window starting today. Seat counters start at zero; the seat
/// generator owns them once inventory exists.
pub async fn generate_runs(
    start_date: NaiveDate,
    days_ahead: u32,
    arc_conn_pool: Arc<JunctionPostgresPool>,
) -> Result<RunGenerationResult> {
    use junction::schema::train_runs::dsl as runs_dsl;
    use junction::schema::trains::dsl as trains_dsl;

    let conn_pool = arc_conn_pool.as_ref();
    let mut conn = conn_pool
        .get()
        .await
        .context("failed to check out a connection for run generation")?;

    let train_ids: Vec<i32> = trains_dsl::trains
        .select(trains_dsl::id)
        .load(&mut conn)
        .await
        .context("failed to list trains for run generation")?;

    let mut run_rows: Vec<NewTrainRun> = Vec::with_capacity(train_ids.len() * days_ahead as usize);
    for &train_id in &train_ids {
        for offset in 0..days_ahead {
            run_rows.push(NewTrainRun {
                train_id,
                run_date: start_date + Duration::days(i64::from(offset)),
                status: "SCHEDULED".to_string(),
                total_seats: 0,
                available_seats: 0,
            });
        }
    }

    let mut created = 0usize;
    for chunk in &run_rows.iter().chunks(128) {
        created += diesel::insert_into(runs_dsl::train_runs)
            .values(chunk.collect::<Vec<&NewTrainRun>>())
            .on_conflict((runs_dsl::train_id, runs_dsl::run_date))
            .do_nothing()
            .execute(&mut conn)
            .await
            .context("failed to insert run chunk")?;
    }

    Ok(RunGenerationResult {
        runs_created: created,
        trains_covered: train_ids.len(),
    })
}
