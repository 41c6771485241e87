use anyhow::{Context, Result};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use junction::postgres_tools::JunctionPostgresPool;
use std::sync::Arc;

use crate::run_generation::RunGenerationResult;
use crate::schedules_into_postgres::ScheduleImportResult;
use crate::seats_into_postgres::SeatGenerationResult;
use crate::stations_into_postgres::StationImportResult;
use crate::trains_into_postgres::TrainImportResult;

/// Everything the import pipeline learned, printed at the end of a run.
pub struct ImportStats {
    pub stations: StationImportResult,
    pub trains: TrainImportResult,
    pub schedules: ScheduleImportResult,
    pub runs: Option<RunGenerationResult>,
    pub seats: Option<SeatGenerationResult>,
}

pub async fn print_report(
    stats: &ImportStats,
    arc_conn_pool: Arc<JunctionPostgresPool>,
) -> Result<()> {
    use junction::schema::mapping_warnings::dsl as warnings_dsl;

    let conn_pool = arc_conn_pool.as_ref();
    let mut conn = conn_pool
        .get()
        .await
        .context("failed to check out a connection for the import report")?;

    let warning_counts: Vec<(String, i64)> = warnings_dsl::mapping_warnings
        .group_by(warnings_dsl::warning_type)
        .select((warnings_dsl::warning_type, count_star()))
        .order(warnings_dsl::warning_type.asc())
        .load(&mut conn)
        .await
        .context("failed to summarize mapping warnings")?;

    println!("==== import report ====");
    println!(
        "stations: {} imported, {} with coordinates",
        stats.stations.imported, stats.stations.with_coords
    );
    println!(
        "trains: {} imported, {} draft stops",
        stats.trains.imported, stats.trains.draft_stops
    );

    let attempted = stats.trains.coords_mapped + stats.trains.coords_unmapped;
    if attempted > 0 {
        println!(
            "route mapping: {}/{} coordinates matched ({:.1}%), {} warnings",
            stats.trains.coords_mapped,
            attempted,
            stats.trains.coords_mapped as f64 / attempted as f64 * 100.0,
            stats.trains.warnings
        );
    }

    println!(
        "schedules: {} trains reconciled, {} skipped, {} failed, {} stops upserted",
        stats.schedules.trains_matched,
        stats.schedules.trains_skipped,
        stats.schedules.trains_failed,
        stats.schedules.stops_upserted
    );

    if let Some(runs) = &stats.runs {
        println!(
            "runs: {} created across {} trains",
            runs.runs_created, runs.trains_covered
        );
    }

    if let Some(seats) = &stats.seats {
        println!(
            "seats: {} created across {} runs of {} trains ({} skipped, {} failed)",
            seats.seats_created,
            seats.runs_processed,
            seats.trains_processed,
            seats.runs_skipped,
            seats.runs_failed
        );
    }

    if warning_counts.is_empty() {
        println!("mapping warnings: none recorded");
    } else {
        for (warning_type, count) in &warning_counts {
            println!("mapping warnings: {warning_type} x {count}");
        }
    }

    Ok(())
}
