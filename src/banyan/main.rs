// Railway data import pipeline.
//
// `banyan import` runs the whole pipeline against a data directory:
// schema DDL, stations, spatial index, trains with route mapping,
// schedule reconciliation, run generation, seat generation, report.
// `banyan generate-seats` runs the seat generator on its own.

mod report;
mod run_generation;
mod schedules_into_postgres;
mod seats_into_postgres;
mod stations_into_postgres;
mod trains_into_postgres;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use diesel_async::SimpleAsyncConnection;
use junction::postgres_tools::make_async_pool;
use junction::seat_layout::DEFAULT_SEAT_BATCH_SIZE;
use junction::spatial::SpatialIndex;
use std::path::PathBuf;
use std::sync::Arc;

use report::{ImportStats, print_report};

#[derive(Parser)]
#[command(name = "banyan", about = "Railway network import pipeline")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full import pipeline from a data directory.
    Import {
        /// Directory holding stations.geojson, trains.geojson and
        /// schedules.json.
        #[arg(long)]
        data_dir: PathBuf,
        /// How many days of train runs to materialize.
        #[arg(long, default_value_t = 30)]
        days_ahead: u32,
        /// Skip run generation (implies no seat generation).
        #[arg(long, default_value_t = false)]
        skip_runs: bool,
        /// Skip seat generation.
        #[arg(long, default_value_t = false)]
        skip_seats: bool,
    },
    /// Generate seat inventory for upcoming runs that have none.
    GenerateSeats {
        /// Window of run dates to cover, starting today.
        #[arg(long, default_value_t = 20)]
        days: u32,
        /// Seat rows per insert statement.
        #[arg(long, default_value_t = DEFAULT_SEAT_BATCH_SIZE)]
        batch_size: usize,
        /// Restrict generation to these train numbers (repeatable).
        #[arg(long = "train-number")]
        train_numbers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?;

    let pool = make_async_pool(&database_url)
        .await
        .map_err(|e| anyhow!("failed to connect to postgres: {e}"))?;
    let arc_pool = Arc::new(pool);

    ensure_schema(Arc::clone(&arc_pool)).await?;

    match args.command {
        Commands::Import {
            data_dir,
            days_ahead,
            skip_runs,
            skip_seats,
        } => {
            import(data_dir, days_ahead, skip_runs, skip_seats, arc_pool).await?;
        }
        Commands::GenerateSeats {
            days,
            batch_size,
            train_numbers,
        } => {
            let today = chrono::Utc::now().date_naive();
            let seats = seats_into_postgres::seats_into_postgres(
                today,
                days,
                batch_size,
                &train_numbers,
                arc_pool,
            )
            .await
            .context("seat generation failed")?;
            println!(
                "seats: {} created across {} runs of {} trains ({} skipped, {} failed)",
                seats.seats_created,
                seats.runs_processed,
                seats.trains_processed,
                seats.runs_skipped,
                seats.runs_failed
            );
        }
    }

    Ok(())
}

async fn ensure_schema(arc_pool: Arc<junction::postgres_tools::JunctionPostgresPool>) -> Result<()> {
    let mut conn = arc_pool
        .get()
        .await
        .context("failed to check out a connection for schema setup")?;
    conn.batch_execute(include_str!("../../sql/schema.sql"))
        .await
        .context("failed to apply schema")?;
    Ok(())
}

async fn import(
    data_dir: PathBuf,
    days_ahead: u32,
    skip_runs: bool,
    skip_seats: bool,
    arc_pool: Arc<junction::postgres_tools::JunctionPostgresPool>,
) -> Result<()> {
    let station_records = junction::geojson_source::read_stations(&data_dir.join("stations.geojson"))
        .context("failed to read stations.geojson")?;
    let train_records = junction::geojson_source::read_trains(&data_dir.join("trains.geojson"))
        .context("failed to read trains.geojson")?;
    let schedule_records = junction::geojson_source::read_schedules(&data_dir.join("schedules.json"))
        .context("failed to read schedules.json")?;

    log::info!(
        "loaded {} stations, {} trains, {} schedule records",
        station_records.len(),
        train_records.len(),
        schedule_records.len()
    );

    let stations =
        stations_into_postgres::stations_into_postgres(&station_records, Arc::clone(&arc_pool))
            .await
            .context("station import failed")?;

    let index = SpatialIndex::new(stations.points.clone());
    log::info!("spatial index holds {} stations", index.len());

    let trains = trains_into_postgres::trains_into_postgres(
        &train_records,
        &index,
        Arc::clone(&arc_pool),
    )
    .await
    .context("train import failed")?;

    let schedules = schedules_into_postgres::schedules_into_postgres(
        schedule_records,
        Arc::clone(&arc_pool),
    )
    .await
    .context("schedule reconciliation failed")?;

    let today = chrono::Utc::now().date_naive();

    let runs = if skip_runs {
        None
    } else {
        Some(
            run_generation::generate_runs(today, days_ahead, Arc::clone(&arc_pool))
                .await
                .context("run generation failed")?,
        )
    };

    let seats = if skip_runs || skip_seats {
        None
    } else {
        Some(
            seats_into_postgres::seats_into_postgres(
                today,
                days_ahead,
                DEFAULT_SEAT_BATCH_SIZE,
                &[],
                Arc::clone(&arc_pool),
            )
            .await
            .context("seat generation failed")?,
        )
    };

    let stats = ImportStats {
        stations,
        trains,
        schedules,
        runs,
        seats,
    };

    print_report(&stats, arc_pool).await?;

    Ok(())
}
