use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

mod config;
mod db;
mod error;
mod http;
mod models;
mod range;
mod report;
mod stats;

use config::DashboardConfig;
use models::JobFairStats;
use range::QueryRange;

#[derive(Parser)]
#[command(name = "jobfair-dashboard")]
#[command(about = "Recruitment event analytics over job fair applications", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: DashboardConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RangeArgs {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Aggregate an exported CSV instead of querying Postgres
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo job fair dataset
    Seed,
    /// Serve the dashboard API over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Print aggregated statistics as JSON
    Stats {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long, default_value = "jobfair_report.md")]
        out: PathBuf,
    },
}

async fn collect_stats(
    config: &DashboardConfig,
    args: &RangeArgs,
) -> anyhow::Result<(QueryRange, JobFairStats)> {
    let range = range::normalize(args.start, args.end, &config.default_window());
    if range.is_reversed() {
        tracing::warn!("start date is after end date; aggregates will be empty");
    }

    let stats = match &args.csv {
        Some(path) => {
            let records = stats::read_csv(path)?;
            tracing::info!(records = records.len(), path = %path.display(), "loaded CSV export");
            stats::build_stats(stats::aggregate_records(&records, &range))
        }
        None => {
            let pool = config.connect().await?;
            db::fetch_stats(&pool, &range)
                .await
                .context("failed to fetch job fair data")?
        }
    };

    Ok((range, stats))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobfair_dashboard=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Commands::InitDb => {
            let pool = config.connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = config.connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Serve { bind } => {
            let pool = config.connect().await?;
            let state = Arc::new(http::AppState {
                pool,
                defaults: config.default_window(),
            });
            let router = http::build_router(state);

            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            tracing::info!("job fair dashboard listening on {}", bind);
            axum::serve(listener, router).await?;
        }
        Commands::Stats { range } => {
            let (_, stats) = collect_stats(&config, &range).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Report { range, out } => {
            let (range, stats) = collect_stats(&config, &range).await?;
            let report = report::build_report(&range, &stats);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
