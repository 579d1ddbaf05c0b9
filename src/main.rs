//! Entry point for the price-transparency ingestion pipeline.

use chrono::NaiveDate;
use clap::Parser;
use log::info;
use price_ingest::{config, database, driver, state::AppContext, utils};

/// Runs one ingestion pass over every chain known to the catalog.
#[derive(Parser, Debug)]
#[command(name = "price-ingest", version = config::VERSION, about)]
struct Cli {
    /// Size of the bounded worker pool
    #[arg(short = 'p', long, default_value_t = 0)]
    processes: usize,

    /// Skip downloading fresh files, reconciling whatever is already cached
    #[arg(long = "no-download", alias = "nd", short = 'n')]
    no_download: bool,

    /// Sync the chain catalog from the ministry portal before parsing
    #[arg(short = 'c', long = "parse-chains")]
    parse_chains: bool,

    /// Skip the promotions parser, reconciling prices only
    #[arg(long = "no-promos")]
    no_promos: bool,

    /// Snapshot date to reconcile, in YYYY-MM-DD form (default: today)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| format!("invalid date {raw:?}: {err}"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut config = config::load_config();
    utils::logging::setup(config.logging);

    if cli.processes > 0 {
        config.processes = cli.processes;
    }

    let database_url = config.resolved_database_url();
    let db = database::init(&database_url).await;
    let ctx = AppContext::new(db, config);

    let date = cli.date.unwrap_or_else(|| chrono::Utc::now().date_naive());
    info!("starting ingestion run for {date}");

    let options = driver::RunOptions {
        processes: ctx.config.processes,
        download: !cli.no_download,
        parse_chains: cli.parse_chains,
        parse_promos: !cli.no_promos,
        date,
    };

    driver::run(ctx, options).await;
    info!("ingestion run complete");
}
