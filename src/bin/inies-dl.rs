//! inies-dl - fetch the INIES catalogue and export it as CSV

use chrono::NaiveDate;
use clap::Parser;
use inies_dl::logging::{LogConfig, init_logging, log_progress};
use inies_dl::{
    ClientConfig, Credentials, CsvExporter, Error, IniesClient, RecordExporter, RecordId,
};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};

/// Fetch every environmental product declaration and export it as CSV
#[derive(Debug, Parser)]
#[command(name = "inies-dl", version, about)]
struct Cli {
    /// Only fetch records updated since this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    since: Option<NaiveDate>,

    /// Fetch a single record by id and print it as JSON
    #[arg(long, conflicts_with = "since")]
    record: Option<i64>,

    /// Directory receiving the CSV export
    #[arg(long, short, default_value = "data")]
    output: PathBuf,

    /// JSON client configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Also write logs to a dated file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::InvalidDate(value.to_string()).to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut log_config = LogConfig::default();
    if let Some(dir) = &cli.log_dir {
        log_config = log_config.with_log_dir(dir);
    }
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        error!(error = %e, "run failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> inies_dl::Result<()> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    let credentials = Credentials::from_env()?;
    let client = IniesClient::connect(config, &credentials).await?;

    if let Some(id) = cli.record {
        let record = client.fetch_record(RecordId(id)).await?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let progress = tokio::spawn(log_progress(client.subscribe()));

    let batch = client.fetch_all_report(cli.since);
    tokio::pin!(batch);
    let mut interrupted = false;
    let report = tokio::select! {
        report = &mut batch => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("received Ctrl+C, finishing in-flight requests");
            interrupted = true;
            client.shutdown();
            batch.await
        }
    };
    progress.abort();
    let report = report?;

    let path = CsvExporter::new().export(&report.records, &cli.output)?;
    info!(
        records = report.records.len(),
        failures = report.failures.len(),
        path = %path.display(),
        "export complete"
    );
    for failure in &report.failures {
        error!(record_id = %failure.id, error = %failure.error, "record missing from export");
    }

    if interrupted {
        warn!(path = %path.display(), "export is partial");
        return Err(Error::ShuttingDown);
    }
    Ok(())
}

