mod db;
mod error;
mod extract;
mod load;
mod logging;
mod pipeline;
mod query;
mod report;
mod settings;
mod transform;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;

use pipeline::Pipeline;
use settings::Settings;

#[derive(Parser)]
#[command(name = "bank_etl", about = "Largest banks by market cap: extract, convert, load, query, chart")]
struct Cli {
    /// Settings file (TOML); defaults to ./bank_etl.toml if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the page and run every stage, then print the run log
    Run,
    /// Re-run the queries and charts against the stored table
    Query,
    /// Print the run log
    Logs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let t0 = Instant::now();
    let summary = match cli.command {
        Commands::Logs => return logging::echo_log(&settings.log_path),
        Commands::Run => start(&settings)?.run().await?,
        Commands::Query => start(&settings)?.report_existing()?,
    };

    println!(
        "{} banks stored in {} (table {}), charts in {}",
        summary.records,
        settings.db_path.display(),
        settings.table_name,
        settings.chart_dir.display()
    );
    for chart in [&summary.charts.top, &summary.charts.average, &summary.charts.threshold] {
        println!("  {}", chart.display());
    }

    if matches!(cli.command, Commands::Run) {
        println!("\n--- Run log ---");
        logging::echo_log(&settings.log_path)?;
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn start(settings: &Settings) -> anyhow::Result<Pipeline> {
    logging::init(&settings.log_path)?;
    info!("Logging setup complete");
    Ok(Pipeline::new(settings.clone()))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
