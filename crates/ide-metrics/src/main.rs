mod config;
mod report;
mod watch;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use config::{init_logging, WatchConfig, DEFAULT_INTERVAL_SECS};
use ide_core::compute_metrics;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ide-metrics")]
#[command(about = "Agent metrics for the IDE dashboard", long_about = None)]
struct Cli {
    /// Silence logs (also `IDE_METRICS_QUIET=1`)
    #[arg(long, global = true, env = "IDE_METRICS_QUIET")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute one snapshot from a records document
    Snapshot {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Recompute on an interval and stream NDJSON frames to stdout
    Watch {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, env = "IDE_METRICS_INTERVAL_SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
        interval_secs: u64,
        /// Stop after this many refresh ticks
        #[arg(long)]
        count: Option<u64>,
        #[arg(long)]
        session: Option<String>,
    },
    /// Summarize the last snapshot in an NDJSON feed
    Tail {
        #[arg(long)]
        feed: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Commands::Snapshot { input, format } => {
            let records = report::load_records(&input)?;
            let snapshot = compute_metrics(&records.executions, &records.agents);
            match format {
                OutputFormat::Text => println!("{}", report::render_text(&snapshot)),
                OutputFormat::Json => println!("{}", report::render_json(&snapshot)?),
            }
        }
        Commands::Watch {
            input,
            interval_secs,
            count,
            session,
        } => {
            let config = WatchConfig::new(input, interval_secs, count, session);
            let mut stdout = io::stdout().lock();
            watch::run(&config, &mut stdout).await?;
        }
        Commands::Tail { feed } => {
            println!("{}", watch::tail(&feed)?);
        }
    }

    Ok(())
}
