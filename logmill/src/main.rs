mod render;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use logmill_core::config::LogmillConfig;
use logmill_core::enrichment::UaClassifier;
use logmill_core::ingest::Ingestor;
use logmill_core::logging::init_logging;
use logmill_core::parse::LineParser;
use logmill_core::report::Report;
use logmill_core::store::SqliteStore;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "logmill", version, about = "Web server access log analyzer")]
struct Cli {
    /// Path to the logmill config file
    #[arg(long, default_value = "logmill.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a log file and load it into the database
    Ingest {
        /// Path to the access log file
        file: PathBuf,

        /// Insert batch size (overrides the config file)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Run an aggregate report over ingested events
    Report {
        #[command(subcommand)]
        report: ReportCmd,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCmd {
    /// Top IPs by request count
    TopNIps { n: u32 },

    /// Top requested URLs
    TopNUrls { n: u32 },

    /// Status code breakdown with percentages
    StatusCodeDistribution,

    /// Traffic volume per hour of day
    HourlyTraffic,

    /// Traffic breakdown by operating system
    OsDistribution,

    /// Latest log entries for one HTTP status code (max 100)
    ErrorLogs { status_code: u16 },

    /// All error (>= 400) entries on a calendar date (YYYY-MM-DD)
    ErrorLogsByDate { date: NaiveDate },
}

impl From<ReportCmd> for Report {
    fn from(cmd: ReportCmd) -> Self {
        match cmd {
            ReportCmd::TopNIps { n } => Report::TopIps { n },
            ReportCmd::TopNUrls { n } => Report::TopUrls { n },
            ReportCmd::StatusCodeDistribution => Report::StatusCodes,
            ReportCmd::HourlyTraffic => Report::HourlyTraffic,
            ReportCmd::OsDistribution => Report::OsDistribution,
            ReportCmd::ErrorLogs { status_code } => Report::ErrorLogs { status_code },
            ReportCmd::ErrorLogsByDate { date } => Report::ErrorLogsByDate { date },
        }
    }
}

fn main() {
    init_logging();

    if let Err(err) = run() {
        tracing::error!(error = format!("{err:#}"), "fatal");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = LogmillConfig::load(&cli.config)?;

    // Store open failure is fatal before any processing begins.
    let mut store = SqliteStore::open(&config.database.path)?;
    store.ensure_schema()?;

    match cli.command {
        Command::Ingest { file, batch_size } => {
            let parser = LineParser::new(config.log.pattern.as_deref())?;
            let batch_size = batch_size.unwrap_or(config.ingest.batch_size);
            let mut ingestor = Ingestor::new(parser, UaClassifier::new(), batch_size);

            let summary = ingestor.ingest_file(&file, &mut store)?;
            println!(
                "Processed {}: {} accepted, {} rejected",
                file.display(),
                summary.accepted,
                summary.rejected
            );
        }

        Command::Report { report } => {
            let table = Report::from(report).run(&store)?;
            render::print_table(&table);
        }
    }

    Ok(())
}
