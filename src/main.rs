use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use rail_risk::cache::DatasetCache;
use rail_risk::config::AppConfig;
use rail_risk::criteria::{date_range_from_args, parse_severities};
use rail_risk::data::filter::{FilterCriteria, TrainSelection, ALL_TRAINS};
use rail_risk::report;
use rail_risk::state::DashboardState;

#[derive(Parser)]
#[command(name = "rail-risk")]
#[command(about = "Train delay and accident risk summaries", long_about = None)]
struct Cli {
    /// TOML config with data paths, column names and report settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Delay dataset (.csv, .json or .parquet)
    #[arg(long, global = true)]
    delays: Option<PathBuf>,

    /// Accident dataset (.csv, .json or .parquet)
    #[arg(long, global = true)]
    accidents: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs, top-N tables and accident listings for a filter
    Report {
        /// Train name, or "All"
        #[arg(short, long, default_value = ALL_TRAINS)]
        train: String,

        /// First day of the date range (YYYY-MM-DD). Give both --from and --to;
        /// a single bound matches nothing, neither spans the data
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day of the date range (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Ignore dates entirely (keeps records without a scheduled time)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        all_dates: bool,

        /// Severity levels to include (High, Medium, Low), or "none" alone
        #[arg(short, long, value_delimiter = ',')]
        severity: Vec<String>,

        /// Rows per top-N table
        #[arg(long)]
        top: Option<usize>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Append the filtered delay rows
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    /// List train choices and the available date range
    Trains,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(p) = cli.delays {
        config.data.delays = p;
    }
    if let Some(p) = cli.accidents {
        config.data.accidents = p;
    }
    info!(
        "Using delays from {} and accidents from {}",
        config.data.delays.display(),
        config.data.accidents.display()
    );

    let cache = DatasetCache::new(config.data.clone());
    let mut state = DashboardState::from_cache(&cache);

    match cli.command {
        Commands::Report {
            train,
            from,
            to,
            all_dates,
            severity,
            top,
            format,
            raw,
        } => {
            let bounds = state.datasets.as_ref().and_then(|ds| ds.date_bounds());
            let date_range = date_range_from_args(from, to, all_dates, bounds);

            state.apply(FilterCriteria {
                train: TrainSelection::from_choice(&train),
                date_range,
                severities: parse_severities(severity.as_slice())?,
            });

            let view = state.view(top.unwrap_or(config.report.top_n));
            match format {
                Format::Text => print!("{}", report::render_text(&view, raw)),
                Format::Json => println!(
                    "{}",
                    report::render_json(&view).context("serializing report")?
                ),
            }
        }
        Commands::Trains => {
            if let Some(msg) = &state.status_message {
                println!("{msg}");
            }
            for choice in state.train_choices() {
                println!("{choice}");
            }
            if let Some((lo, hi)) = state.datasets.as_ref().and_then(|ds| ds.date_bounds()) {
                println!("\nDate range: {} to {}", lo.date(), hi.date());
            }
        }
    }

    Ok(())
}
