use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pitch_pipeline::config::{AppConfig, CliConfig, FileConfig};
use pitch_pipeline::feed::{DEFAULT_MAX_WORKERS, DEFAULT_TIMEOUT_SEC};

#[derive(Parser, Debug)]
#[clap(version = env!("APP_VERSION"))]
struct CliArgs {
    /// Path to the TOML file describing the search, analyses and steps.
    pub config: PathBuf,

    /// Base URL of the export feed.
    #[clap(long)]
    pub feed_url: Option<String>,

    /// Timeout for a single feed request, in seconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SEC)]
    pub timeout_sec: u64,

    /// Maximum number of concurrent feed requests.
    #[clap(long, default_value_t = DEFAULT_MAX_WORKERS)]
    pub max_workers: usize,

    /// First date to search (YYYY-MM-DD), if the config has none.
    #[clap(long)]
    pub start_date: Option<NaiveDate>,

    /// Last date to search (YYYY-MM-DD), if the config has none.
    #[clap(long)]
    pub end_date: Option<NaiveDate>,

    /// Write the selected pitches as CSV here instead of stdout.
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            feed_url: args.feed_url.clone(),
            timeout_sec: args.timeout_sec,
            max_workers: args.max_workers,
            start_date: args.start_date,
            end_date: args.end_date,
            output: args.output.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    info!(
        "pitch-pipeline {}-{}",
        env!("APP_VERSION"),
        env!("GIT_HASH")
    );

    info!("Loading configuration from {:?}", cli_args.config);
    let file_config = FileConfig::load(&cli_args.config)?;
    let cli_config: CliConfig = (&cli_args).into();
    let app_config = AppConfig::resolve(&cli_config, Some(file_config))?;

    info!("Configuration loaded:");
    info!("  feed_url: {}", app_config.feed_url);
    info!("  max_workers: {}", app_config.max_workers);
    info!("  analyses: {}", app_config.analyses.len());
    info!("  steps: {}", app_config.steps.len());

    let session = app_config.session()?;
    let selected = session.run(app_config.search.clone())?;

    match &app_config.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            selected.write_csv(BufWriter::new(file))?;
            info!("Wrote {} pitches to {:?}", selected.len(), path);
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            selected.write_csv(&mut handle)?;
            handle.flush()?;
        }
    }

    Ok(())
}
