mod file_config;

pub use file_config::{FeedConfig, FileConfig, UploadConfig, ZoneConfig};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::{Analysis, ClassifierRegistry, ZoneGeometry};
use crate::feed::{
    FeedClient, FeedLayout, FetchCoordinator, HttpFeedClient, SearchParams, DEFAULT_BASE_URL,
    DEFAULT_MAX_WORKERS, DEFAULT_TIMEOUT_SEC,
};
use crate::media::{
    CaptionConfig, CompilationBuilder, MediaPublisher, RetryPolicy, VideoLookup,
};
use crate::pipeline::{Pipeline, PipelineStep};
use crate::season::{SeasonCalendar, SeasonTable};
use crate::session::Session;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub feed_url: Option<String>,
    pub timeout_sec: u64,
    pub max_workers: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub output: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            feed_url: None,
            timeout_sec: DEFAULT_TIMEOUT_SEC,
            max_workers: DEFAULT_MAX_WORKERS,
            start_date: None,
            end_date: None,
            output: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Feed access
    pub feed_url: String,
    pub timeout_sec: u64,
    pub max_workers: usize,
    pub layout: FeedLayout,

    // Core inputs
    pub seasons: SeasonTable,
    pub zone: ZoneGeometry,
    pub search: SearchParams,
    pub analyses: Vec<Analysis>,
    pub steps: Vec<PipelineStep>,

    // Collaborator settings
    pub caption: CaptionConfig,
    pub upload_retry: RetryPolicy,
    pub output: Option<PathBuf>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let feed = file.feed.unwrap_or_default();
        let feed_url = feed
            .base_url
            .or_else(|| cli.feed_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_sec = feed.timeout_sec.unwrap_or(cli.timeout_sec);
        if timeout_sec == 0 {
            bail!("timeout_sec must be greater than zero");
        }
        let max_workers = feed.max_workers.unwrap_or(cli.max_workers);
        if max_workers == 0 {
            bail!("max_workers must be greater than zero");
        }
        let mut layout = FeedLayout::default();
        if let Some(search_path) = feed.search_path {
            layout.search_path = search_path;
        }

        let seasons = match file.seasons {
            Some(windows) => SeasonTable::builtin_with(windows)?,
            None => SeasonTable::builtin(),
        };

        let zone_file = file.zone.unwrap_or_default();
        let default_zone = ZoneGeometry::default();
        let zone = ZoneGeometry {
            half_width: zone_file.half_width.unwrap_or(default_zone.half_width),
            ball_radius: zone_file.ball_radius.unwrap_or(default_zone.ball_radius),
        };
        if zone.half_width <= 0.0 || zone.ball_radius < 0.0 {
            bail!(
                "Invalid zone: half_width must be positive and ball_radius non-negative, got {} and {}",
                zone.half_width,
                zone.ball_radius
            );
        }

        // Dates from the TOML search section win over --start-date/--end-date
        let mut search = file.search.unwrap_or_default();
        search.start_date = search.start_date.or(cli.start_date);
        search.end_date = search.end_date.or(cli.end_date);
        if let (Some(start), Some(end)) = (search.start_date, search.end_date) {
            if start > end {
                bail!("start_date {} is after end_date {}", start, end);
            }
        }

        let analysis_names = file.analysis.unwrap_or_default();
        let analyses = ClassifierRegistry::resolve(analysis_names.as_slice())?;

        let steps = file
            .steps
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, value)| PipelineStep::from_toml(index, value))
            .collect::<Result<Vec<_>, _>>()?;

        let upload_file = file.upload.unwrap_or_default();
        let default_retry = RetryPolicy::default();
        let upload_retry = RetryPolicy {
            max_retries: upload_file.max_retries.unwrap_or(default_retry.max_retries),
            initial_backoff_secs: upload_file
                .initial_backoff_secs
                .unwrap_or(default_retry.initial_backoff_secs),
            max_backoff_secs: upload_file
                .max_backoff_secs
                .unwrap_or(default_retry.max_backoff_secs),
            backoff_multiplier: upload_file
                .backoff_multiplier
                .unwrap_or(default_retry.backoff_multiplier),
        };

        let output = file.output.map(PathBuf::from).or_else(|| cli.output.clone());

        Ok(Self {
            feed_url,
            timeout_sec,
            max_workers,
            layout,
            seasons,
            zone,
            search,
            analyses,
            steps,
            caption: file.caption.unwrap_or_default(),
            upload_retry,
            output,
        })
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.steps.clone())
    }

    /// Build a session against the given feed client.
    pub fn session_with_client(&self, client: Arc<dyn FeedClient>) -> Session {
        Session::new(
            SeasonCalendar::new(self.seasons.clone()),
            FetchCoordinator::new(client, self.layout.clone(), self.max_workers),
            ClassifierRegistry::new(self.zone),
            self.analyses.clone(),
            self.pipeline(),
        )
    }

    /// Media hand-off using the configured captions and upload retries.
    pub fn publisher<'a>(
        &self,
        lookup: &'a dyn VideoLookup,
        builder: &'a dyn CompilationBuilder,
    ) -> MediaPublisher<'a> {
        MediaPublisher::new(lookup, builder, self.caption.clone(), self.upload_retry.clone())
    }

    /// Build a session against the configured HTTP feed.
    pub fn session(&self) -> Result<Session> {
        let client = HttpFeedClient::new(&self.feed_url, Duration::from_secs(self.timeout_sec))
            .with_context(|| format!("Failed to create feed client for {}", self.feed_url))?;
        Ok(self.session_with_client(Arc::new(client)))
    }
}
