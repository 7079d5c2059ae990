//! Seams for the media collaborators that consume selected pitches.
//!
//! Clip search, rendering and upload live outside this crate. This module
//! defines what they are handed: records in pipeline order, a caption per
//! clip, and a bounded way to wait on an upload.

mod caption;
mod upload_status;

pub use caption::{CaptionConfig, MetricCaption, MetricFormat, PlayerRole};
pub use upload_status::{
    RetryPolicy, Sleeper, StatusPoller, StatusProbe, StatusReport, ThreadSleeper, UploadError,
    UploadState,
};

use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::ValidationError;
use crate::record::{Record, RecordSet};

/// Maximum number of clips in one compilation.
pub const CLIP_LIMIT: usize = 100;

/// Local media found for one pitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub pitch_id: String,
    pub path: PathBuf,
}

pub trait VideoLookup {
    /// Find media for one pitch. `Ok(None)` means the pitch has no clip.
    fn lookup(&self, record: &Record<'_>) -> anyhow::Result<Option<MediaRef>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    pub media: MediaRef,
    pub caption: String,
}

/// An ordered, size-checked list of captioned clips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    title: String,
    clips: Vec<Clip>,
}

impl Compilation {
    pub fn new(title: impl Into<String>, clips: Vec<Clip>) -> Result<Self, ValidationError> {
        if clips.len() > CLIP_LIMIT {
            return Err(ValidationError::ClipLimitExceeded {
                count: clips.len(),
                limit: CLIP_LIMIT,
            });
        }
        Ok(Self {
            title: title.into(),
            clips,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }
}

pub trait CompilationBuilder {
    /// Render the compilation and return the path of the output file.
    fn build(&self, compilation: &Compilation) -> anyhow::Result<PathBuf>;
}

/// Look up media for every record, keeping pipeline order.
///
/// Lookup failures belong to the collaborator: they are logged and the
/// record is skipped.
pub fn collect_clips(
    lookup: &dyn VideoLookup,
    rs: &RecordSet,
    caption: &CaptionConfig,
) -> Vec<Clip> {
    let mut clips = Vec::new();
    for (row, record) in rs.records().enumerate() {
        match lookup.lookup(&record) {
            Ok(Some(media)) => clips.push(Clip {
                caption: caption.render(&record),
                media,
            }),
            Ok(None) => debug!("No media for row {}", row),
            Err(e) => warn!("Media lookup failed for row {}: {:#}", row, e),
        }
    }
    info!("Found media for {} of {} pitches", clips.len(), rs.len());
    clips
}

/// Hands selected pitches to the media collaborators with the configured
/// captions and upload retry policy.
pub struct MediaPublisher<'a> {
    lookup: &'a dyn VideoLookup,
    builder: &'a dyn CompilationBuilder,
    caption: CaptionConfig,
    retry: RetryPolicy,
}

impl<'a> MediaPublisher<'a> {
    pub fn new(
        lookup: &'a dyn VideoLookup,
        builder: &'a dyn CompilationBuilder,
        caption: CaptionConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            lookup,
            builder,
            caption,
            retry,
        }
    }

    /// Caption and compile the clips found for `rs`, in record order.
    pub fn compile(&self, title: &str, rs: &RecordSet) -> anyhow::Result<PathBuf> {
        let clips = collect_clips(self.lookup, rs, &self.caption);
        let compilation = Compilation::new(title, clips)?;
        let path = self.builder.build(&compilation)?;
        info!(
            "Built compilation '{}' with {} clips at {}",
            compilation.title(),
            compilation.clips().len(),
            path.display()
        );
        Ok(path)
    }

    /// Wait for the uploaded compilation to finish processing.
    pub fn wait_for_upload<P: StatusProbe>(
        &self,
        probe: &P,
        initial: StatusReport,
    ) -> Result<i32, UploadError> {
        StatusPoller::new(probe, self.retry.clone()).wait(initial)
    }
}
