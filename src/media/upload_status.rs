//! Bounded polling of an asynchronous upload's processing state.
//!
//! Platforms report processing as pending until media is ready. The poller
//! re-probes with capped exponential backoff and gives up after a fixed
//! number of retries instead of waiting forever.

use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Pending,
    Succeeded,
    Failed,
}

impl FromStr for UploadState {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "in_progress" => Ok(UploadState::Pending),
            "succeeded" => Ok(UploadState::Succeeded),
            "failed" => Ok(UploadState::Failed),
            other => Err(UploadError::UnknownState(other.to_string())),
        }
    }
}

/// One observation of the remote processing state.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub state: UploadState,
    /// Delay suggested by the platform before the next probe.
    pub check_after_secs: Option<u64>,
    pub message: Option<String>,
}

impl StatusReport {
    pub fn new(state: UploadState) -> Self {
        Self {
            state,
            check_after_secs: None,
            message: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Upload processing failed: {0}")]
    Failed(String),

    #[error("Upload still pending after {attempts} status checks")]
    TimedOut { attempts: i32 },

    #[error("Unknown upload state '{0}'")]
    UnknownState(String),

    #[error("Status probe failed: {0}")]
    Probe(String),
}

/// Source of status reports, usually a platform's status endpoint.
pub trait StatusProbe {
    fn probe(&self) -> Result<StatusReport, UploadError>;
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of re-probes before giving up.
    pub max_retries: i32,
    pub initial_backoff_secs: u64,
    /// Cap for exponential growth and for platform-suggested delays.
    pub max_backoff_secs: u64,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// `initial_backoff * multiplier^retry_count`, capped at `max_backoff_secs`.
    pub fn backoff_secs(&self, retry_count: i32) -> u64 {
        let backoff = self.initial_backoff_secs as f64 * self.backoff_multiplier.powi(retry_count);
        (backoff.min(self.max_backoff_secs as f64)) as u64
    }

    pub fn should_retry(&self, retry_count: i32) -> bool {
        retry_count < self.max_retries
    }

    /// The platform's hint wins over the computed backoff, both capped.
    fn delay_secs(&self, retry_count: i32, hint: Option<u64>) -> u64 {
        hint.map(|h| h.min(self.max_backoff_secs))
            .unwrap_or_else(|| self.backoff_secs(retry_count))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_backoff_secs: 1,
            max_backoff_secs: 60,
            backoff_multiplier: 2.0,
        }
    }
}

pub struct StatusPoller<'a, P: StatusProbe, S: Sleeper = ThreadSleeper> {
    probe: &'a P,
    policy: RetryPolicy,
    sleeper: S,
}

impl<'a, P: StatusProbe> StatusPoller<'a, P, ThreadSleeper> {
    pub fn new(probe: &'a P, policy: RetryPolicy) -> Self {
        Self::with_sleeper(probe, policy, ThreadSleeper)
    }
}

impl<'a, P: StatusProbe, S: Sleeper> StatusPoller<'a, P, S> {
    pub fn with_sleeper(probe: &'a P, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            probe,
            policy,
            sleeper,
        }
    }

    /// Drive the state machine from `initial` until a terminal state.
    ///
    /// Returns the number of re-probes it took to succeed.
    pub fn wait(&self, initial: StatusReport) -> Result<i32, UploadError> {
        let mut report = initial;
        let mut retry_count = 0;
        loop {
            match report.state {
                UploadState::Succeeded => {
                    info!("Upload processing succeeded after {} checks", retry_count);
                    return Ok(retry_count);
                }
                UploadState::Failed => {
                    let reason = report
                        .message
                        .unwrap_or_else(|| "no reason given".to_string());
                    warn!("Upload processing failed: {}", reason);
                    return Err(UploadError::Failed(reason));
                }
                UploadState::Pending => {
                    if !self.policy.should_retry(retry_count) {
                        return Err(UploadError::TimedOut {
                            attempts: retry_count,
                        });
                    }
                    let delay = self.policy.delay_secs(retry_count, report.check_after_secs);
                    debug!("Upload pending, checking again in {}s", delay);
                    self.sleeper.sleep(Duration::from_secs(delay));
                    report = self.probe.probe()?;
                    retry_count += 1;
                }
            }
        }
    }
}
