//! Pitch event acquisition and analytics.
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod analysis;
pub mod config;
pub mod error;
pub mod feed;
pub mod media;
pub mod pipeline;
pub mod record;
pub mod season;
pub mod session;

mod serde_util;

// Re-export commonly used types for convenience
pub use error::{AcquisitionError, ConfigurationError, PipelineError, ValidationError};
pub use record::{Record, RecordSet, Value};
pub use session::Session;
