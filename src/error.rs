//! Error taxonomy for the acquisition and analytics core.
//!
//! Every error here is fatal to the operation that raised it. The core never
//! retries or downgrades them to log lines; callers decide what to do.

use thiserror::Error;

/// Problems with static configuration: the season table, classifier names,
/// step definitions or search parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("No season window configured for year {0}")]
    MissingSeason(i32),

    #[error("Invalid season window for {year}: {reason}")]
    InvalidSeason { year: i32, reason: String },

    #[error("Unknown analysis: {0}")]
    UnknownAnalysis(String),

    #[error("Invalid pipeline step: {0}")]
    InvalidStep(String),

    #[error("Search requires either game_pks or start_date")]
    MissingIterationSource,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures while pulling data from the export feed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AcquisitionError {
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("Feed returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Feed reported an error for {key}: {message}")]
    Feed { key: String, message: String },

    #[error("Malformed feed payload for {key}: {message}")]
    Decode { key: String, message: String },

    #[error("Worker pool could not be started: {0}")]
    WorkerPool(String),
}

/// Malformed operations against a record set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Mismatch in parameter count: {fields} fields but {ascending} sort directions")]
    ParameterCountMismatch { fields: usize, ascending: usize },

    #[error("At least one field is required")]
    EmptyFields,

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid expression `{expression}`: {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Expression `{0}` did not evaluate to a boolean")]
    NonBooleanPredicate(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Row has {actual} values but the record set has {expected} columns")]
    RowWidth { expected: usize, actual: usize },

    #[error("Compilation holds {count} clips, the limit is {limit}")]
    ClipLimitExceeded { count: usize, limit: usize },

    #[error("Step {index} ({kind}) failed: {source}")]
    Step {
        index: usize,
        kind: &'static str,
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach the position and kind of the pipeline step that failed.
    pub fn at_step(self, index: usize, kind: &'static str) -> Self {
        ValidationError::Step {
            index,
            kind,
            source: Box::new(self),
        }
    }

    /// The innermost error, unwrapping any step context.
    pub fn root(&self) -> &ValidationError {
        match self {
            ValidationError::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Umbrella error for operations spanning several stages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_context_unwraps_to_root() {
        let err = ValidationError::UnknownField("spin_rate".to_string()).at_step(2, "rank");
        assert_eq!(
            err.root(),
            &ValidationError::UnknownField("spin_rate".to_string())
        );
        assert!(err.to_string().contains("Step 2 (rank)"));
        assert!(err.to_string().contains("spin_rate"));
    }

    #[test]
    fn test_pipeline_error_is_transparent() {
        let err: PipelineError = ConfigurationError::MissingSeason(2007).into();
        assert_eq!(err.to_string(), "No season window configured for year 2007");
    }
}
