use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::record::{RankParams, SortParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryParams {
    #[serde(alias = "expression")]
    pub query: String,
}

/// One declarative transformation, `{type, params}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "lowercase")]
pub enum PipelineStep {
    Query(QueryParams),
    Rank(RankParams),
    Sort(SortParams),
}

impl PipelineStep {
    pub fn query(expression: &str) -> Self {
        PipelineStep::Query(QueryParams {
            query: expression.to_string(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineStep::Query(_) => "query",
            PipelineStep::Rank(_) => "rank",
            PipelineStep::Sort(_) => "sort",
        }
    }

    pub fn from_toml(index: usize, value: toml::Value) -> Result<Self, ConfigurationError> {
        value
            .try_into()
            .map_err(|e: toml::de::Error| invalid(index, e.to_string()))
    }

    /// Parse a JSON array of steps.
    pub fn list_from_json(text: &str) -> Result<Vec<Self>, ConfigurationError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(text)
            .map_err(|e| ConfigurationError::InvalidStep(e.to_string()))?;
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| serde_json::from_value(v).map_err(|e| invalid(i, e.to_string())))
            .collect()
    }
}

fn invalid(index: usize, reason: String) -> ConfigurationError {
    ConfigurationError::InvalidStep(format!("step {}: {}", index, reason.trim()))
}
