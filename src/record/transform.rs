//! Filter, sort and rank over a [`RecordSet`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::expr::Predicate;
use super::{RecordSet, Value};
use crate::error::ValidationError;
use crate::serde_util::{one_or_many, OneOrMany};

/// Multi-key sort specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortParams {
    #[serde(deserialize_with = "one_or_many")]
    pub fields: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub ascending: Vec<bool>,
}

impl SortParams {
    pub fn new<S: Into<String>>(fields: Vec<S>, ascending: Vec<bool>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ascending,
        }
    }

    pub fn validate(&self, columns: &[String]) -> Result<(), ValidationError> {
        if self.fields.len() != self.ascending.len() {
            return Err(ValidationError::ParameterCountMismatch {
                fields: self.fields.len(),
                ascending: self.ascending.len(),
            });
        }
        if self.fields.is_empty() {
            return Err(ValidationError::EmptyFields);
        }
        require_columns(&self.fields, columns)
    }
}

/// Ordinal ranking specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankParams {
    /// Column receiving the 1-based rank.
    pub name: String,
    #[serde(default, deserialize_with = "optional_one_or_many")]
    pub group_by: Option<Vec<String>>,
    #[serde(deserialize_with = "one_or_many")]
    pub fields: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub ascending: Vec<bool>,
    /// Return rows in the order the rank step received them, not in the
    /// order of the identifier column. The two agree unless an earlier
    /// `sort` step reordered the rows.
    #[serde(default, alias = "keep_sort")]
    pub keep_original_order: bool,
}

impl RankParams {
    pub fn new<S: Into<String>>(name: &str, fields: Vec<S>, ascending: Vec<bool>) -> Self {
        Self {
            name: name.to_string(),
            group_by: None,
            fields: fields.into_iter().map(Into::into).collect(),
            ascending,
            keep_original_order: false,
        }
    }

    pub fn grouped_by<S: Into<String>>(mut self, group_by: Vec<S>) -> Self {
        self.group_by = Some(group_by.into_iter().map(Into::into).collect());
        self
    }

    pub fn keep_original_order(mut self, keep: bool) -> Self {
        self.keep_original_order = keep;
        self
    }

    fn sort_params(&self) -> SortParams {
        SortParams {
            fields: self.fields.clone(),
            ascending: self.ascending.clone(),
        }
    }

    pub fn validate(&self, columns: &[String]) -> Result<(), ValidationError> {
        self.sort_params().validate(columns)?;
        if let Some(group_by) = &self.group_by {
            require_columns(group_by, columns)?;
        }
        Ok(())
    }
}

fn optional_one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<OneOrMany<String>> = Option::deserialize(deserializer)?;
    Ok(value.map(OneOrMany::into_vec).filter(|v| !v.is_empty()))
}

fn require_columns(fields: &[String], columns: &[String]) -> Result<(), ValidationError> {
    match fields.iter().find(|f| !columns.contains(f)) {
        Some(missing) => Err(ValidationError::UnknownField(missing.clone())),
        None => Ok(()),
    }
}

impl RecordSet {
    /// Rows matching the predicate expression, order preserved.
    pub fn filter(&self, expression: &str) -> Result<RecordSet, ValidationError> {
        let predicate = Predicate::parse(expression)?;
        self.filter_predicate(&predicate)
    }

    pub fn filter_predicate(&self, predicate: &Predicate) -> Result<RecordSet, ValidationError> {
        predicate.validate(self.columns())?;
        let mut keep = Vec::new();
        for (i, record) in self.records().enumerate() {
            if predicate.matches(&record)? {
                keep.push(i);
            }
        }
        Ok(self.select_rows(&keep))
    }

    /// Stable multi-key sort; nulls sort last in either direction.
    pub fn sort(&self, params: &SortParams) -> Result<RecordSet, ValidationError> {
        params.validate(self.columns())?;
        Ok(self.select_rows(&self.sorted_order(params)))
    }

    /// Sort by `fields`, then number rows 1, 2, 3... within each `group_by`
    /// group. Ties keep their relative order, so no two rows in a group share
    /// a rank.
    pub fn rank(&self, params: &RankParams) -> Result<RecordSet, ValidationError> {
        params.validate(self.columns())?;

        let order = self.sorted_order(&params.sort_params());
        let group_idx: Vec<usize> = params
            .group_by
            .iter()
            .flatten()
            .filter_map(|g| self.column_index(g))
            .collect();

        let mut ranks = vec![Value::Null; self.len()];
        let mut counters: HashMap<Vec<String>, i64> = HashMap::new();
        for &row_idx in &order {
            let row = &self.rows()[row_idx];
            let key: Vec<String> = group_idx.iter().map(|&g| row[g].to_string()).collect();
            let counter = counters.entry(key).or_insert(0);
            *counter += 1;
            ranks[row_idx] = Value::Int(*counter);
        }

        let ranked = self.with_column(&params.name, ranks)?;
        if params.keep_original_order {
            Ok(ranked)
        } else {
            Ok(ranked.select_rows(&order))
        }
    }

    fn sorted_order(&self, params: &SortParams) -> Vec<usize> {
        let key_idx: Vec<(usize, bool)> = params
            .fields
            .iter()
            .zip(&params.ascending)
            .filter_map(|(f, &asc)| self.column_index(f).map(|i| (i, asc)))
            .collect();
        let rows = self.rows();
        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by(|&a, &b| {
            key_idx
                .iter()
                .map(|&(col, asc)| rows[a][col].sort_cmp(&rows[b][col], asc))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        order
    }
}
