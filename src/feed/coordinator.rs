//! Concurrent per-key fetch and merge into one uniquely keyed record set.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::client::FeedClient;
use super::decode::decode;
use super::search::{RequestKey, SearchPlan};
use crate::error::AcquisitionError;
use crate::record::{RecordSet, SortParams, Value};

pub const DEFAULT_SEARCH_PATH: &str = "/statcast_search/csv?all=true&type=details";
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Shape of the merged dataset: how rows are keyed, ordered and patched.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedLayout {
    pub search_path: String,
    /// Name of the composite identifier column.
    pub id_column: String,
    pub id_delimiter: String,
    pub id_keys: Vec<String>,
    pub sort_keys: Vec<String>,
    /// Columns whose missing values become `0.0` after the merge.
    pub fill_columns: Vec<String>,
}

impl Default for FeedLayout {
    fn default() -> Self {
        let strings = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            id_column: "pitch_id".to_string(),
            id_delimiter: "|".to_string(),
            id_keys: strings(&["game_pk", "at_bat_number", "pitch_number"]),
            sort_keys: strings(&["game_date", "game_pk", "at_bat_number", "pitch_number"]),
            fill_columns: strings(&["plate_x", "plate_z", "sz_bot", "sz_top"]),
        }
    }
}

impl FeedLayout {
    /// Concatenate per-key parts, sort globally, derive the composite
    /// identifier, drop repeated identifiers and fill the sentinel columns.
    pub fn merge(&self, parts: Vec<RecordSet>) -> Result<RecordSet, AcquisitionError> {
        let merged = RecordSet::concat(parts);
        if merged.is_empty() {
            return Ok(merged);
        }

        let missing_key = self
            .id_keys
            .iter()
            .chain(&self.sort_keys)
            .find(|k| !merged.has_column(k));
        if let Some(missing) = missing_key {
            return Err(AcquisitionError::Decode {
                key: "merge".to_string(),
                message: format!("feed rows lack the {} column", missing),
            });
        }

        let sort = SortParams::new(self.sort_keys.clone(), vec![true; self.sort_keys.len()]);
        let sorted = merged.sort(&sort).map_err(|e| AcquisitionError::Decode {
            key: "merge".to_string(),
            message: e.to_string(),
        })?;

        let ids: Vec<String> = sorted
            .records()
            .map(|record| {
                self.id_keys
                    .iter()
                    .map(|k| record.get(k).map(Value::to_string).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(&self.id_delimiter)
            })
            .collect();

        let mut seen = HashSet::with_capacity(ids.len());
        let keep: Vec<usize> = ids
            .iter()
            .enumerate()
            .filter(|(_, id)| seen.insert(id.as_str()))
            .map(|(i, _)| i)
            .collect();
        let dropped = ids.len() - keep.len();
        if dropped > 0 {
            warn!("Dropped {} rows with a repeated {}", dropped, self.id_column);
        }

        let id_values = keep.iter().map(|&i| Value::Str(ids[i].clone())).collect();
        let unique = sorted.select_rows(&keep);

        let mut columns = vec![(self.id_column.clone(), id_values)];
        for fill in self.fill_columns.iter().filter(|c| unique.has_column(c)) {
            let values = unique
                .column(fill)
                .unwrap_or_default()
                .into_iter()
                .map(|v| if v.is_null() { Value::Float(0.0) } else { v.clone() })
                .collect();
            columns.push((fill.clone(), values));
        }

        let out = unique.with_columns(columns).map_err(|e| AcquisitionError::Decode {
            key: "merge".to_string(),
            message: e.to_string(),
        })?;
        Ok(out.with_column_first(&self.id_column))
    }
}

/// Fetches every request key of a [`SearchPlan`] on a bounded worker pool.
pub struct FetchCoordinator {
    client: Arc<dyn FeedClient>,
    layout: FeedLayout,
    max_workers: usize,
}

impl FetchCoordinator {
    pub fn new(client: Arc<dyn FeedClient>, layout: FeedLayout, max_workers: usize) -> Self {
        Self {
            client,
            layout,
            max_workers: max_workers.max(1),
        }
    }

    pub fn layout(&self) -> &FeedLayout {
        &self.layout
    }

    /// Fetch all keys, then merge.
    ///
    /// Every request runs to completion even when one fails; the error
    /// returned is the one for the earliest failing key in plan order.
    pub fn fetch(&self, plan: &SearchPlan) -> Result<RecordSet, AcquisitionError> {
        let keys = plan.keys();
        if keys.is_empty() {
            warn!("No request keys to fetch, returning an empty record set");
            return Ok(RecordSet::default());
        }

        let workers = self.max_workers.min(keys.len());
        info!("Fetching {} request keys on {} workers", keys.len(), workers);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("feed-worker-{}", i))
            .build()
            .map_err(|e| AcquisitionError::WorkerPool(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<(usize, RequestKey, Result<RecordSet, AcquisitionError>)>();
        let client = &self.client;
        pool.scope(|scope| {
            for (position, &key) in keys.iter().enumerate() {
                let tx = tx.clone();
                let path = plan.path(&self.layout.search_path, key);
                scope.spawn(move |_| {
                    let result = client
                        .get(&path)
                        .and_then(|body| decode(&key.to_string(), &body));
                    // The receiver outlives the scope.
                    let _ = tx.send((position, key, result));
                });
            }
        });
        drop(tx);

        let mut parts = Vec::with_capacity(keys.len());
        let mut first_error: Option<(usize, AcquisitionError)> = None;
        for (position, key, result) in rx {
            match result {
                Ok(part) => {
                    debug!("Fetched {} rows for {}", part.len(), key);
                    parts.push(part);
                }
                Err(e) => {
                    warn!("Fetch failed for {}: {}", key, e);
                    if first_error.as_ref().map_or(true, |(p, _)| position < *p) {
                        first_error = Some((position, e));
                    }
                }
            }
        }

        if let Some((_, e)) = first_error {
            return Err(e);
        }

        let merged = self.layout.merge(parts)?;
        info!("Fetched {} pitches", merged.len());
        Ok(merged)
    }
}
