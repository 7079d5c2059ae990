//! Acquisition from the bulk export feed.
//!
//! A [`SearchPlan`] turns search parameters into request keys, the
//! [`FetchCoordinator`] fetches and decodes one body per key through a
//! [`FeedClient`], and [`FeedLayout::merge`] folds the parts into a single
//! sorted record set keyed by a composite pitch identifier.

mod client;
mod coordinator;
pub mod decode;
mod search;

pub use client::{FeedClient, HttpFeedClient};
pub use coordinator::{FeedLayout, FetchCoordinator, DEFAULT_MAX_WORKERS, DEFAULT_SEARCH_PATH};
pub use search::{IterationType, RequestKey, SearchParams, SearchPlan};

pub const DEFAULT_BASE_URL: &str = "https://baseballsavant.mlb.com";
pub const DEFAULT_TIMEOUT_SEC: u64 = 120;
