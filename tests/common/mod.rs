//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeFeedClient, GAME_1_PK};
//!
//! let feed = FakeFeedClient::with_fixture_games();
//! ```

mod constants;
mod feed;
mod fixtures;
mod server;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use feed::FakeFeedClient;
#[allow(unused_imports)]
pub use fixtures::{day_1_body, day_2_body, day_2_body_with_repeat, write_config};
#[allow(unused_imports)]
pub use server::TestFeedServer;
