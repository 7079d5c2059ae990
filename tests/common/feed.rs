use std::sync::Mutex;

use pitch_pipeline::feed::FeedClient;
use pitch_pipeline::AcquisitionError;

use super::constants::*;
use super::fixtures::{day_1_body, day_2_body};

/// In-memory feed answering requests whose path contains a registered needle.
pub struct FakeFeedClient {
    bodies: Vec<(String, String)>,
    requested: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeFeedClient {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Both fixture games, reachable by date and by game id.
    pub fn with_fixture_games() -> Self {
        Self::new()
            .serve(&format!("game_date_gt={}", GAME_1_DATE), &day_1_body())
            .serve(&format!("game_date_gt={}", GAME_2_DATE), &day_2_body())
            .serve(&format!("game_pk={}", GAME_1_PK), &day_1_body())
            .serve(&format!("game_pk={}", GAME_2_PK), &day_2_body())
    }

    pub fn serve(mut self, needle: &str, body: &str) -> Self {
        self.bodies.push((needle.to_string(), body.to_string()));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl FeedClient for FakeFeedClient {
    fn get(&self, path: &str) -> Result<String, AcquisitionError> {
        self.requested.lock().unwrap().push(path.to_string());
        // Dates outside the fixtures have no games.
        Ok(self
            .bodies
            .iter()
            .find(|(needle, _)| path.contains(needle.as_str()))
            .map(|(_, body)| body.clone())
            .unwrap_or_default())
    }
}
