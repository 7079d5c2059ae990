//! Search parameters and the per-key request plan.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use tracing::{info, warn};

use crate::error::ConfigurationError;
use crate::season::{yesterday, SeasonCalendar};
use crate::serde_util::one_or_many;

/// Filters for one search against the export feed.
///
/// List fields also accept a single scalar in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchParams {
    pub start_date: Option<NaiveDate>,
    /// Defaults to yesterday when only `start_date` is given.
    pub end_date: Option<NaiveDate>,
    #[serde(deserialize_with = "one_or_many")]
    pub game_pks: Vec<i64>,
    #[serde(deserialize_with = "one_or_many")]
    pub batter_ids: Vec<i64>,
    #[serde(deserialize_with = "one_or_many")]
    pub pitcher_ids: Vec<i64>,
    #[serde(deserialize_with = "one_or_many")]
    pub teams: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub pitch_types: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub events: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub descriptions: Vec<String>,
}

/// How the search is split into requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationType {
    Games,
    Dates,
}

/// One unit of work for the fetch stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKey {
    Date(NaiveDate),
    Game(i64),
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKey::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            RequestKey::Game(game_pk) => write!(f, "game {}", game_pk),
        }
    }
}

/// Resolved request keys plus the filters shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    iteration: IterationType,
    keys: Vec<RequestKey>,
    params: SearchParams,
    apply_team_filter: bool,
}

impl SearchPlan {
    /// Choose the iteration type and resolve request keys.
    ///
    /// Game ids take precedence over dates. Dates are resolved through the
    /// season calendar and never go past yesterday.
    pub fn new(
        params: SearchParams,
        calendar: &SeasonCalendar,
    ) -> Result<Self, ConfigurationError> {
        Self::with_max_date(params, calendar, yesterday())
    }

    pub fn with_max_date(
        mut params: SearchParams,
        calendar: &SeasonCalendar,
        max_date: NaiveDate,
    ) -> Result<Self, ConfigurationError> {
        let (iteration, keys) = if !params.game_pks.is_empty() {
            info!("Validated search, iterating by games");
            let keys = params.game_pks.iter().map(|&g| RequestKey::Game(g)).collect();
            (IterationType::Games, keys)
        } else if let Some(start) = params.start_date {
            let end = *params.end_date.get_or_insert(max_date);
            info!("Validated search, iterating by dates");
            let keys = calendar
                .resolve(start, end, max_date)?
                .into_iter()
                .map(RequestKey::Date)
                .collect();
            (IterationType::Dates, keys)
        } else {
            return Err(ConfigurationError::MissingIterationSource);
        };

        let narrowed = iteration == IterationType::Games
            || !params.pitcher_ids.is_empty()
            || !params.batter_ids.is_empty();
        let apply_team_filter = !params.teams.is_empty() && !narrowed;
        if !params.teams.is_empty() && narrowed {
            warn!("Team filter ignored: game, pitcher or batter already specified");
        }

        Ok(Self {
            iteration,
            keys,
            params,
            apply_team_filter,
        })
    }

    pub fn iteration(&self) -> IterationType {
        self.iteration
    }

    pub fn keys(&self) -> &[RequestKey] {
        &self.keys
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Request path for one key, appended to `search_path`.
    pub fn path(&self, search_path: &str, key: RequestKey) -> String {
        let mut url = search_path.to_string();

        if !self.params.pitch_types.is_empty() {
            url.push_str("&hfPT=");
            for pitch_type in &self.params.pitch_types {
                url.push_str(&urlencoding::encode(&pitch_type.to_uppercase()));
                url.push('|');
            }
        }
        push_escaped(&mut url, "hfAB", &self.params.events);
        push_escaped(&mut url, "hfPR", &self.params.descriptions);

        match key {
            RequestKey::Game(game_pk) => url.push_str(&format!("&game_pk={}", game_pk)),
            RequestKey::Date(date) => {
                let date = date.format("%Y-%m-%d");
                url.push_str(&format!("&game_date_gt={}&game_date_lt={}", date, date));
            }
        }

        for id in &self.params.pitcher_ids {
            url.push_str(&format!("&pitchers_lookup[]={}", id));
        }
        for id in &self.params.batter_ids {
            url.push_str(&format!("&batters_lookup[]={}", id));
        }

        if self.apply_team_filter {
            url.push_str("&player_type=pitcher|batter|&hfTeam=");
            for team in &self.params.teams {
                url.push_str(&urlencoding::encode(team));
                url.push('|');
            }
        }

        url
    }
}

/// Events and descriptions use `\.\.` in place of spaces.
fn push_escaped(url: &mut String, name: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    url.push_str(&format!("&{}=", name));
    for value in values {
        let escaped = value.replace(' ', "\\.\\.");
        url.push_str(&urlencoding::encode(&escaped));
        url.push('|');
    }
}
