//! Win expectancy attribution.
//!
//! The feed reports `delta_home_win_exp`, the change in the home team's win
//! probability on a pitch. These transforms restate it from the point of view
//! of the batter, the pitcher, or the team favored by a ball/strike call.

use super::umpire_calls::Call;
use crate::error::ValidationError;
use crate::record::{Record, RecordSet, Value};

fn home_delta(record: &Record<'_>) -> Option<f64> {
    record.f64("delta_home_win_exp")
}

fn home_batting(record: &Record<'_>) -> bool {
    record.str("inning_topbot") == Some("Bot")
}

/// `(batter, pitcher)` deltas; the home team bats in the bottom half.
pub fn batter_pitcher_delta(record: &Record<'_>) -> Option<(f64, f64)> {
    let delta = home_delta(record)?;
    if home_batting(record) {
        Some((delta, -delta))
    } else {
        Some((-delta, delta))
    }
}

/// Size of the win expectancy swing credited to the team a call favored.
///
/// A ball favors the batting team, a called strike the fielding team. The
/// swing only counts when it moved in that team's direction.
pub fn adj_delta_win_exp(record: &Record<'_>) -> f64 {
    let Some(call) = record.str("description").and_then(Call::from_description) else {
        return 0.0;
    };
    let Some(delta) = home_delta(record) else {
        return 0.0;
    };
    let home_favored = match call {
        Call::Ball => home_batting(record),
        Call::Strike => !home_batting(record),
    };
    if (home_favored && delta > 0.0) || (!home_favored && delta < 0.0) {
        delta.abs()
    } else {
        0.0
    }
}

/// Add `batter_delta_win_exp` and `pitcher_delta_win_exp`.
pub fn delta_win_exp(rs: &RecordSet) -> Result<RecordSet, ValidationError> {
    let (batter, pitcher): (Vec<Value>, Vec<Value>) = rs
        .records()
        .map(|r| match batter_pitcher_delta(&r) {
            Some((b, p)) => (Value::Float(b), Value::Float(p)),
            None => (Value::Null, Value::Null),
        })
        .unzip();
    rs.with_columns(vec![
        ("batter_delta_win_exp".to_string(), batter),
        ("pitcher_delta_win_exp".to_string(), pitcher),
    ])
}

/// Add `adj_delta_win_exp`.
pub fn adj_delta_win_exp_column(rs: &RecordSet) -> Result<RecordSet, ValidationError> {
    let values = rs
        .records()
        .map(|r| Value::Float(adj_delta_win_exp(&r)))
        .collect();
    rs.with_column("adj_delta_win_exp", values)
}
