//! Derived-field transforms selectable by name.
//!
//! Names are resolved into [`Analysis`] once, when configuration is loaded;
//! an unknown name is a [`ConfigurationError`] there rather than a silent
//! no-op later.

mod delta_win_exp;
mod pitch_movement;
mod umpire_calls;

pub use delta_win_exp::{adj_delta_win_exp, batter_pitcher_delta};
pub use pitch_movement::{movement_averages, Movement};
pub use umpire_calls::{
    Call, HorizontalMiss, MissClassification, Stand, TotalMiss, UmpireCall, VerticalMiss,
    ZoneGeometry,
};

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::error::{ConfigurationError, ValidationError};
use crate::record::RecordSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Analysis {
    UmpireCalls,
    PitchMovement,
    DeltaWinExp,
    AdjDeltaWinExp,
}

impl Analysis {
    pub const ALL: [Analysis; 4] = [
        Analysis::UmpireCalls,
        Analysis::PitchMovement,
        Analysis::DeltaWinExp,
        Analysis::AdjDeltaWinExp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Analysis::UmpireCalls => "umpire_calls",
            Analysis::PitchMovement => "pitch_movement",
            Analysis::DeltaWinExp => "delta_win_exp",
            Analysis::AdjDeltaWinExp => "adj_delta_win_exp",
        }
    }
}

impl FromStr for Analysis {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "umpire_calls" => Ok(Analysis::UmpireCalls),
            "pitch_movement" => Ok(Analysis::PitchMovement),
            "delta_win_exp" | "pitcher_batter_delta_win_exp" => Ok(Analysis::DeltaWinExp),
            "adj_delta_win_exp" => Ok(Analysis::AdjDeltaWinExp),
            other => Err(ConfigurationError::UnknownAnalysis(other.to_string())),
        }
    }
}

impl TryFrom<String> for Analysis {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Applies analyses with an injected zone geometry.
#[derive(Debug, Clone, Default)]
pub struct ClassifierRegistry {
    zone: ZoneGeometry,
}

impl ClassifierRegistry {
    pub fn new(zone: ZoneGeometry) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> &ZoneGeometry {
        &self.zone
    }

    /// Resolve names, failing on the first unknown one.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Result<Vec<Analysis>, ConfigurationError> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }

    pub fn apply(&self, analysis: Analysis, rs: &RecordSet) -> Result<RecordSet, ValidationError> {
        match analysis {
            Analysis::UmpireCalls => umpire_calls::umpire_calls(&self.zone, rs),
            Analysis::PitchMovement => pitch_movement::pitch_movement(rs),
            Analysis::DeltaWinExp => delta_win_exp::delta_win_exp(rs),
            Analysis::AdjDeltaWinExp => delta_win_exp::adj_delta_win_exp_column(rs),
        }
    }

    /// Apply analyses in order, each to the output of the previous one.
    pub fn apply_all(
        &self,
        analyses: &[Analysis],
        rs: RecordSet,
    ) -> Result<RecordSet, ValidationError> {
        analyses.iter().try_fold(rs, |rs, &analysis| {
            let out = self.apply(analysis, &rs)?;
            info!("Applied analysis {} to {} pitches", analysis, out.len());
            Ok(out)
        })
    }
}
