//! Per-clip caption text.

use serde::Deserialize;

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFormat {
    Float,
    Int,
    #[default]
    Text,
}

/// A numeric or text field rendered with an optional unit suffix.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "MetricCaptionSpec")]
pub struct MetricCaption {
    pub field: String,
    pub format: MetricFormat,
    /// Decimal places for [`MetricFormat::Float`].
    pub scale: usize,
    pub suffix: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MetricCaptionSpec {
    Preset(String),
    Full {
        field: String,
        #[serde(default)]
        format: MetricFormat,
        #[serde(default)]
        scale: Option<usize>,
        #[serde(default)]
        suffix: Option<String>,
    },
}

impl From<MetricCaptionSpec> for MetricCaption {
    fn from(spec: MetricCaptionSpec) -> Self {
        match spec {
            MetricCaptionSpec::Preset(field) => MetricCaption::preset(&field),
            MetricCaptionSpec::Full {
                field,
                format,
                scale,
                suffix,
            } => MetricCaption {
                field,
                format,
                scale: scale.unwrap_or(DEFAULT_SCALE),
                suffix,
            },
        }
    }
}

const DEFAULT_SCALE: usize = 2;

impl MetricCaption {
    /// Known formats for common feed fields; anything else renders as text.
    pub fn preset(field: &str) -> Self {
        let (format, scale, suffix) = match field {
            "release_speed" | "launch_speed" | "effective_speed" => (MetricFormat::Float, 1, " MPH"),
            "hit_distance_sc" => (MetricFormat::Int, 0, " FT"),
            "release_spin_rate" => (MetricFormat::Int, 0, " RPM"),
            "launch_angle" => (MetricFormat::Int, 0, "°"),
            "total_miss" | "horizontal_miss" | "vertical_miss" => (MetricFormat::Float, 2, " IN"),
            "total_break" | "total_break_abs" | "horizontal_break" | "vertical_break" => {
                (MetricFormat::Float, 1, " IN")
            }
            _ => (MetricFormat::Text, DEFAULT_SCALE, ""),
        };
        Self {
            field: field.to_string(),
            format,
            scale,
            suffix: (!suffix.is_empty()).then(|| suffix.to_string()),
        }
    }

    pub fn render(&self, record: &Record<'_>) -> String {
        let Some(value) = record.get(&self.field).filter(|v| !v.is_null()) else {
            return String::new();
        };
        let text = match (self.format, value.as_f64()) {
            (MetricFormat::Float, Some(x)) => format!("{:.*}", self.scale, x),
            (MetricFormat::Int, Some(x)) => format!("{}", x.round() as i64),
            _ => value.to_string(),
        };
        match &self.suffix {
            Some(suffix) => format!("{}{}", text, suffix),
            None => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    Pitcher,
    Batter,
}

impl PlayerRole {
    fn field(&self) -> &'static str {
        match self {
            PlayerRole::Pitcher => "pitcher_fullname",
            PlayerRole::Batter => "batter_fullname",
        }
    }
}

/// Caption settings for a compilation. A metric caption wins over a player
/// caption; with neither, clips are uncaptioned.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    pub metric: Option<MetricCaption>,
    pub player: Option<PlayerRole>,
}

impl CaptionConfig {
    pub fn is_empty(&self) -> bool {
        self.metric.is_none() && self.player.is_none()
    }

    pub fn render(&self, record: &Record<'_>) -> String {
        if let Some(metric) = &self.metric {
            return metric.render(record);
        }
        match self.player {
            Some(role) => record.str(role.field()).unwrap_or_default().to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::test_support::set;
    use crate::record::{RecordSet, Value};

    fn pitch() -> RecordSet {
        set(
            &["release_speed", "hit_distance_sc", "total_miss", "pitcher_fullname", "pitch_name"],
            vec![vec![
                Value::Float(97.46),
                Value::Int(451),
                Value::Float(3.1),
                "Logan Webb".into(),
                "Sinker".into(),
            ]],
        )
    }

    #[test]
    fn test_metric_presets() {
        let rs = pitch();
        let record = rs.record(0).unwrap();
        assert_eq!(MetricCaption::preset("release_speed").render(&record), "97.5 MPH");
        assert_eq!(MetricCaption::preset("hit_distance_sc").render(&record), "451 FT");
        assert_eq!(MetricCaption::preset("total_miss").render(&record), "3.10 IN");
        assert_eq!(MetricCaption::preset("pitch_name").render(&record), "Sinker");
        assert_eq!(MetricCaption::preset("launch_speed").render(&record), "");
    }

    #[test]
    fn test_metric_wins_over_player() {
        let rs = pitch();
        let record = rs.record(0).unwrap();
        let config = CaptionConfig {
            metric: Some(MetricCaption::preset("hit_distance_sc")),
            player: Some(PlayerRole::Pitcher),
        };
        assert_eq!(config.render(&record), "451 FT");

        let config = CaptionConfig {
            metric: None,
            player: Some(PlayerRole::Pitcher),
        };
        assert_eq!(config.render(&record), "Logan Webb");
        assert_eq!(CaptionConfig::default().render(&record), "");
    }

    #[test]
    fn test_caption_config_from_toml() {
        let preset: CaptionConfig = toml::from_str(r#"metric = "release_speed""#).unwrap();
        assert_eq!(preset.metric, Some(MetricCaption::preset("release_speed")));

        let full: CaptionConfig = toml::from_str(
            r#"metric = { field = "release_speed", format = "int", suffix = " mph" }"#,
        )
        .unwrap();
        let rs = pitch();
        assert_eq!(full.render(&rs.record(0).unwrap()), "97 mph");

        let player: CaptionConfig = toml::from_str(r#"player = "batter""#).unwrap();
        assert_eq!(player.player, Some(PlayerRole::Batter));
    }
}
