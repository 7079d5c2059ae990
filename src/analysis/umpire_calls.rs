//! Umpire ball/strike call accuracy.
//!
//! A called pitch is compared against a target rectangle: the plate width
//! plus rule-book tolerance on the horizontal axis, the batter's own
//! `[sz_bot, sz_top]` on the vertical axis, both inflated by the radius of a
//! ball. Distances are reported in inches, rounded to two decimals.

use serde::Deserialize;
use std::fmt;

use super::delta_win_exp::adj_delta_win_exp;
use crate::error::ValidationError;
use crate::record::{Record, RecordSet, Value};

const FEET_TO_INCHES: f64 = 12.0;

/// Fixed strike zone dimensions, in feet.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoneGeometry {
    /// Half of the plate width plus tolerance, measured from the plate center.
    pub half_width: f64,
    pub ball_radius: f64,
}

impl Default for ZoneGeometry {
    fn default() -> Self {
        Self {
            half_width: 0.83,
            ball_radius: 0.12,
        }
    }
}

impl ZoneGeometry {
    /// Left and right edges of the target rectangle.
    pub fn x_bounds(&self) -> (f64, f64) {
        let edge = self.half_width + self.ball_radius;
        (-edge, edge)
    }

    /// Bottom and top edges of the target rectangle for one batter.
    pub fn y_bounds(&self, sz_bot: f64, sz_top: f64) -> (f64, f64) {
        (sz_bot - self.ball_radius, sz_top + self.ball_radius)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalMiss {
    Inside,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalMiss {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalMiss {
    Both,
    Horizontal,
    Vertical,
}

impl HorizontalMiss {
    pub fn as_str(&self) -> &'static str {
        match self {
            HorizontalMiss::Inside => "inside",
            HorizontalMiss::Outside => "outside",
        }
    }

    fn flipped(self) -> Self {
        match self {
            HorizontalMiss::Inside => HorizontalMiss::Outside,
            HorizontalMiss::Outside => HorizontalMiss::Inside,
        }
    }
}

impl VerticalMiss {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalMiss::High => "high",
            VerticalMiss::Low => "low",
        }
    }
}

impl TotalMiss {
    pub fn as_str(&self) -> &'static str {
        match self {
            TotalMiss::Both => "both",
            TotalMiss::Horizontal => "horizontal",
            TotalMiss::Vertical => "vertical",
        }
    }
}

impl fmt::Display for HorizontalMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VerticalMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TotalMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far, and in which direction, a call missed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MissClassification {
    pub horizontal_miss_type: Option<HorizontalMiss>,
    pub horizontal_miss: f64,
    pub vertical_miss_type: Option<VerticalMiss>,
    pub vertical_miss: f64,
    pub total_miss_type: Option<TotalMiss>,
    pub total_miss: f64,
}

impl MissClassification {
    /// Result for correct calls and for pitches that cannot be judged.
    pub const NONE: MissClassification = MissClassification {
        horizontal_miss_type: None,
        horizontal_miss: 0.0,
        vertical_miss_type: None,
        vertical_miss: 0.0,
        total_miss_type: None,
        total_miss: 0.0,
    };

    pub fn is_miss(&self) -> bool {
        self.horizontal_miss > 0.0 || self.vertical_miss > 0.0
    }

    fn with_total(mut self, total: f64) -> Self {
        self.total_miss = round2(total);
        self.total_miss_type = match (self.horizontal_miss > 0.0, self.vertical_miss > 0.0) {
            (true, true) => Some(TotalMiss::Both),
            (true, false) => Some(TotalMiss::Horizontal),
            (false, true) => Some(TotalMiss::Vertical),
            (false, false) => None,
        };
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Strike,
    Ball,
}

impl Call {
    pub fn from_description(description: &str) -> Option<Call> {
        match description {
            "called_strike" => Some(Call::Strike),
            "ball" => Some(Call::Ball),
            _ => None,
        }
    }
}

/// Batter handedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stand {
    Right,
    Left,
}

impl Stand {
    /// `R` is right-handed; any other value is treated as left-handed.
    pub fn from_code(code: &str) -> Stand {
        if code == "R" {
            Stand::Right
        } else {
            Stand::Left
        }
    }
}

/// The inputs of one judgeable call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UmpireCall {
    pub call: Call,
    pub stand: Stand,
    pub plate_x: f64,
    pub plate_z: f64,
    pub sz_top: f64,
    pub sz_bot: f64,
}

impl UmpireCall {
    /// `None` unless the record is a called ball or strike with a known
    /// location and zone. A `0` coordinate is the fill value for an unknown
    /// one and is treated as missing. Unknown handedness reads as left.
    pub fn from_record(record: &Record<'_>) -> Option<UmpireCall> {
        let call = Call::from_description(record.str("description")?)?;
        let stand = record.str("stand").map(Stand::from_code).unwrap_or(Stand::Left);
        let known = |name: &str| record.f64(name).filter(|v| *v != 0.0);
        Some(UmpireCall {
            call,
            stand,
            plate_x: known("plate_x")?,
            plate_z: known("plate_z")?,
            sz_top: known("sz_top")?,
            sz_bot: known("sz_bot")?,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn inches(feet: f64) -> f64 {
    round2(feet * FEET_TO_INCHES)
}

impl ZoneGeometry {
    /// Classify a record; never fails.
    pub fn classify(&self, record: &Record<'_>) -> MissClassification {
        UmpireCall::from_record(record)
            .map(|call| self.classify_call(&call))
            .unwrap_or(MissClassification::NONE)
    }

    pub fn classify_call(&self, call: &UmpireCall) -> MissClassification {
        match call.call {
            Call::Strike => self.strike_miss(call),
            Call::Ball => self.ball_miss(call),
        }
    }

    /// Toward the batter is inside. For a right-handed batter that is the
    /// left edge as seen from behind the plate.
    fn label(stand: Stand, left_edge: bool) -> HorizontalMiss {
        let right_handed = if left_edge {
            HorizontalMiss::Inside
        } else {
            HorizontalMiss::Outside
        };
        match stand {
            Stand::Right => right_handed,
            Stand::Left => right_handed.flipped(),
        }
    }

    /// A strike outside the rectangle missed by its distance to it.
    fn strike_miss(&self, call: &UmpireCall) -> MissClassification {
        let (x_min, x_max) = self.x_bounds();
        let (y_min, y_max) = self.y_bounds(call.sz_bot, call.sz_top);
        let (x, y) = (call.plate_x, call.plate_z);

        let mut out = MissClassification::NONE;
        if x < x_min {
            out.horizontal_miss = inches(x_min - x);
            out.horizontal_miss_type = Some(Self::label(call.stand, true));
        } else if x > x_max {
            out.horizontal_miss = inches(x - x_max);
            out.horizontal_miss_type = Some(Self::label(call.stand, false));
        }

        if y < y_min {
            out.vertical_miss = inches(y_min - y);
            out.vertical_miss_type = Some(VerticalMiss::Low);
        } else if y > y_max {
            out.vertical_miss = inches(y - y_max);
            out.vertical_miss_type = Some(VerticalMiss::High);
        }

        let total = out.horizontal_miss + out.vertical_miss;
        out.with_total(total)
    }

    /// A ball strictly inside the rectangle missed by its distance to the
    /// nearest edge. On the center lines the left and bottom edges are used.
    fn ball_miss(&self, call: &UmpireCall) -> MissClassification {
        let (x_min, x_max) = self.x_bounds();
        let (y_min, y_max) = self.y_bounds(call.sz_bot, call.sz_top);
        let (x, y) = (call.plate_x, call.plate_z);

        let inside = x_min < x && x < x_max && y_min < y && y < y_max;
        if !inside {
            return MissClassification::NONE;
        }

        let mut out = MissClassification::NONE;
        if x <= (x_min + x_max) / 2.0 {
            out.horizontal_miss = inches(x - x_min);
            out.horizontal_miss_type = Some(Self::label(call.stand, true));
        } else {
            out.horizontal_miss = inches(x_max - x);
            out.horizontal_miss_type = Some(Self::label(call.stand, false));
        }

        if y <= (y_min + y_max) / 2.0 {
            out.vertical_miss = inches(y - y_min);
            out.vertical_miss_type = Some(VerticalMiss::Low);
        } else {
            out.vertical_miss = inches(y_max - y);
            out.vertical_miss_type = Some(VerticalMiss::High);
        }

        let total = out.horizontal_miss.min(out.vertical_miss);
        out.with_total(total)
    }
}

pub const COLUMNS: [&str; 7] = [
    "horizontal_miss_type",
    "horizontal_miss",
    "vertical_miss_type",
    "vertical_miss",
    "total_miss_type",
    "total_miss",
    "miss_delta_win_exp_impact",
];

fn label_value<T: fmt::Display>(label: Option<T>) -> Value {
    label.map(|l| Value::Str(l.to_string())).unwrap_or(Value::Null)
}

/// Add the miss columns plus `miss_delta_win_exp_impact`, the win
/// expectancy swing in favor of the team that benefited from a missed call.
pub fn umpire_calls(zone: &ZoneGeometry, rs: &RecordSet) -> Result<RecordSet, ValidationError> {
    let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rs.len()); COLUMNS.len()];
    for record in rs.records() {
        let miss = zone.classify(&record);
        let impact = if miss.is_miss() {
            adj_delta_win_exp(&record)
        } else {
            0.0
        };
        let values = [
            label_value(miss.horizontal_miss_type),
            Value::Float(miss.horizontal_miss),
            label_value(miss.vertical_miss_type),
            Value::Float(miss.vertical_miss),
            label_value(miss.total_miss_type),
            Value::Float(miss.total_miss),
            Value::Float(impact),
        ];
        for (column, value) in columns.iter_mut().zip(values) {
            column.push(value);
        }
    }

    rs.with_columns(
        COLUMNS
            .iter()
            .map(|c| c.to_string())
            .zip(columns)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::test_support::set;

    fn call(call: Call, stand: Stand, plate_x: f64, plate_z: f64) -> UmpireCall {
        UmpireCall {
            call,
            stand,
            plate_x,
            plate_z,
            sz_top: 3.4,
            sz_bot: 1.6,
        }
    }

    #[test]
    fn test_strike_outside_right_handed() {
        let zone = ZoneGeometry::default();
        let miss = zone.classify_call(&call(Call::Strike, Stand::Right, 1.20, 2.5));
        assert_eq!(miss.horizontal_miss_type, Some(HorizontalMiss::Outside));
        assert_eq!(miss.horizontal_miss, 3.00);
        assert_eq!(miss.vertical_miss, 0.0);
        assert_eq!(miss.vertical_miss_type, None);
        assert_eq!(miss.total_miss_type, Some(TotalMiss::Horizontal));
        assert_eq!(miss.total_miss, 3.00);
    }

    #[test]
    fn test_strike_low_and_inside_is_additive() {
        let zone = ZoneGeometry::default();
        // 0.25 ft past the left edge, 0.5 ft below the inflated bottom.
        let miss = zone.classify_call(&call(Call::Strike, Stand::Right, -1.20, 0.98));
        assert_eq!(miss.horizontal_miss_type, Some(HorizontalMiss::Inside));
        assert_eq!(miss.horizontal_miss, 3.0);
        assert_eq!(miss.vertical_miss_type, Some(VerticalMiss::Low));
        assert_eq!(miss.vertical_miss, 6.0);
        assert_eq!(miss.total_miss_type, Some(TotalMiss::Both));
        assert_eq!(miss.total_miss, 9.0);
    }

    #[test]
    fn test_strike_inside_rectangle_is_correct() {
        let zone = ZoneGeometry::default();
        let miss = zone.classify_call(&call(Call::Strike, Stand::Left, 0.5, 2.5));
        assert_eq!(miss, MissClassification::NONE);
    }

    #[test]
    fn test_ball_outside_rectangle_is_correct() {
        let zone = ZoneGeometry::default();
        let miss = zone.classify_call(&call(Call::Ball, Stand::Right, 1.5, 2.5));
        assert_eq!(miss, MissClassification::NONE);
        // on the edge is not strictly inside
        let miss = zone.classify_call(&call(Call::Ball, Stand::Right, 0.95, 2.5));
        assert_eq!(miss, MissClassification::NONE);
    }

    #[test]
    fn test_ball_inside_takes_nearest_axis() {
        let zone = ZoneGeometry::default();
        // x: 0.15 ft from the right edge, z: 0.5 ft from the top edge.
        let miss = zone.classify_call(&call(Call::Ball, Stand::Right, 0.80, 3.02));
        assert_eq!(miss.horizontal_miss_type, Some(HorizontalMiss::Outside));
        assert_eq!(miss.horizontal_miss, 1.8);
        assert_eq!(miss.vertical_miss_type, Some(VerticalMiss::High));
        assert_eq!(miss.vertical_miss, 6.0);
        assert_eq!(miss.total_miss_type, Some(TotalMiss::Both));
        assert_eq!(miss.total_miss, 1.8);
    }

    #[test]
    fn test_ball_on_center_lines_uses_left_and_bottom_edges() {
        let zone = ZoneGeometry {
            half_width: 0.83,
            ball_radius: 0.12,
        };
        // Offset the plate so the horizontal center line is not the 0 sentinel.
        let shifted = ZoneGeometry {
            half_width: 1.0,
            ball_radius: 0.0,
        };
        let (y_min, y_max) = zone.y_bounds(1.6, 3.4);
        let mid_z = (y_min + y_max) / 2.0;
        let miss = zone.classify_call(&call(Call::Ball, Stand::Right, -0.5, mid_z));
        assert_eq!(miss.vertical_miss_type, Some(VerticalMiss::Low));
        assert_eq!(miss.vertical_miss, inches(mid_z - y_min));

        let miss = shifted.classify_call(&call(Call::Ball, Stand::Left, -1e-9, 2.0));
        assert_eq!(miss.horizontal_miss_type, Some(HorizontalMiss::Outside));
        assert_eq!(miss.horizontal_miss, 12.0);
    }

    #[test]
    fn test_sentinel_and_other_descriptions_are_not_judged() {
        let zone = ZoneGeometry::default();
        let rs = set(
            &["description", "plate_x", "plate_z", "sz_top", "sz_bot", "stand"],
            vec![
                vec!["called_strike".into(), Value::Float(0.0), 2.5.into(), 3.4.into(), 1.6.into(), "R".into()],
                vec!["ball".into(), 0.3.into(), 2.5.into(), Value::Null, 1.6.into(), "R".into()],
                vec!["swinging_strike".into(), 1.5.into(), 2.5.into(), 3.4.into(), 1.6.into(), "R".into()],
            ],
        );
        for record in rs.records() {
            assert_eq!(zone.classify(&record), MissClassification::NONE);
        }
    }

    #[test]
    fn test_missing_stand_is_judged_as_left_handed() {
        let zone = ZoneGeometry::default();
        let rs = set(
            &["description", "plate_x", "plate_z", "sz_top", "sz_bot", "stand"],
            vec![
                vec!["called_strike".into(), 0.3.into(), 4.5.into(), 3.4.into(), 1.6.into(), Value::Null],
                vec!["called_strike".into(), 1.20.into(), 2.5.into(), 3.4.into(), 1.6.into(), Value::Null],
            ],
        );

        // 4.5 - (3.4 + 0.12) = 0.98 ft
        let high = zone.classify(&rs.record(0).unwrap());
        assert_eq!(high.vertical_miss_type, Some(VerticalMiss::High));
        assert_eq!(high.vertical_miss, 11.76);
        assert_eq!(high.total_miss_type, Some(TotalMiss::Vertical));
        assert_eq!(high.total_miss, 11.76);

        let wide = zone.classify(&rs.record(1).unwrap());
        let left = zone.classify_call(&call(Call::Strike, Stand::Left, 1.20, 2.5));
        assert_eq!(wide, left);
        assert_eq!(wide.horizontal_miss_type, Some(HorizontalMiss::Inside));
    }

    #[test]
    fn test_transform_adds_columns_and_impact() {
        let zone = ZoneGeometry::default();
        let rs = set(
            &[
                "description",
                "plate_x",
                "plate_z",
                "sz_top",
                "sz_bot",
                "stand",
                "inning_topbot",
                "delta_home_win_exp",
            ],
            vec![
                vec![
                    "called_strike".into(),
                    1.20.into(),
                    2.5.into(),
                    3.4.into(),
                    1.6.into(),
                    "R".into(),
                    "Top".into(),
                    0.04.into(),
                ],
                vec![
                    "called_strike".into(),
                    0.2.into(),
                    2.5.into(),
                    3.4.into(),
                    1.6.into(),
                    "R".into(),
                    "Top".into(),
                    0.04.into(),
                ],
            ],
        );
        let out = umpire_calls(&zone, &rs).unwrap();
        for column in COLUMNS {
            assert!(out.has_column(column));
        }
        let missed = out.record(0).unwrap();
        assert_eq!(missed.str("horizontal_miss_type"), Some("outside"));
        assert_eq!(missed.str("total_miss_type"), Some("horizontal"));
        assert_eq!(missed.f64("miss_delta_win_exp_impact"), Some(0.04));

        let correct = out.record(1).unwrap();
        assert_eq!(correct.get("horizontal_miss_type"), Some(&Value::Null));
        assert_eq!(correct.f64("miss_delta_win_exp_impact"), Some(0.0));
    }
}
