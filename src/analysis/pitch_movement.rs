//! Pitch break in inches from the feed's `pfx_x`/`pfx_z` (feet), and each
//! pitch's variance from the average break of its pitch type.

use std::collections::HashMap;

use crate::error::ValidationError;
use crate::record::{Record, RecordSet, Value};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Movement {
    /// Positive toward the first base side, as seen by the pitcher.
    pub horizontal_break: f64,
    pub vertical_break: f64,
    pub total_break: f64,
    /// Sum of the component magnitudes.
    pub total_break_abs: f64,
}

impl Movement {
    pub fn from_pfx(pfx_x: f64, pfx_z: f64) -> Self {
        let horizontal_break = pfx_x * -12.0;
        let vertical_break = pfx_z * 12.0;
        Self {
            horizontal_break,
            vertical_break,
            total_break: horizontal_break + vertical_break,
            total_break_abs: horizontal_break.abs() + vertical_break.abs(),
        }
    }

    /// `None` when either component is missing.
    pub fn from_record(record: &Record<'_>) -> Option<Self> {
        Some(Self::from_pfx(record.f64("pfx_x")?, record.f64("pfx_z")?))
    }

    fn components(&self) -> [f64; 4] {
        [
            self.horizontal_break,
            self.vertical_break,
            self.total_break_abs,
            self.total_break,
        ]
    }
}

const COMPONENTS: [&str; 4] = [
    "horizontal_break",
    "vertical_break",
    "total_break_abs",
    "total_break",
];

/// Running component sums for one pitch type.
#[derive(Debug, Default)]
struct TypeTotals {
    sums: [f64; 4],
    count: usize,
}

impl TypeTotals {
    fn add(&mut self, movement: &Movement) {
        for (sum, value) in self.sums.iter_mut().zip(movement.components()) {
            *sum += value;
        }
        self.count += 1;
    }

    fn averages(&self) -> [f64; 4] {
        self.sums.map(|sum| sum / self.count as f64)
    }
}

/// Mean of each break component per `pitch_type`, over pitches with known
/// movement.
pub fn movement_averages(rs: &RecordSet) -> HashMap<String, [f64; 4]> {
    let mut totals: HashMap<&str, TypeTotals> = HashMap::new();
    for record in rs.records() {
        if let (Some(pitch_type), Some(movement)) =
            (record.str("pitch_type"), Movement::from_record(&record))
        {
            totals.entry(pitch_type).or_default().add(&movement);
        }
    }
    totals
        .into_iter()
        .map(|(pitch_type, t)| (pitch_type.to_string(), t.averages()))
        .collect()
}

/// Adds the break columns, then `<component>_avg` and `<component>_var`
/// for each of them. Missing movement gives zero break and null averages;
/// a missing pitch type gives null averages.
pub fn pitch_movement(rs: &RecordSet) -> Result<RecordSet, ValidationError> {
    let averages = movement_averages(rs);
    let mut breaks: Vec<Vec<Value>> = vec![Vec::with_capacity(rs.len()); 4];
    let mut avgs: Vec<Vec<Value>> = vec![Vec::with_capacity(rs.len()); 4];
    let mut vars: Vec<Vec<Value>> = vec![Vec::with_capacity(rs.len()); 4];

    for record in rs.records() {
        let movement = Movement::from_record(&record);
        let components = movement.unwrap_or_default().components();
        let average = movement
            .and(record.str("pitch_type"))
            .and_then(|pitch_type| averages.get(pitch_type));

        for i in 0..4 {
            breaks[i].push(Value::Float(components[i]));
            match average {
                Some(avg) => {
                    avgs[i].push(Value::Float(avg[i]));
                    vars[i].push(Value::Float(components[i] - avg[i]));
                }
                None => {
                    avgs[i].push(Value::Null);
                    vars[i].push(Value::Null);
                }
            }
        }
    }

    let mut columns = Vec::with_capacity(12);
    for (i, component) in COMPONENTS.iter().enumerate() {
        columns.push((component.to_string(), std::mem::take(&mut breaks[i])));
    }
    for (i, component) in COMPONENTS.iter().enumerate() {
        columns.push((format!("{}_avg", component), std::mem::take(&mut avgs[i])));
        columns.push((format!("{}_var", component), std::mem::take(&mut vars[i])));
    }
    rs.with_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::test_support::set;

    #[test]
    fn test_movement_from_pfx() {
        let m = Movement::from_pfx(0.5, -1.0);
        assert_eq!(m.horizontal_break, -6.0);
        assert_eq!(m.vertical_break, -12.0);
        assert_eq!(m.total_break, -18.0);
        assert_eq!(m.total_break_abs, 18.0);
    }

    #[test]
    fn test_total_break_abs_sums_magnitudes() {
        // -6 horizontal, +12 vertical
        let m = Movement::from_pfx(0.5, 1.0);
        assert_eq!(m.total_break, 6.0);
        assert_eq!(m.total_break_abs, 18.0);
    }

    #[test]
    fn test_missing_components_give_zero() {
        let rs = set(
            &["pfx_x", "pfx_z"],
            vec![
                vec![Value::Float(-0.25), Value::Float(1.25)],
                vec![Value::Null, Value::Float(1.0)],
            ],
        );
        let out = pitch_movement(&rs).unwrap();
        assert_eq!(out.record(0).unwrap().f64("total_break"), Some(18.0));
        assert_eq!(out.record(1).unwrap().f64("total_break_abs"), Some(0.0));
        assert_eq!(out.record(1).unwrap().f64("vertical_break"), Some(0.0));
        // no pitch_type column, so nothing to average against
        assert_eq!(out.record(0).unwrap().get("total_break_avg"), Some(&Value::Null));
    }

    #[test]
    fn test_averages_and_variance_by_pitch_type() {
        let rs = set(
            &["pitch_type", "pfx_x", "pfx_z"],
            vec![
                vec!["FF".into(), Value::Float(-0.5), Value::Float(1.5)],
                vec!["SL".into(), Value::Float(0.25), Value::Float(0.0)],
                vec!["FF".into(), Value::Float(-1.0), Value::Float(1.0)],
                vec!["FF".into(), Value::Null, Value::Float(1.0)],
                vec![Value::Null, Value::Float(-0.5), Value::Float(1.5)],
            ],
        );
        let out = pitch_movement(&rs).unwrap();

        // FF: h = 6, 12 -> 9; v = 18, 12 -> 15
        let first = out.record(0).unwrap();
        assert_eq!(first.f64("horizontal_break_avg"), Some(9.0));
        assert_eq!(first.f64("horizontal_break_var"), Some(-3.0));
        assert_eq!(first.f64("vertical_break_avg"), Some(15.0));
        assert_eq!(first.f64("vertical_break_var"), Some(3.0));
        assert_eq!(first.f64("total_break_abs_avg"), Some(24.0));
        assert_eq!(first.f64("total_break_var"), Some(0.0));

        let slider = out.record(1).unwrap();
        assert_eq!(slider.f64("horizontal_break_avg"), Some(-3.0));
        assert_eq!(slider.f64("horizontal_break_var"), Some(0.0));

        // unknown movement and unknown pitch type stay out of the averages
        assert_eq!(out.record(3).unwrap().get("total_break_avg"), Some(&Value::Null));
        assert_eq!(out.record(4).unwrap().get("total_break_var"), Some(&Value::Null));
        assert_eq!(out.record(4).unwrap().f64("total_break"), Some(24.0));
    }
}
