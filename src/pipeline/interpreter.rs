use tracing::{debug, info};

use super::step::PipelineStep;
use crate::error::ValidationError;
use crate::record::{Predicate, RecordSet};

/// A straight-line fold of steps over a record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
}

impl Pipeline {
    pub fn new(steps: Vec<PipelineStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check every step against the columns it will see, without touching
    /// any rows. Rank steps make their output column visible to later steps.
    pub fn validate(&self, columns: &[String]) -> Result<(), ValidationError> {
        let mut columns = columns.to_vec();
        for (index, step) in self.steps.iter().enumerate() {
            let checked = match step {
                PipelineStep::Query(params) => {
                    Predicate::parse(&params.query).and_then(|p| p.validate(&columns))
                }
                PipelineStep::Sort(params) => params.validate(&columns),
                PipelineStep::Rank(params) => {
                    let checked = params.validate(&columns);
                    if !columns.contains(&params.name) {
                        columns.push(params.name.clone());
                    }
                    checked
                }
            };
            checked.map_err(|e| e.at_step(index, step.kind()))?;
        }
        Ok(())
    }

    /// Validate, then apply each step to the output of the previous one.
    ///
    /// The input is consumed only on success; on error nothing of a partial
    /// run is returned.
    pub fn run(&self, input: RecordSet) -> Result<RecordSet, ValidationError> {
        self.validate(input.columns())?;

        self.steps
            .iter()
            .enumerate()
            .try_fold(input, |rs, (index, step)| {
                let before = rs.len();
                let out = apply(step, &rs).map_err(|e| e.at_step(index, step.kind()))?;
                info!(
                    "Applied {} step {}: {} -> {} rows",
                    step.kind(),
                    index,
                    before,
                    out.len()
                );
                Ok(out)
            })
    }
}

fn apply(step: &PipelineStep, rs: &RecordSet) -> Result<RecordSet, ValidationError> {
    match step {
        PipelineStep::Query(params) => {
            debug!("Query: {}", params.query);
            rs.filter(&params.query)
        }
        PipelineStep::Rank(params) => {
            debug!("Rank {} by {:?}", params.name, params.fields);
            rs.rank(params)
        }
        PipelineStep::Sort(params) => {
            debug!("Sort by {:?}", params.fields);
            rs.sort(params)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::test_support::set;
    use crate::record::{RankParams, SortParams, Value};

    fn calls() -> RecordSet {
        set(
            &["pitch_id", "description", "total_miss", "release_speed"],
            vec![
                vec!["1|1|1".into(), "ball".into(), Value::Float(2.5), Value::Float(92.0)],
                vec!["1|1|2".into(), "called_strike".into(), Value::Float(4.0), Value::Float(60.0)],
                vec!["1|2|1".into(), "called_strike".into(), Value::Float(3.1), Value::Float(88.0)],
                vec!["1|3|1".into(), "ball".into(), Value::Float(0.0), Value::Float(95.0)],
                vec!["1|4|1".into(), "ball".into(), Value::Float(5.2), Value::Float(90.0)],
            ],
        )
    }

    fn worst_calls() -> Pipeline {
        Pipeline::new(vec![
            PipelineStep::query("description in ('called_strike', 'ball')"),
            PipelineStep::query("release_speed >= 65"),
            PipelineStep::query("total_miss >= 2"),
            PipelineStep::Rank(
                RankParams::new("total_miss_rank", vec!["total_miss"], vec![false])
                    .keep_original_order(true),
            ),
            PipelineStep::query("total_miss_rank <= 2"),
        ])
    }

    #[test]
    fn test_run_folds_steps() {
        let out = worst_calls().run(calls()).unwrap();
        let ids: Vec<&str> = out.records().filter_map(|r| r.str("pitch_id")).collect();
        assert_eq!(ids, vec!["1|2|1", "1|4|1"]);
        let ranks: Vec<i64> = out
            .records()
            .filter_map(|r| r.i64("total_miss_rank"))
            .collect();
        assert_eq!(ranks, vec![2, 1]);
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let rs = calls();
        assert_eq!(Pipeline::default().run(rs.clone()).unwrap(), rs);
    }

    #[test]
    fn test_unknown_field_reports_step() {
        let pipeline = Pipeline::new(vec![
            PipelineStep::query("total_miss > 0"),
            PipelineStep::Sort(SortParams::new(vec!["spin_rate"], vec![true])),
        ]);
        let err = pipeline.run(calls()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownField("spin_rate".to_string()).at_step(1, "sort")
        );
    }

    #[test]
    fn test_mismatch_fails_before_any_step_runs() {
        let pipeline = Pipeline::new(vec![
            PipelineStep::query("total_miss > 0"),
            PipelineStep::Rank(RankParams::new("r", vec!["total_miss"], vec![true, false])),
        ]);
        let err = pipeline.run(calls()).unwrap_err();
        assert_eq!(
            err.root(),
            &ValidationError::ParameterCountMismatch {
                fields: 1,
                ascending: 2
            }
        );
    }

    #[test]
    fn test_rank_column_visible_to_later_steps() {
        let pipeline = Pipeline::new(vec![PipelineStep::query("total_miss_rank <= 1")]);
        assert!(pipeline.validate(calls().columns()).is_err());
        assert!(worst_calls().validate(calls().columns()).is_ok());
    }

    #[test]
    fn test_malformed_query_is_validation_error() {
        let pipeline = Pipeline::new(vec![PipelineStep::query("total_miss >")]);
        let err = pipeline.run(calls()).unwrap_err();
        assert!(matches!(
            err.root(),
            ValidationError::InvalidExpression { .. }
        ));
    }
}
