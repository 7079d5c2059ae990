//! One end-to-end run: resolve dates, fetch, derive, select.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::analysis::{Analysis, ClassifierRegistry};
use crate::error::PipelineError;
use crate::feed::{FetchCoordinator, SearchParams, SearchPlan};
use crate::pipeline::Pipeline;
use crate::record::RecordSet;
use crate::season::{yesterday, SeasonCalendar};

pub struct Session {
    calendar: SeasonCalendar,
    coordinator: FetchCoordinator,
    registry: ClassifierRegistry,
    analyses: Vec<Analysis>,
    pipeline: Pipeline,
}

impl Session {
    pub fn new(
        calendar: SeasonCalendar,
        coordinator: FetchCoordinator,
        registry: ClassifierRegistry,
        analyses: Vec<Analysis>,
        pipeline: Pipeline,
    ) -> Self {
        Self {
            calendar,
            coordinator,
            registry,
            analyses,
            pipeline,
        }
    }

    pub fn run(&self, params: SearchParams) -> Result<RecordSet, PipelineError> {
        self.run_until(params, yesterday())
    }

    /// Like [`run`](Self::run) with an explicit upper bound on dates.
    pub fn run_until(
        &self,
        params: SearchParams,
        max_date: NaiveDate,
    ) -> Result<RecordSet, PipelineError> {
        let plan = SearchPlan::with_max_date(params, &self.calendar, max_date)?;
        let fetched = self.coordinator.fetch(&plan)?;

        if fetched.columns().is_empty() {
            warn!("Feed returned no data, skipping analyses and pipeline");
            return Ok(fetched);
        }

        let derived = self.registry.apply_all(&self.analyses, fetched)?;
        let selected = self.pipeline.run(derived)?;
        info!("Selected {} pitches", selected.len());
        Ok(selected)
    }
}
