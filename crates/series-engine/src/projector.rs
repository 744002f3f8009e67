//! Series projection -- template + exceptions + window to materialized occurrences.
//!
//! Projection is a pure read path: parse the stored rule, generate candidates in the
//! window, index the exceptions, resolve. Multiple series are projected independently;
//! combining them is the caller's job (see [`crate::calendar`]).

use crate::config::EngineConfig;
use crate::error::Result;
use crate::generator::OccurrenceGenerator;
use crate::model::{ExceptionRecord, MaterializedOccurrence, SeriesTemplate};
use crate::resolver::{ExceptionIndex, ExceptionResolver};
use crate::rule::RecurrenceRule;
use crate::window::Window;

#[derive(Debug, Clone, Default)]
pub struct SeriesProjector {
    config: EngineConfig,
}

impl SeriesProjector {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Project one template over `window`.
    ///
    /// A non-recurring template yields at most one occurrence whose id is the series
    /// id; exceptions do not apply to it.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidTemplate` if the template's end is not after its
    /// start, `EngineError::InvalidRule` if its rule text does not parse, and
    /// `EngineError::InvalidTimezone` for an unknown time zone.
    #[tracing::instrument(
        level = "debug",
        skip(self, template, exceptions),
        fields(series_id = %template.id, exceptions = exceptions.len())
    )]
    pub fn project(
        &self,
        template: &SeriesTemplate,
        exceptions: &[ExceptionRecord],
        window: Window,
    ) -> Result<Vec<MaterializedOccurrence>> {
        let rule = template.rule()?;
        self.project_parsed(template, rule, exceptions, window)
    }

    /// Project with an already parsed rule, for callers that need the rule themselves.
    pub(crate) fn project_parsed<'a>(
        &self,
        template: &SeriesTemplate,
        rule: Option<RecurrenceRule>,
        exceptions: impl IntoIterator<Item = &'a ExceptionRecord>,
        window: Window,
    ) -> Result<Vec<MaterializedOccurrence>> {
        template.validate()?;
        let timezone = template.time_zone()?;
        let recurring = rule.is_some();

        let candidates = OccurrenceGenerator::new(rule, template.first_occurrence_start)
            .in_timezone(timezone)
            .with_dst_policy(self.config.dst_policy)
            .with_max_candidates(self.config.max_candidates)
            .occurrences(window);

        let index = if recurring {
            ExceptionIndex::build(&template.id, exceptions)
        } else {
            if exceptions.into_iter().next().is_some() {
                tracing::debug!("ignoring exceptions on non-recurring template");
            }
            ExceptionIndex::default()
        };

        let occurrences = ExceptionResolver::new(template)
            .recurring(recurring)
            .with_cancelled_instances(self.config.cancelled_instances)
            .resolve(candidates, &index);

        tracing::debug!(occurrences = occurrences.len(), "projected series");
        Ok(occurrences)
    }
}

/// Project one template with the default configuration.
pub fn project(
    template: &SeriesTemplate,
    exceptions: &[ExceptionRecord],
    window: Window,
) -> Result<Vec<MaterializedOccurrence>> {
    SeriesProjector::default().project(template, exceptions, window)
}
