//! Exception resolution -- merges per-occurrence exceptions into generated candidates.
//!
//! Exceptions are matched by exact equality on the nominal start time. Exceptions
//! whose target is not among the candidates are ignored: they belong to some other
//! window.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::CancelledInstancePolicy;
use crate::model::{
    ExceptionKind, ExceptionRecord, MaterializedOccurrence, OccurrenceOverride, SeriesTemplate,
};
use crate::occurrence_id::occurrence_id;

/// Exceptions of one series keyed by their target nominal start.
#[derive(Debug, Default)]
pub struct ExceptionIndex<'a> {
    by_start: HashMap<DateTime<Utc>, &'a ExceptionRecord>,
}

impl<'a> ExceptionIndex<'a> {
    /// Index the records belonging to `series_id`.
    ///
    /// Records for other series are dropped. When two records target the same
    /// nominal start the later one in input order wins.
    pub fn build(series_id: &str, records: impl IntoIterator<Item = &'a ExceptionRecord>) -> Self {
        let mut by_start = HashMap::new();
        for record in records {
            if record.series_id != series_id {
                tracing::warn!(
                    series_id,
                    exception_series_id = %record.series_id,
                    "ignoring exception addressed to another series"
                );
                continue;
            }
            let target = record.target_occurrence_start;
            if by_start.insert(target, record).is_some() {
                tracing::warn!(
                    series_id,
                    target = %target.to_rfc3339(),
                    "duplicate exception for occurrence; last record wins"
                );
            }
        }
        Self { by_start }
    }

    pub fn get(&self, nominal_start: DateTime<Utc>) -> Option<&'a ExceptionRecord> {
        self.by_start.get(&nominal_start).copied()
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }
}

/// Builds materialized occurrences for one template.
#[derive(Debug, Clone)]
pub struct ExceptionResolver<'t> {
    template: &'t SeriesTemplate,
    duration: TimeDelta,
    recurring: bool,
    cancelled_instances: CancelledInstancePolicy,
}

impl<'t> ExceptionResolver<'t> {
    pub fn new(template: &'t SeriesTemplate) -> Self {
        Self {
            template,
            duration: template.duration(),
            recurring: true,
            cancelled_instances: CancelledInstancePolicy::default(),
        }
    }

    /// Non-recurring templates keep the series id as their occurrence id.
    pub fn recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    pub fn with_cancelled_instances(mut self, policy: CancelledInstancePolicy) -> Self {
        self.cancelled_instances = policy;
        self
    }

    /// Resolve ascending candidates against `exceptions`; output keeps input order.
    pub fn resolve(
        &self,
        candidates: impl IntoIterator<Item = DateTime<Utc>>,
        exceptions: &ExceptionIndex<'_>,
    ) -> Vec<MaterializedOccurrence> {
        candidates
            .into_iter()
            .filter_map(|nominal| match exceptions.get(nominal).map(|e| &e.kind) {
                None => Some(self.template_occurrence(nominal)),
                Some(ExceptionKind::Modified(overrides)) => {
                    Some(self.with_overrides(nominal, overrides))
                }
                Some(ExceptionKind::Cancelled) => match self.cancelled_instances {
                    CancelledInstancePolicy::Omit => None,
                    CancelledInstancePolicy::Retain => {
                        let mut occurrence = self.template_occurrence(nominal);
                        occurrence.is_exception = true;
                        occurrence.is_cancelled = true;
                        Some(occurrence)
                    }
                },
            })
            .collect()
    }

    fn template_occurrence(&self, nominal: DateTime<Utc>) -> MaterializedOccurrence {
        let template = self.template;
        MaterializedOccurrence {
            occurrence_id: self.id_for(nominal),
            series_id: template.id.clone(),
            nominal_start: nominal,
            start: nominal,
            end: nominal + self.duration,
            title: template.title.clone(),
            description: template.description.clone(),
            status: template.status.clone(),
            color: template.color.clone(),
            notes: template.notes.clone(),
            is_recurrence: self.recurring,
            is_exception: false,
            is_cancelled: template.status.is_cancelled(),
        }
    }

    fn with_overrides(
        &self,
        nominal: DateTime<Utc>,
        overrides: &OccurrenceOverride,
    ) -> MaterializedOccurrence {
        let mut occurrence = self.template_occurrence(nominal);
        let start = overrides.start.unwrap_or(nominal);
        let end = match overrides.end {
            Some(end) if end > start => end,
            Some(end) => {
                tracing::warn!(
                    series_id = %self.template.id,
                    start = %start.to_rfc3339(),
                    end = %end.to_rfc3339(),
                    "override end is not after start; keeping series duration"
                );
                start + self.duration
            }
            None => start + self.duration,
        };

        occurrence.start = start;
        occurrence.end = end;
        if let Some(title) = &overrides.title {
            occurrence.title = title.clone();
        }
        if let Some(description) = &overrides.description {
            occurrence.description = Some(description.clone());
        }
        if let Some(status) = &overrides.status {
            occurrence.status = status.clone();
        }
        if let Some(notes) = &overrides.notes {
            occurrence.notes = Some(notes.clone());
        }
        if let Some(color) = &overrides.color {
            occurrence.color = Some(color.clone());
        }
        occurrence.is_exception = true;
        occurrence.is_cancelled = occurrence.status.is_cancelled();
        occurrence
    }

    fn id_for(&self, nominal: DateTime<Utc>) -> String {
        if self.recurring {
            occurrence_id(&self.template.id, nominal)
        } else {
            self.template.id.clone()
        }
    }
}

/// Resolve `candidates` for `template` with the default cancellation policy.
pub fn resolve(
    candidates: impl IntoIterator<Item = DateTime<Utc>>,
    exceptions: &ExceptionIndex<'_>,
    template: &SeriesTemplate,
) -> Vec<MaterializedOccurrence> {
    ExceptionResolver::new(template).resolve(candidates, exceptions)
}
