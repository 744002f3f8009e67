//! Workspace calendar assembly.
//!
//! Projects every template of a workspace over one window, concatenates the results
//! and maps them to the JSON shape the calendar, list and crew-schedule views consume.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::model::{ExceptionRecord, MaterializedOccurrence, SeriesTemplate, Status};
use crate::projector::SeriesProjector;
use crate::rule::RecurrenceRule;
use crate::window::Window;

/// One calendar entry as returned by `GET /api/calendar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: Status,
    pub description: Option<String>,
    pub color: Option<String>,
    /// The owning series id.
    pub parent_id: String,
    pub is_recurrence: bool,
    pub is_exception: bool,
    pub is_cancelled: bool,
    /// Canonical rule text of the owning series.
    pub recurring_pattern: Option<String>,
    pub notes: Option<String>,
}

impl CalendarEntry {
    pub fn new(occurrence: MaterializedOccurrence, recurring_pattern: Option<String>) -> Self {
        Self {
            id: occurrence.occurrence_id,
            title: occurrence.title,
            start_time: occurrence.start,
            end_time: occurrence.end,
            status: occurrence.status,
            description: occurrence.description,
            color: occurrence.color,
            parent_id: occurrence.series_id,
            is_recurrence: occurrence.is_recurrence,
            is_exception: occurrence.is_exception,
            is_cancelled: occurrence.is_cancelled,
            recurring_pattern,
            notes: occurrence.notes,
        }
    }
}

/// Project all `templates` over `window` and return their entries sorted by start.
///
/// Exceptions are routed to their series by `series_id`. Templates whose status is
/// cancelled are dropped when `config.hide_cancelled_series` is set.
///
/// # Errors
/// The first template that fails to project aborts the call with
/// `EngineError::Series` naming that template (or `EngineError::InvalidTemplate`,
/// which already does).
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(templates = templates.len(), exceptions = exceptions.len())
)]
pub fn build_calendar(
    templates: &[SeriesTemplate],
    exceptions: &[ExceptionRecord],
    window: Window,
    config: &EngineConfig,
) -> Result<Vec<CalendarEntry>> {
    let mut by_series: HashMap<&str, Vec<&ExceptionRecord>> = HashMap::new();
    for exception in exceptions {
        by_series
            .entry(exception.series_id.as_str())
            .or_default()
            .push(exception);
    }

    let projector = SeriesProjector::new(config.clone());
    let mut entries = Vec::new();

    for template in templates {
        if config.hide_cancelled_series && template.status.is_cancelled() {
            tracing::debug!(series_id = %template.id, "skipping cancelled series");
            continue;
        }

        let rule = template
            .rule()
            .map_err(|e| EngineError::from(e).in_series(&template.id))?;
        let pattern = rule.as_ref().map(RecurrenceRule::to_string);
        let series_exceptions = by_series
            .get(template.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();

        let occurrences = projector
            .project_parsed(template, rule, series_exceptions.iter().copied(), window)
            .map_err(|e| e.in_series(&template.id))?;

        entries.extend(
            occurrences
                .into_iter()
                .map(|occurrence| CalendarEntry::new(occurrence, pattern.clone())),
        );
    }

    entries.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
    tracing::debug!(entries = entries.len(), "built calendar");
    Ok(entries)
}
