//! Series templates, exception records and materialized occurrences.
//!
//! Templates and exceptions arrive from the storage layer as JSON rows (camelCase
//! field names); materialized occurrences are computed per query and never stored.

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result, RuleParseError};
use crate::rule::{self, RecurrenceRule};

/// Show status, kept verbatim as stored (e.g. "scheduled", "confirmed", "cancelled").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

impl Status {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepts both spellings, case-insensitively.
    pub fn is_cancelled(&self) -> bool {
        self.0.eq_ignore_ascii_case("cancelled") || self.0.eq_ignore_ascii_case("canceled")
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new("scheduled")
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The recurring show definition: a first occurrence plus an optional rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesTemplate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub first_occurrence_start: DateTime<Utc>,
    /// Together with the start, fixes the duration of every occurrence.
    pub first_occurrence_end: DateTime<Utc>,
    /// Rule text such as `FREQ=DAILY;COUNT=5`; absent for a one-off show.
    #[serde(default)]
    pub recurrence_rule: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub workspace_id: String,
    /// IANA zone the rule is stepped in. Defaults to UTC.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl SeriesTemplate {
    pub fn duration(&self) -> TimeDelta {
        self.first_occurrence_end - self.first_occurrence_start
    }

    /// Parsed recurrence rule, `None` for a non-recurring show.
    pub fn rule(&self) -> std::result::Result<Option<RecurrenceRule>, RuleParseError> {
        rule::parse(self.recurrence_rule.as_deref())
    }

    pub fn time_zone(&self) -> Result<Tz> {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(Tz::UTC),
            Some(name) => name
                .parse()
                .map_err(|_| EngineError::InvalidTimezone(name.to_string())),
        }
    }

    /// Checks `firstOccurrenceEnd > firstOccurrenceStart`.
    pub fn validate(&self) -> Result<()> {
        if self.first_occurrence_end <= self.first_occurrence_start {
            return Err(EngineError::InvalidTemplate {
                series_id: self.id.clone(),
                reason: format!(
                    "end {} is not after start {}",
                    self.first_occurrence_end.to_rfc3339(),
                    self.first_occurrence_start.to_rfc3339()
                ),
            });
        }
        Ok(())
    }
}

/// Field-by-field overrides for a single modified occurrence. `None` keeps the
/// template's value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OccurrenceOverride {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub status: Option<Status>,
    pub notes: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExceptionKind {
    Modified(OccurrenceOverride),
    Cancelled,
}

/// A deviation from the series for exactly one nominal occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionRecord {
    pub series_id: String,
    /// The nominal (un-overridden) start this exception replaces; the matching key.
    pub target_occurrence_start: DateTime<Utc>,
    pub kind: ExceptionKind,
}

impl ExceptionRecord {
    pub fn modified(
        series_id: impl Into<String>,
        target_occurrence_start: DateTime<Utc>,
        overrides: OccurrenceOverride,
    ) -> Self {
        Self {
            series_id: series_id.into(),
            target_occurrence_start,
            kind: ExceptionKind::Modified(overrides),
        }
    }

    pub fn cancelled(series_id: impl Into<String>, target_occurrence_start: DateTime<Utc>) -> Self {
        Self {
            series_id: series_id.into(),
            target_occurrence_start,
            kind: ExceptionKind::Cancelled,
        }
    }
}

/// A concrete, exception-resolved occurrence of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedOccurrence {
    pub occurrence_id: String,
    pub series_id: String,
    /// Start as produced by the rule, before any override.
    pub nominal_start: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub is_recurrence: bool,
    pub is_exception: bool,
    pub is_cancelled: bool,
}
