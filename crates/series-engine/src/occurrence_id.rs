//! Stable occurrence identities.
//!
//! A recurring occurrence is identified by `<seriesId>:<nominal start>` where the
//! start is rendered as `YYYYMMDDTHHMMSSZ` (with a fractional part only when the
//! start has sub-second precision). The timestamp never contains `:`, so the id
//! splits unambiguously at its last colon even when the series id contains one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{EngineError, Result};

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.fZ";
const SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OccurrenceId {
    series_id: String,
    nominal_start: DateTime<Utc>,
}

impl OccurrenceId {
    pub fn new(series_id: impl Into<String>, nominal_start: DateTime<Utc>) -> Self {
        Self {
            series_id: series_id.into(),
            nominal_start,
        }
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    /// The nominal start an "edit this occurrence only" exception must be keyed by.
    pub fn nominal_start(&self) -> DateTime<Utc> {
        self.nominal_start
    }

    /// Decode an id produced by [`OccurrenceId`]'s `Display`.
    pub fn parse(id: &str) -> Result<Self> {
        id.parse()
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.series_id,
            SEPARATOR,
            self.nominal_start.format(TIMESTAMP_FORMAT)
        )
    }
}

impl FromStr for OccurrenceId {
    type Err = EngineError;

    fn from_str(id: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidOccurrenceId(id.to_string());

        let (series_id, stamp) = id.rsplit_once(SEPARATOR).ok_or_else(invalid)?;
        if series_id.is_empty() {
            return Err(invalid());
        }
        let nominal_start = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
            .map_err(|_| invalid())?
            .and_utc();

        Ok(Self::new(series_id, nominal_start))
    }
}

/// The id string for the occurrence of `series_id` nominally starting at `nominal_start`.
pub fn occurrence_id(series_id: &str, nominal_start: DateTime<Utc>) -> String {
    OccurrenceId::new(series_id, nominal_start).to_string()
}
