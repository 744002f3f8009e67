//! Error types for series-engine operations.

use std::fmt;

use thiserror::Error;

/// Why a recurrence rule fragment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleParseErrorKind {
    /// The rule has no `FREQ=` part.
    MissingFrequency,
    /// A `KEY=VALUE` token was not of that shape.
    MalformedToken,
    /// The key is not one of FREQ, INTERVAL, BYDAY, COUNT, UNTIL.
    UnknownKey,
    /// The same key appeared twice.
    DuplicateKey,
    /// The value could not be parsed for its key.
    InvalidValue,
    /// BYDAY was given with a frequency other than WEEKLY.
    WeekdaysRequireWeekly,
    /// Both COUNT and UNTIL were given.
    ConflictingTermination,
    /// COUNT=0.
    ZeroCount,
    /// INTERVAL=0.
    ZeroInterval,
}

impl fmt::Display for RuleParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::MissingFrequency => "missing FREQ",
            Self::MalformedToken => "expected KEY=VALUE",
            Self::UnknownKey => "unknown key",
            Self::DuplicateKey => "duplicate key",
            Self::InvalidValue => "invalid value",
            Self::WeekdaysRequireWeekly => "BYDAY is only allowed with FREQ=WEEKLY",
            Self::ConflictingTermination => "COUNT and UNTIL are mutually exclusive",
            Self::ZeroCount => "COUNT must be at least 1",
            Self::ZeroInterval => "INTERVAL must be at least 1",
        };
        f.write_str(msg)
    }
}

/// A recurrence rule string that could not be parsed.
///
/// Carries the offending fragment verbatim so the API layer can report it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid recurrence rule at `{fragment}`: {kind}")]
pub struct RuleParseError {
    pub fragment: String,
    pub kind: RuleParseErrorKind,
}

impl RuleParseError {
    pub(crate) fn new(fragment: impl Into<String>, kind: RuleParseErrorKind) -> Self {
        Self {
            fragment: fragment.into(),
            kind,
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    InvalidRule(#[from] RuleParseError),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid template {series_id}: {reason}")]
    InvalidTemplate { series_id: String, reason: String },

    #[error("Invalid occurrence id: {0}")]
    InvalidOccurrenceId(String),

    #[error("Series {series_id}: {source}")]
    Series {
        series_id: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Attach the owning series id, unless the error already names it.
    pub(crate) fn in_series(self, series_id: &str) -> Self {
        match self {
            err @ (Self::Series { .. } | Self::InvalidTemplate { .. }) => err,
            other => Self::Series {
                series_id: series_id.to_string(),
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
