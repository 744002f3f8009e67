//! # series-engine
//!
//! Recurring-show expansion for crew scheduling.
//!
//! A show template is a first occurrence plus an optional recurrence rule
//! (`FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;COUNT=10`). For a query window the engine
//! generates the nominal occurrences the rule implies, applies per-occurrence
//! exceptions (edited or cancelled single instances) and returns materialized
//! occurrences with stable ids. The engine is pure: no I/O, no shared state.
//!
//! ## Modules
//!
//! - [`rule`] - rule text ⇄ [`RecurrenceRule`]
//! - [`generator`] - lazy, window-clipped nominal start times
//! - [`resolver`] - merge modified/cancelled exceptions into candidates
//! - [`projector`] - template + exceptions + window → occurrences
//! - [`calendar`] - project a whole workspace into API entries
//! - [`occurrence_id`] - encode/decode stable occurrence ids
//! - [`dst`] - DST gap policies
//! - [`model`], [`window`], [`config`], [`error`]

pub mod calendar;
pub mod config;
pub mod dst;
pub mod error;
pub mod generator;
pub mod model;
pub mod occurrence_id;
pub mod projector;
pub mod resolver;
pub mod rule;
pub mod window;

pub use calendar::{build_calendar, CalendarEntry};
pub use config::{CancelledInstancePolicy, EngineConfig};
pub use dst::DstPolicy;
pub use error::{EngineError, RuleParseError, RuleParseErrorKind};
pub use generator::{generate, OccurrenceGenerator, Occurrences};
pub use model::{
    ExceptionKind, ExceptionRecord, MaterializedOccurrence, OccurrenceOverride, SeriesTemplate,
    Status,
};
pub use occurrence_id::{occurrence_id, OccurrenceId};
pub use projector::{project, SeriesProjector};
pub use resolver::{resolve, ExceptionIndex, ExceptionResolver};
pub use rule::{Frequency, RecurrenceRule, Termination};
pub use window::Window;
