//! WASM bindings for series-engine.
//!
//! Exposes rule validation, calendar projection and occurrence-id decoding to the
//! JavaScript API server via `wasm-bindgen`. All complex types are passed as JSON
//! strings; templates and exceptions use the same camelCase row shape the storage
//! layer returns.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p series-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/series-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/series_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use series_engine::rule::{self, RecurrenceRule, Termination};
use series_engine::{
    EngineConfig, ExceptionRecord, OccurrenceId, SeriesProjector, SeriesTemplate, Window,
};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleDto {
    frequency: &'static str,
    /// 0 = Sunday
    weekdays: Vec<u8>,
    interval: u32,
    count: Option<u32>,
    until: Option<String>,
    canonical: String,
}

impl From<&RecurrenceRule> for RuleDto {
    fn from(rule: &RecurrenceRule) -> Self {
        let (count, until) = match rule.termination() {
            Termination::Never => (None, None),
            Termination::Count(n) => (Some(n.get()), None),
            Termination::Until(t) => (None, Some(t.to_rfc3339())),
        };
        Self {
            frequency: rule.frequency().as_str(),
            weekdays: rule.weekday_indices(),
            interval: rule.interval(),
            count,
            until,
            canonical: rule::serialize(rule),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OccurrenceIdDto {
    series_id: String,
    nominal_start: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts both RFC 3339 (with offset, e.g., "2026-02-17T14:00:00+00:00") and naive
/// time (e.g., "2026-02-17T14:00:00"), which is interpreted as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, JsValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| JsValue::from_str(&format!("Invalid datetime '{}': {}", s, e)))
}

fn parse_window(start: &str, end: &str) -> Result<Window, JsValue> {
    Ok(Window::new(parse_datetime(start)?, parse_datetime(end)?))
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// An absent or empty config string means the default configuration.
fn parse_config(config_json: Option<String>) -> Result<EngineConfig, JsValue> {
    match config_json.as_deref().map(str::trim) {
        None | Some("") => Ok(EngineConfig::default()),
        Some(json) => from_json(json, "config"),
    }
}

fn engine_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Parse recurrence rule text.
///
/// Returns `"null"` for an empty rule (non-recurring), otherwise a JSON object with
/// `frequency`, `weekdays` (0 = Sunday), `interval`, `count`, `until` and the
/// `canonical` rule text. Malformed rules throw with the offending fragment.
#[wasm_bindgen(js_name = "parseRule")]
pub fn parse_rule(text: &str) -> Result<String, JsValue> {
    let parsed = rule::parse(Some(text)).map_err(engine_error)?;
    to_json(&parsed.as_ref().map(RuleDto::from))
}

/// Project a workspace calendar.
///
/// `templates_json` and `exceptions_json` are JSON arrays of storage rows; the window
/// bounds are ISO 8601 strings. Returns a JSON array of calendar entries sorted by
/// start time.
#[wasm_bindgen(js_name = "buildCalendar")]
pub fn build_calendar(
    templates_json: &str,
    exceptions_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let templates: Vec<SeriesTemplate> = from_json(templates_json, "templates")?;
    let exceptions: Vec<ExceptionRecord> = from_json(exceptions_json, "exceptions")?;
    let window = parse_window(window_start, window_end)?;
    let config = parse_config(config_json)?;

    let entries = series_engine::build_calendar(&templates, &exceptions, window, &config)
        .map_err(engine_error)?;
    to_json(&entries)
}

/// Project a single series template into materialized occurrences.
#[wasm_bindgen(js_name = "projectSeries")]
pub fn project_series(
    template_json: &str,
    exceptions_json: &str,
    window_start: &str,
    window_end: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let template: SeriesTemplate = from_json(template_json, "template")?;
    let exceptions: Vec<ExceptionRecord> = from_json(exceptions_json, "exceptions")?;
    let window = parse_window(window_start, window_end)?;
    let config = parse_config(config_json)?;

    let occurrences = SeriesProjector::new(config)
        .project(&template, &exceptions, window)
        .map_err(engine_error)?;
    to_json(&occurrences)
}

/// Decode an occurrence id into `{seriesId, nominalStart}` so the "edit this
/// occurrence only" path can key its exception record.
#[wasm_bindgen(js_name = "decodeOccurrenceId")]
pub fn decode_occurrence_id(id: &str) -> Result<String, JsValue> {
    let decoded = OccurrenceId::parse(id).map_err(engine_error)?;
    to_json(&OccurrenceIdDto {
        series_id: decoded.series_id().to_string(),
        nominal_start: decoded.nominal_start().to_rfc3339(),
    })
}

/// Encode the occurrence id for a series and nominal start.
#[wasm_bindgen(js_name = "encodeOccurrenceId")]
pub fn encode_occurrence_id(series_id: &str, nominal_start: &str) -> Result<String, JsValue> {
    let start = parse_datetime(nominal_start)?;
    Ok(series_engine::occurrence_id(series_id, start))
}
