//! Cross-check of the generator against the `rrule` crate (RFC 5545 reference behavior).
//!
//! Every vector is expanded twice: once through `series_engine::generate` with a wide
//! window, once through `rrule::RRuleSet` from the same serialized rule. The vectors
//! keep to the subset both agree on by definition (series start matches the rule).

use chrono::{DateTime, NaiveDateTime, Utc};
use rrule::RRuleSet;
use series_engine::{generate, RecurrenceRule, Window};

const LIMIT: u16 = 60;

fn parse_start(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .unwrap()
        .and_utc()
}

fn via_engine(rule_text: &str, dtstart: &str) -> Vec<DateTime<Utc>> {
    let rule: RecurrenceRule = rule_text.parse().expect("engine should parse rule");
    let start = parse_start(dtstart);
    let window = Window::new(start, parse_start("2040-01-01T00:00:00"));
    generate(Some(&rule), start, window)
        .take(LIMIT as usize)
        .collect()
}

fn via_rrule(rule_text: &str, dtstart: &str) -> Vec<DateTime<Utc>> {
    // Round-trip through the engine's serializer so both sides see the same text.
    let canonical = rule_text.parse::<RecurrenceRule>().unwrap().to_string();
    let dtstart_ical = dtstart.replace(['-', ':'], "");
    let text = format!("DTSTART;TZID=UTC:{}\nRRULE:{}", dtstart_ical, canonical);

    let set: RRuleSet = text.parse().expect("rrule crate should parse rule");
    set.all(LIMIT)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .collect()
}

fn assert_agree(rule_text: &str, dtstart: &str) {
    let ours = via_engine(rule_text, dtstart);
    let reference = via_rrule(rule_text, dtstart);
    assert!(!ours.is_empty(), "{rule_text} from {dtstart} produced nothing");
    assert_eq!(ours, reference, "{rule_text} from {dtstart}");
}

#[test]
fn daily_count() {
    assert_agree("FREQ=DAILY;COUNT=10", "2026-03-01T09:00:00");
}

#[test]
fn daily_interval_until() {
    assert_agree(
        "FREQ=DAILY;INTERVAL=3;UNTIL=20260415T090000Z",
        "2026-03-01T09:00:00",
    );
}

#[test]
fn weekly_weekdays_count() {
    // 2026-03-02 is a Monday.
    assert_agree("FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;COUNT=23", "2026-03-02T06:30:00");
}

#[test]
fn weekly_default_weekday() {
    assert_agree("FREQ=WEEKLY;COUNT=12", "2026-01-08T20:00:00");
}

#[test]
fn biweekly_weekend() {
    // 2026-01-03 is a Saturday.
    assert_agree(
        "FREQ=WEEKLY;INTERVAL=2;BYDAY=SA,SU;UNTIL=20260601T000000Z",
        "2026-01-03T11:00:00",
    );
}

#[test]
fn monthly_on_the_31st() {
    assert_agree("FREQ=MONTHLY;COUNT=14", "2026-01-31T18:00:00");
}

#[test]
fn quarterly() {
    assert_agree("FREQ=MONTHLY;INTERVAL=3;COUNT=8", "2025-11-30T12:00:00");
}
