//! Tests for exception resolution over explicit candidate lists.

use chrono::{DateTime, TimeZone, Utc};
use series_engine::{
    resolve, ExceptionIndex, ExceptionRecord, ExceptionResolver, OccurrenceOverride,
    SeriesTemplate, Status,
};

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn newsroom() -> SeriesTemplate {
    SeriesTemplate {
        id: "newsroom".to_string(),
        title: "Newsroom".to_string(),
        description: None,
        first_occurrence_start: utc(2025, 5, 1, 18),
        first_occurrence_end: utc(2025, 5, 1, 19),
        recurrence_rule: Some("FREQ=DAILY".to_string()),
        status: Status::default(),
        color: None,
        notes: Some("Control room B".to_string()),
        workspace_id: "ws-news".to_string(),
        timezone: None,
    }
}

#[test]
fn output_follows_candidate_order() {
    let template = newsroom();
    let candidates = vec![utc(2025, 5, 1, 18), utc(2025, 5, 2, 18), utc(2025, 5, 3, 18)];

    let result = resolve(candidates.clone(), &ExceptionIndex::default(), &template);

    let starts: Vec<_> = result.iter().map(|o| o.start).collect();
    assert_eq!(starts, candidates);
    assert!(result.iter().all(|o| o.notes.as_deref() == Some("Control room B")));
}

#[test]
fn every_override_field_is_applied() {
    let template = newsroom();
    let target = utc(2025, 5, 2, 18);
    let records = vec![ExceptionRecord::modified(
        "newsroom",
        target,
        OccurrenceOverride {
            title: Some("Newsroom (extended)".to_string()),
            description: Some("Budget night".to_string()),
            start: Some(utc(2025, 5, 2, 17)),
            end: Some(utc(2025, 5, 2, 20)),
            status: Some(Status::new("confirmed")),
            notes: Some("Control room A".to_string()),
            color: Some("#aa0000".to_string()),
        },
    )];
    let index = ExceptionIndex::build("newsroom", &records);

    let result = resolve(vec![target], &index, &template);

    assert_eq!(result.len(), 1);
    let o = &result[0];
    assert_eq!(o.title, "Newsroom (extended)");
    assert_eq!(o.description.as_deref(), Some("Budget night"));
    assert_eq!(o.start, utc(2025, 5, 2, 17));
    assert_eq!(o.end, utc(2025, 5, 2, 20));
    assert_eq!(o.status.as_str(), "confirmed");
    assert_eq!(o.notes.as_deref(), Some("Control room A"));
    assert_eq!(o.color.as_deref(), Some("#aa0000"));
    assert_eq!(o.nominal_start, target);
    assert_eq!(o.occurrence_id, "newsroom:20250502T180000Z");
    assert!(o.is_exception);
}

#[test]
fn matching_uses_nominal_start_not_overridden_start() {
    let template = newsroom();
    // Exception moved the May 2 show to May 3 at 18:00 -- the May 3 nominal
    // occurrence must not be affected by it.
    let records = vec![ExceptionRecord::modified(
        "newsroom",
        utc(2025, 5, 2, 18),
        OccurrenceOverride {
            start: Some(utc(2025, 5, 3, 18)),
            ..Default::default()
        },
    )];
    let index = ExceptionIndex::build("newsroom", &records);

    let result = resolve(vec![utc(2025, 5, 3, 18)], &index, &template);
    assert_eq!(result.len(), 1);
    assert!(!result[0].is_exception);
}

#[test]
fn index_drops_foreign_records_and_keeps_last_duplicate() {
    let target = utc(2025, 5, 4, 18);
    let records = vec![
        ExceptionRecord::cancelled("newsroom", target),
        ExceptionRecord::cancelled("weather", target),
        ExceptionRecord::modified("newsroom", target, OccurrenceOverride::default()),
    ];

    let index = ExceptionIndex::build("newsroom", &records);

    assert_eq!(index.len(), 1);
    assert_eq!(index.get(target), Some(&records[2]));
    assert!(index.get(utc(2025, 5, 5, 18)).is_none());
}

#[test]
fn non_recurring_resolver_uses_series_id() {
    let mut template = newsroom();
    template.recurrence_rule = None;

    let result = ExceptionResolver::new(&template)
        .recurring(false)
        .resolve(vec![template.first_occurrence_start], &ExceptionIndex::default());

    assert_eq!(result[0].occurrence_id, "newsroom");
    assert!(!result[0].is_recurrence);
}
