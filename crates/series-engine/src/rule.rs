//! Recurrence rule model -- parses and serializes the compact `KEY=VALUE;...` rule text
//! stored on a series template (e.g., `FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;COUNT=10`).
//!
//! Only the subset the scheduler persists is accepted: FREQ (DAILY, WEEKLY, MONTHLY),
//! INTERVAL, BYDAY (weekly only, plain weekday codes), and at most one of COUNT or UNTIL.
//! Anything else is a [`RuleParseError`] rather than a silently ignored token.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc, Weekday};

use crate::error::{RuleParseError, RuleParseErrorKind};

const UNTIL_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            _ => return None,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a recurring series ends. Exactly one mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    #[default]
    Never,
    /// Inclusive upper bound on occurrence start times.
    Until(DateTime<Utc>),
    /// Absolute cap on occurrences, counted from the series start.
    Count(NonZeroU32),
}

/// A parsed, internally consistent recurrence rule.
///
/// Fields are private so the weekday set can only be non-empty for weekly rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    frequency: Frequency,
    weekdays: Vec<Weekday>,
    interval: NonZeroU32,
    termination: Termination,
}

impl RecurrenceRule {
    pub fn daily() -> Self {
        Self::with_frequency(Frequency::Daily)
    }

    /// Weekly rule on the given weekdays. An empty set means "the weekday of the
    /// series start".
    pub fn weekly(weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        let mut rule = Self::with_frequency(Frequency::Weekly);
        rule.weekdays = normalize_weekdays(weekdays);
        rule
    }

    pub fn monthly() -> Self {
        Self::with_frequency(Frequency::Monthly)
    }

    fn with_frequency(frequency: Frequency) -> Self {
        Self {
            frequency,
            weekdays: Vec::new(),
            interval: NonZeroU32::MIN,
            termination: Termination::Never,
        }
    }

    pub fn every(mut self, interval: NonZeroU32) -> Self {
        self.interval = interval;
        self
    }

    /// Last allowed start, inclusive. Sub-second precision is dropped, as the rule
    /// text only carries whole seconds.
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.termination = Termination::Until(until.trunc_subsecs(0));
        self
    }

    pub fn count(mut self, count: NonZeroU32) -> Self {
        self.termination = Termination::Count(count);
        self
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Explicit weekdays, ordered Monday through Sunday.
    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    /// Explicit weekdays as indices 0-6 with 0 = Sunday.
    pub fn weekday_indices(&self) -> Vec<u8> {
        let mut indices: Vec<u8> = self
            .weekdays
            .iter()
            .map(|d| d.num_days_from_sunday() as u8)
            .collect();
        indices.sort_unstable();
        indices
    }

    pub fn interval(&self) -> u32 {
        self.interval.get()
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }
}

/// Parse optional rule text. `None`, empty or whitespace-only text means a
/// non-recurring series and yields `Ok(None)`.
pub fn parse(text: Option<&str>) -> Result<Option<RecurrenceRule>, RuleParseError> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) => t.parse().map(Some),
    }
}

/// Render a rule in canonical form: `FREQ`, `INTERVAL` (when not 1), `BYDAY`, then
/// `COUNT` or `UNTIL`.
pub fn serialize(rule: &RecurrenceRule) -> String {
    rule.to_string()
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency)?;
        if self.interval.get() != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        if !self.weekdays.is_empty() {
            let codes: Vec<&str> = self.weekdays.iter().map(|d| weekday_code(*d)).collect();
            write!(f, ";BYDAY={}", codes.join(","))?;
        }
        match self.termination {
            Termination::Never => Ok(()),
            Termination::Count(n) => write!(f, ";COUNT={}", n),
            Termination::Until(until) => write!(f, ";UNTIL={}", until.format(UNTIL_FORMAT)),
        }
    }
}

impl FromStr for RecurrenceRule {
    type Err = RuleParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let body = strip_prefix_ignore_case(trimmed, "RRULE:").unwrap_or(trimmed);

        let mut frequency: Option<Frequency> = None;
        let mut interval: Option<NonZeroU32> = None;
        let mut weekdays: Option<(Vec<Weekday>, &str)> = None;
        let mut termination: Option<(Termination, &str)> = None;

        for token in body.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| RuleParseError::new(token, RuleParseErrorKind::MalformedToken))?;
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim().to_ascii_uppercase();

            match key.as_str() {
                "FREQ" => {
                    let freq = Frequency::parse(&value).ok_or_else(|| invalid(token))?;
                    set_once(&mut frequency, freq, token)?;
                }
                "INTERVAL" => {
                    let n = parse_positive(&value, token, RuleParseErrorKind::ZeroInterval)?;
                    set_once(&mut interval, n, token)?;
                }
                "BYDAY" => {
                    let days = parse_weekdays(&value, token)?;
                    set_once(&mut weekdays, (days, token), token)?;
                }
                "COUNT" | "UNTIL" => {
                    if let Some((existing, _)) = termination {
                        let same_key = matches!(
                            (existing, key.as_str()),
                            (Termination::Count(_), "COUNT") | (Termination::Until(_), "UNTIL")
                        );
                        let kind = if same_key {
                            RuleParseErrorKind::DuplicateKey
                        } else {
                            RuleParseErrorKind::ConflictingTermination
                        };
                        return Err(RuleParseError::new(token, kind));
                    }
                    let parsed = if key == "COUNT" {
                        Termination::Count(parse_positive(
                            &value,
                            token,
                            RuleParseErrorKind::ZeroCount,
                        )?)
                    } else {
                        Termination::Until(parse_until(&value).ok_or_else(|| invalid(token))?)
                    };
                    termination = Some((parsed, token));
                }
                _ => return Err(RuleParseError::new(token, RuleParseErrorKind::UnknownKey)),
            }
        }

        let frequency = frequency
            .ok_or_else(|| RuleParseError::new(text, RuleParseErrorKind::MissingFrequency))?;

        let weekdays = match weekdays {
            Some((_, token)) if frequency != Frequency::Weekly => {
                return Err(RuleParseError::new(
                    token,
                    RuleParseErrorKind::WeekdaysRequireWeekly,
                ));
            }
            Some((days, _)) => days,
            None => Vec::new(),
        };

        Ok(Self {
            frequency,
            weekdays,
            interval: interval.unwrap_or(NonZeroU32::MIN),
            termination: termination.map(|(t, _)| t).unwrap_or_default(),
        })
    }
}

pub(crate) fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn parse_weekday_code(code: &str) -> Option<Weekday> {
    Some(match code {
        "MO" => Weekday::Mon,
        "TU" => Weekday::Tue,
        "WE" => Weekday::Wed,
        "TH" => Weekday::Thu,
        "FR" => Weekday::Fri,
        "SA" => Weekday::Sat,
        "SU" => Weekday::Sun,
        _ => return None,
    })
}

fn normalize_weekdays(days: impl IntoIterator<Item = Weekday>) -> Vec<Weekday> {
    let mut days: Vec<Weekday> = days.into_iter().collect();
    days.sort_by_key(|d| d.num_days_from_monday());
    days.dedup();
    days
}

fn parse_weekdays(value: &str, token: &str) -> Result<Vec<Weekday>, RuleParseError> {
    let days = value
        .split(',')
        .map(|code| parse_weekday_code(code.trim()).ok_or_else(|| invalid(token)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize_weekdays(days))
}

fn parse_positive(
    value: &str,
    token: &str,
    zero: RuleParseErrorKind,
) -> Result<NonZeroU32, RuleParseError> {
    let n: u32 = value.parse().map_err(|_| invalid(token))?;
    NonZeroU32::new(n).ok_or_else(|| RuleParseError::new(token, zero))
}

/// Accepts `YYYYMMDDTHHMMSSZ`, the same without `Z` (read as UTC), or a bare
/// `YYYYMMDD` meaning the end of that day.
fn parse_until(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, UNTIL_FORMAT) {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Some(dt.and_utc());
    }
    let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
    Some(date.and_time(end_of_day).and_utc())
}

fn set_once<T>(slot: &mut Option<T>, value: T, token: &str) -> Result<(), RuleParseError> {
    if slot.is_some() {
        return Err(RuleParseError::new(token, RuleParseErrorKind::DuplicateKey));
    }
    *slot = Some(value);
    Ok(())
}

fn invalid(token: &str) -> RuleParseError {
    RuleParseError::new(token, RuleParseErrorKind::InvalidValue)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}
