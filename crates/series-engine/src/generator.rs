//! Occurrence generation -- turns a recurrence rule and a series start into the lazy,
//! ascending sequence of nominal start times inside a query window.
//!
//! Candidates are stepped in the series' local wall-clock time and converted to UTC,
//! so a 09:00 show stays at 09:00 local across DST transitions. COUNT is always
//! measured from the series start, never from the window start.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

use crate::dst::{self, DstPolicy};
use crate::rule::{Frequency, RecurrenceRule, Termination};
use crate::window::Window;

/// Default bound on candidates scanned per generator run.
pub const DEFAULT_MAX_CANDIDATES: usize = 100_000;

/// Configures how a series is expanded: time zone, DST policy and scan bound.
#[derive(Debug, Clone)]
pub struct OccurrenceGenerator {
    rule: Option<RecurrenceRule>,
    series_start: DateTime<Utc>,
    timezone: Tz,
    dst_policy: DstPolicy,
    max_candidates: usize,
}

impl OccurrenceGenerator {
    /// A generator for `rule` anchored at `series_start`, expanding in UTC.
    pub fn new(rule: Option<RecurrenceRule>, series_start: DateTime<Utc>) -> Self {
        Self {
            rule,
            series_start,
            timezone: Tz::UTC,
            dst_policy: DstPolicy::default(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    pub fn in_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_dst_policy(mut self, policy: DstPolicy) -> Self {
        self.dst_policy = policy;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Start a fresh, independent pass over the occurrences inside `window`.
    ///
    /// Each call returns a new iterator; no state is shared between passes.
    pub fn occurrences(&self, window: Window) -> Occurrences {
        if window.is_empty() {
            return Occurrences {
                state: State::Done,
            };
        }

        let state = match &self.rule {
            None => State::Single(Some(self.series_start).filter(|s| window.contains(*s))),
            Some(rule) => State::Recurring(Box::new(Cursor::new(self, rule, window))),
        };
        Occurrences { state }
    }
}

/// Nominal start times of `rule` from `series_start`, clipped to `window`, in UTC.
///
/// With no rule the sequence is the series start alone, if it falls in the window.
/// Only start times are produced; end times come from the series duration when
/// [`ExceptionResolver`](crate::resolver::ExceptionResolver) materializes them.
pub fn generate(
    rule: Option<&RecurrenceRule>,
    series_start: DateTime<Utc>,
    window: Window,
) -> Occurrences {
    OccurrenceGenerator::new(rule.cloned(), series_start).occurrences(window)
}

/// Lazy iterator over nominal occurrence start times, strictly ascending.
#[derive(Debug)]
pub struct Occurrences {
    state: State,
}

#[derive(Debug)]
enum State {
    Single(Option<DateTime<Utc>>),
    Recurring(Box<Cursor>),
    Done,
}

impl Iterator for Occurrences {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match &mut self.state {
            State::Single(slot) => slot.take(),
            State::Recurring(cursor) => cursor.next_in_window(),
            State::Done => None,
        };
        if next.is_none() {
            self.state = State::Done;
        }
        next
    }
}

#[derive(Debug)]
struct Cursor {
    frequency: Frequency,
    interval: u64,
    weekdays: Vec<Weekday>,
    termination: Termination,
    timezone: Tz,
    dst_policy: DstPolicy,
    series_start: DateTime<Utc>,
    first_date: NaiveDate,
    time: NaiveTime,
    /// Date periods are measured from: the first day for daily, the Monday of the first
    /// week for weekly, the first of the first month for monthly.
    anchor: NaiveDate,
    window: Window,
    period: u64,
    slot: usize,
    produced: u32,
    scanned: usize,
    max_candidates: usize,
}

impl Cursor {
    fn new(generator: &OccurrenceGenerator, rule: &RecurrenceRule, window: Window) -> Self {
        let local_start = generator
            .series_start
            .with_timezone(&generator.timezone)
            .naive_local();
        let first_date = local_start.date();

        let weekdays = if rule.weekdays().is_empty() {
            vec![first_date.weekday()]
        } else {
            rule.weekdays().to_vec()
        };

        let anchor = match rule.frequency() {
            Frequency::Daily => first_date,
            Frequency::Weekly => first_date
                .checked_sub_days(Days::new(u64::from(
                    first_date.weekday().num_days_from_monday(),
                )))
                .unwrap_or(first_date),
            Frequency::Monthly => first_date.with_day(1).unwrap_or(first_date),
        };

        let mut cursor = Self {
            frequency: rule.frequency(),
            interval: u64::from(rule.interval()),
            weekdays,
            termination: rule.termination(),
            timezone: generator.timezone,
            dst_policy: generator.dst_policy,
            series_start: generator.series_start,
            first_date,
            time: local_start.time(),
            anchor,
            window,
            period: 0,
            slot: 0,
            produced: 0,
            scanned: 0,
            max_candidates: generator.max_candidates,
        };
        cursor.fast_forward();
        cursor
    }

    /// Skip whole periods that end before the window, when nothing needs counting.
    fn fast_forward(&mut self) {
        if matches!(self.termination, Termination::Count(_)) || self.window.start <= self.series_start
        {
            return;
        }

        // One day of slack covers the local/UTC date difference.
        let target = self
            .window
            .start
            .with_timezone(&self.timezone)
            .date_naive()
            .pred_opt()
            .unwrap_or(self.anchor);

        let whole_periods = match self.frequency {
            Frequency::Daily => (target - self.anchor).num_days(),
            Frequency::Weekly => (target - self.anchor).num_days() / 7,
            Frequency::Monthly => {
                let months = |d: NaiveDate| i64::from(d.year()) * 12 + i64::from(d.month0());
                months(target) - months(self.anchor) - 1
            }
        };

        if whole_periods > 0 {
            self.period = whole_periods as u64 / self.interval;
        }
    }

    /// Next local date produced by the rule, ignoring window and termination.
    fn next_date(&mut self) -> Option<NaiveDate> {
        match self.frequency {
            Frequency::Daily => {
                let offset = self.period.checked_mul(self.interval)?;
                self.period += 1;
                self.anchor.checked_add_days(Days::new(offset))
            }
            Frequency::Weekly => loop {
                if self.slot == self.weekdays.len() {
                    self.slot = 0;
                    self.period += 1;
                }
                let weeks = self.period.checked_mul(self.interval)?;
                let week_start = self.anchor.checked_add_days(Days::new(weeks.checked_mul(7)?))?;
                let day = self.weekdays[self.slot];
                self.slot += 1;
                let date = week_start
                    .checked_add_days(Days::new(u64::from(day.num_days_from_monday())))?;
                if date >= self.first_date {
                    return Some(date);
                }
            },
            Frequency::Monthly => loop {
                let months = u32::try_from(self.period.checked_mul(self.interval)?).ok()?;
                self.period += 1;
                let month_start = self.anchor.checked_add_months(Months::new(months))?;
                // Months without the series' day of month are skipped, not clamped.
                if let Some(date) = month_start.with_day(self.first_date.day()) {
                    return Some(date);
                }
                self.scanned += 1;
                if self.scanned >= self.max_candidates {
                    return None;
                }
            },
        }
    }

    fn next_in_window(&mut self) -> Option<DateTime<Utc>> {
        loop {
            if self.scanned >= self.max_candidates {
                tracing::warn!(
                    max_candidates = self.max_candidates,
                    "occurrence scan bound reached; truncating expansion"
                );
                return None;
            }
            let date = self.next_date()?;
            self.scanned += 1;

            let start = if date == self.first_date {
                self.series_start
            } else {
                match dst::resolve_local(&self.timezone, date.and_time(self.time), self.dst_policy)
                {
                    Some(start) => start,
                    None => {
                        tracing::trace!(%date, "skipping occurrence in DST gap");
                        continue;
                    }
                }
            };

            match self.termination {
                Termination::Count(cap) if self.produced >= cap.get() => return None,
                Termination::Until(until) if start > until => return None,
                _ => {}
            }
            self.produced += 1;

            if start >= self.window.end {
                return None;
            }
            if start >= self.window.start {
                return Some(start);
            }
        }
    }
}
