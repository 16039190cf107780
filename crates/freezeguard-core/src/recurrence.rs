//! Recurring freeze windows
//!
//! A recurring window is active when the current instant falls inside
//! `[occurrence, occurrence + duration)` for the most recent occurrence at or
//! before it. Occurrences are never generated as an open-ended forward
//! sequence. The search starts at the period containing the current instant
//! and steps back one interval-aligned rule period at a time, expanding only
//! that period's candidates, until it finds an occurrence, reaches the
//! period holding the rule start, or hits the period limit.
//!
//! `COUNT` rules also need the occurrence's ordinal. When every period holds
//! the same number of occurrences the ordinal is computed from the period
//! index. Other `COUNT` rules are walked forward from the start.
//!
//! Everything here works on naive local time in the configured zone. Zones
//! are attached again only when reporting the active span, so across a DST
//! change the span is measured in wall-clock minutes, not elapsed minutes.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use chrono_tz::Tz;
use freezeguard_config::{Frequency, RecurrenceRule, WeekdaySpec};
use freezeguard_util::localize;
use tracing::{debug, warn};

use crate::{EvaluationResult, WindowType};

/// Upper bound on rule periods examined by one search
pub const MAX_SEARCH_PERIODS: usize = 100_000;

/// Something that can name its latest occurrence at or before an instant
pub trait RecurrenceSchedule {
    fn most_recent_at_or_before(&self, at: NaiveDateTime) -> Option<NaiveDateTime>;
}

/// Half-open span `[start, end)` covered by one rule period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Period {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// A recurrence rule anchored at its start, in naive local time
#[derive(Debug, Clone)]
pub struct LocalSchedule<'a> {
    rule: &'a RecurrenceRule,
    start: NaiveDateTime,
    until: Option<NaiveDateTime>,
    months: Vec<u32>,
    month_days: Vec<i32>,
    weekdays: Vec<WeekdaySpec>,
}

impl<'a> LocalSchedule<'a> {
    /// Anchor `rule` in `tz`. Without an explicit `DTSTART` the rule starts
    /// at `default_start`. Starts are truncated to whole seconds.
    pub fn new(rule: &'a RecurrenceRule, tz: &Tz, default_start: NaiveDateTime) -> Self {
        let start = rule.start.map(|s| s.to_local(tz)).unwrap_or(default_start);
        let start = start.with_nanosecond(0).unwrap_or(start);
        let until = rule.until.map(|u| u.to_local(tz));

        // Date filters missing from the rule are inherited from the start
        let mut months = rule.by_month.clone();
        let mut month_days = rule.by_month_day.clone();
        let mut weekdays = rule.by_day.clone();
        if month_days.is_empty() && weekdays.is_empty() {
            match rule.frequency {
                Frequency::Yearly => {
                    if months.is_empty() {
                        months.push(start.month());
                    }
                    month_days.push(start.day() as i32);
                }
                Frequency::Monthly => month_days.push(start.day() as i32),
                Frequency::Weekly => weekdays.push(WeekdaySpec::every(start.weekday())),
                _ => {}
            }
        }

        Self {
            rule,
            start,
            until,
            months,
            month_days,
            weekdays,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Index of the period containing `t`, counted from the start's period
    fn period_index(&self, t: NaiveDateTime) -> i64 {
        let s = self.start;
        match self.rule.frequency {
            Frequency::Yearly => i64::from(t.year() - s.year()),
            Frequency::Monthly => {
                i64::from(t.year() - s.year()) * 12 + i64::from(t.month()) - i64::from(s.month())
            }
            Frequency::Weekly => {
                let weeks = self.week_start(t.date()) - self.week_start(s.date());
                weeks.num_days() / 7
            }
            Frequency::Daily => (t.date() - s.date()).num_days(),
            Frequency::Hourly => (truncate_to_hour(t) - truncate_to_hour(s)).num_hours(),
            Frequency::Minutely => (truncate_to_minute(t) - truncate_to_minute(s)).num_minutes(),
        }
    }

    /// Latest period at or before `t` that the interval makes active
    fn active_index_at_or_before(&self, t: NaiveDateTime) -> Option<i64> {
        let index = self.period_index(t);
        if index < 0 {
            return None;
        }
        Some(index - index.rem_euclid(i64::from(self.rule.interval)))
    }

    fn period(&self, index: i64) -> Option<Period> {
        let s = self.start;
        let (start, end) = match self.rule.frequency {
            Frequency::Yearly => {
                let year = i32::try_from(i64::from(s.year()) + index).ok()?;
                (
                    midnight(NaiveDate::from_ymd_opt(year, 1, 1)?),
                    midnight(NaiveDate::from_ymd_opt(year + 1, 1, 1)?),
                )
            }
            Frequency::Monthly => {
                let first = month_offset(s.date(), index)?;
                (midnight(first), midnight(month_offset(first, 1)?))
            }
            Frequency::Weekly => {
                let origin = midnight(self.week_start(s.date()));
                let start = origin.checked_add_signed(Duration::days(7 * index))?;
                (start, start.checked_add_signed(Duration::days(7))?)
            }
            Frequency::Daily => {
                let start = midnight(s.date()).checked_add_signed(Duration::days(index))?;
                (start, start.checked_add_signed(Duration::days(1))?)
            }
            Frequency::Hourly => {
                let start = truncate_to_hour(s).checked_add_signed(Duration::hours(index))?;
                (start, start.checked_add_signed(Duration::hours(1))?)
            }
            Frequency::Minutely => {
                let start = truncate_to_minute(s).checked_add_signed(Duration::minutes(index))?;
                (start, start.checked_add_signed(Duration::minutes(1))?)
            }
        };
        Some(Period { start, end })
    }

    fn week_start(&self, date: NaiveDate) -> NaiveDate {
        let offset = (date.weekday().num_days_from_monday() + 7
            - self.rule.week_start.num_days_from_monday())
            % 7;
        date - Duration::days(i64::from(offset))
    }

    /// Every occurrence inside `period`, sorted, after `BYSETPOS`
    fn expand(&self, period: &Period) -> Vec<NaiveDateTime> {
        let times = self.times_in(period);
        let mut candidates = Vec::new();
        if times.is_empty() {
            return candidates;
        }

        let mut day = period.start.date();
        while midnight(day) < period.end {
            if self.day_matches(day) {
                for time in &times {
                    let candidate = day.and_time(*time);
                    if candidate >= period.start && candidate < period.end {
                        candidates.push(candidate);
                    }
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        candidates.sort();
        candidates.dedup();
        self.apply_set_pos(candidates)
    }

    fn times_in(&self, period: &Period) -> Vec<NaiveTime> {
        let rule = self.rule;

        let hours = if rule.frequency.is_sub_daily() {
            select_fixed(period.start.hour(), &rule.by_hour)
        } else if rule.by_hour.is_empty() {
            vec![self.start.hour()]
        } else {
            rule.by_hour.clone()
        };

        let minutes = if rule.frequency == Frequency::Minutely {
            select_fixed(period.start.minute(), &rule.by_minute)
        } else if rule.by_minute.is_empty() {
            vec![self.start.minute()]
        } else {
            rule.by_minute.clone()
        };

        let seconds = if rule.by_second.is_empty() {
            vec![self.start.second()]
        } else {
            rule.by_second.clone()
        };

        let mut times = Vec::new();
        for &h in &hours {
            for &m in &minutes {
                for &s in &seconds {
                    if let Some(time) = NaiveTime::from_hms_opt(h, m, s) {
                        times.push(time);
                    }
                }
            }
        }
        times.sort();
        times
    }

    fn day_matches(&self, day: NaiveDate) -> bool {
        if !self.months.is_empty() && !self.months.contains(&day.month()) {
            return false;
        }

        if !self.month_days.is_empty() {
            let length = days_in_month(day);
            let dom = day.day() as i32;
            let matched = self
                .month_days
                .iter()
                .any(|&md| if md > 0 { dom == md } else { dom == length + md + 1 });
            if !matched {
                return false;
            }
        }

        if !self.weekdays.is_empty()
            && !self.weekdays.iter().any(|spec| self.weekday_matches(spec, day))
        {
            return false;
        }

        true
    }

    fn weekday_matches(&self, spec: &WeekdaySpec, day: NaiveDate) -> bool {
        if day.weekday() != spec.weekday {
            return false;
        }
        let Some(n) = spec.ordinal else {
            return true;
        };

        // Yearly rules without BYMONTH count weekdays through the whole year
        let by_year = self.rule.frequency == Frequency::Yearly && self.rule.by_month.is_empty();
        let (position, length) = if by_year {
            (day.ordinal() as i32, days_in_year(day))
        } else {
            (day.day() as i32, days_in_month(day))
        };

        if n > 0 {
            (position - 1) / 7 + 1 == n
        } else {
            (length - position) / 7 + 1 == -n
        }
    }

    fn apply_set_pos(&self, candidates: Vec<NaiveDateTime>) -> Vec<NaiveDateTime> {
        if self.rule.by_set_pos.is_empty() {
            return candidates;
        }

        let len = candidates.len() as i32;
        let mut selected: Vec<NaiveDateTime> = self
            .rule
            .by_set_pos
            .iter()
            .filter_map(|&pos| {
                let index = if pos > 0 { pos - 1 } else { len + pos };
                (0..len).contains(&index).then(|| candidates[index as usize])
            })
            .collect();
        selected.sort();
        selected.dedup();
        selected
    }

    /// Every occurrence of the period at `index`, none before the start
    fn occurrences_in(&self, index: i64) -> Option<Vec<NaiveDateTime>> {
        let period = self.period(index)?;
        let mut occurrences = self.expand(&period);
        occurrences.retain(|occurrence| *occurrence >= self.start);
        Some(occurrences)
    }

    /// True when every period after the first yields the same number of
    /// occurrences, so an occurrence's ordinal follows from its period index
    fn is_uniform(&self) -> bool {
        let rule = self.rule;
        if !self.months.is_empty() || !self.month_days.is_empty() || !rule.by_set_pos.is_empty() {
            return false;
        }
        match rule.frequency {
            Frequency::Yearly | Frequency::Monthly => false,
            Frequency::Weekly => self.weekdays.iter().all(|spec| spec.ordinal.is_none()),
            Frequency::Daily => self.weekdays.is_empty(),
            Frequency::Hourly => self.weekdays.is_empty() && rule.by_hour.is_empty(),
            Frequency::Minutely => {
                self.weekdays.is_empty() && rule.by_hour.is_empty() && rule.by_minute.is_empty()
            }
        }
    }

    /// Latest occurrence at or before `limit`, stepping back one active
    /// period at a time
    fn search_backward(&self, limit: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut cursor = limit;
        for step in 0..MAX_SEARCH_PERIODS {
            let index = self.active_index_at_or_before(cursor)?;
            let period = self.period(index)?;

            let found = self
                .expand(&period)
                .into_iter()
                .rev()
                .find(|candidate| *candidate >= self.start && *candidate <= limit);
            if let Some(occurrence) = found {
                debug!(step, %occurrence, "Found most recent occurrence");
                return Some(occurrence);
            }
            if index == 0 {
                return None;
            }

            // A sub-daily period on a rejected day: skip the rest of that day
            let step_from = if self.rule.frequency.is_sub_daily()
                && !self.day_matches(period.start.date())
            {
                midnight(period.start.date())
            } else {
                period.start
            };
            cursor = step_from.checked_sub_signed(Duration::seconds(1))?;
        }

        warn!(
            periods = MAX_SEARCH_PERIODS,
            "Recurrence search stopped at its period limit"
        );
        None
    }

    /// `COUNT` rules: the latest occurrence at or before `limit` that is
    /// still among the first `count`
    fn count_limited(&self, limit: NaiveDateTime, count: u32) -> Option<NaiveDateTime> {
        if !self.is_uniform() {
            return self.scan_forward(limit, count);
        }

        let step = i64::from(self.rule.interval);
        let first = self.occurrences_in(0)?;
        let per_period = self.occurrences_in(step)?.len() as i64;
        if per_period == 0 {
            return self.scan_forward(limit, count);
        }

        let latest = self.search_backward(limit)?;
        let index = self.active_index_at_or_before(latest)?;
        let position = self
            .occurrences_in(index)?
            .iter()
            .position(|occurrence| *occurrence == latest)? as i64
            + 1;
        let ordinal = if index == 0 {
            position
        } else {
            first.len() as i64 + (index / step - 1) * per_period + position
        };

        let count = i64::from(count);
        if ordinal <= count {
            return Some(latest);
        }

        // The series ended before `limit`: jump to its last occurrence
        let before_rest = first.len() as i64;
        if count <= before_rest {
            return first.get(usize::try_from(count - 1).ok()?).copied();
        }
        let rest = count - before_rest - 1;
        let period_number = rest / per_period + 1;
        let offset = usize::try_from(rest % per_period).ok()?;
        let last = self.occurrences_in(period_number * step)?.get(offset).copied();
        debug!(ordinal, count, last = ?last, "Series ended before the search limit");
        last
    }

    /// Walk forward from the start, never past `count` occurrences or past
    /// `limit`. Gives up at the period limit rather than guess.
    fn scan_forward(&self, limit: NaiveDateTime, count: u32) -> Option<NaiveDateTime> {
        let mut seen = 0u32;
        let mut latest = None;
        let mut index = 0i64;

        for _ in 0..MAX_SEARCH_PERIODS {
            let Some(period) = self.period(index) else {
                return latest;
            };
            if period.start > limit {
                return latest;
            }
            for occurrence in self.expand(&period) {
                if occurrence < self.start {
                    continue;
                }
                if occurrence > limit {
                    return latest;
                }
                latest = Some(occurrence);
                seen += 1;
                if seen >= count {
                    return latest;
                }
            }
            index += i64::from(self.rule.interval);
        }

        warn!(
            periods = MAX_SEARCH_PERIODS,
            count, "Recurrence scan stopped at its period limit"
        );
        None
    }
}

impl RecurrenceSchedule for LocalSchedule<'_> {
    fn most_recent_at_or_before(&self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        let limit = match self.until {
            Some(until) => at.min(until),
            None => at,
        };
        if limit < self.start {
            return None;
        }
        match self.rule.count {
            Some(count) => self.count_limited(limit, count),
            None => self.search_backward(limit),
        }
    }
}

/// Evaluates a recurring window at a given instant
#[derive(Debug, Clone)]
pub struct RecurrenceWindowEvaluator<'a> {
    rule: &'a RecurrenceRule,
    duration: Duration,
}

impl<'a> RecurrenceWindowEvaluator<'a> {
    pub fn new(rule: &'a RecurrenceRule, duration_minutes: u32) -> Self {
        Self {
            rule,
            duration: Duration::minutes(i64::from(duration_minutes)),
        }
    }

    pub fn evaluate(&self, now: &DateTime<Tz>) -> EvaluationResult {
        let tz = now.timezone();
        let now_local = now.naive_local();
        let schedule = LocalSchedule::new(self.rule, &tz, now_local);

        let Some(occurrence) = schedule.most_recent_at_or_before(now_local) else {
            debug!(start = %schedule.start(), "No occurrence at or before now");
            return EvaluationResult::not_frozen();
        };

        let window_end = occurrence + self.duration;
        if now_local >= window_end {
            debug!(%occurrence, %window_end, "Most recent occurrence has ended");
            return EvaluationResult::not_frozen();
        }

        let active_start = localize(&tz, &occurrence);
        let mut active_end = localize(&tz, &window_end);
        if active_end < active_start {
            // Start fell in a DST gap and was pushed past the wall-clock end
            active_end = active_start + self.duration;
        }

        EvaluationResult {
            is_frozen: true,
            window_type: WindowType::Recurring,
            window_name: "Recurring Freeze Window".into(),
            active_start: Some(active_start),
            active_end: Some(active_end),
            reason: "Current time is within recurring freeze window".into(),
        }
    }
}

fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

fn truncate_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_time(NaiveTime::MIN) + Duration::hours(i64::from(t.hour()))
}

fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    truncate_to_hour(t) + Duration::minutes(i64::from(t.minute()))
}

/// The single value a sub-daily period pins, if the filter allows it
fn select_fixed(value: u32, filter: &[u32]) -> Vec<u32> {
    if filter.is_empty() || filter.contains(&value) {
        vec![value]
    } else {
        Vec::new()
    }
}

/// First day of the month `months` after the month containing `date`
fn month_offset(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn days_in_month(day: NaiveDate) -> i32 {
    month_offset(day, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day() as i32)
        .unwrap_or(31)
}

fn days_in_year(day: NaiveDate) -> i32 {
    NaiveDate::from_ymd_opt(day.year(), 12, 31)
        .map(|last| last.ordinal() as i32)
        .unwrap_or(365)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn utc(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn evaluate(rule: &str, minutes: u32, tz: Tz, now: &str) -> EvaluationResult {
        let rule = RecurrenceRule::parse(rule).unwrap();
        RecurrenceWindowEvaluator::new(&rule, minutes).evaluate(&utc(now).with_timezone(&tz))
    }

    fn most_recent(rule: &str, at: NaiveDateTime) -> Option<NaiveDateTime> {
        let rule = RecurrenceRule::parse(rule).unwrap();
        LocalSchedule::new(&rule, &Tz::UTC, at).most_recent_at_or_before(at)
    }

    #[test]
    fn test_weekly_saturday_without_start() {
        let result = evaluate("FREQ=WEEKLY;BYDAY=SA", 1440, Tz::UTC, "2023-11-04T12:00:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.window_type, WindowType::Recurring);
        assert_eq!(result.window_name, "Recurring Freeze Window");
        assert_eq!(result.active_start.unwrap(), utc("2023-11-04T12:00:00Z"));
        assert_eq!(result.active_end.unwrap(), utc("2023-11-05T12:00:00Z"));

        let result = evaluate("FREQ=WEEKLY;BYDAY=SA", 1440, Tz::UTC, "2023-11-03T12:00:00Z");
        assert!(!result.is_frozen);
        assert_eq!(result.window_type, WindowType::None);
        assert!(result.active_start.is_none());
    }

    #[test]
    fn test_implicit_start_drops_subseconds() {
        let result = evaluate("FREQ=DAILY", 10, Tz::UTC, "2023-11-04T12:00:00.750Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-11-04T12:00:00Z"));
    }

    #[test]
    fn test_window_end_is_exclusive() {
        let rule = "DTSTART:20231104T000000Z\nRRULE:FREQ=WEEKLY;BYDAY=SA";
        assert!(evaluate(rule, 1440, Tz::UTC, "2023-11-04T00:00:00Z").is_frozen);
        assert!(evaluate(rule, 1440, Tz::UTC, "2023-11-04T23:59:59Z").is_frozen);
        assert!(!evaluate(rule, 1440, Tz::UTC, "2023-11-05T00:00:00Z").is_frozen);

        let result = evaluate(rule, 1440, Tz::UTC, "2023-11-11T08:00:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-11-11T00:00:00Z"));
    }

    #[test]
    fn test_weekly_interval_skips_weeks() {
        let rule = "DTSTART:20231104T000000Z\nRRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=SA";
        assert!(!evaluate(rule, 1440, Tz::UTC, "2023-11-11T10:00:00Z").is_frozen);
        assert!(evaluate(rule, 1440, Tz::UTC, "2023-11-18T10:00:00Z").is_frozen);
    }

    #[test]
    fn test_zoned_start_in_local_zone() {
        // 09:00 Berlin every weekday, two hour window
        let rule = "DTSTART;TZID=Europe/Berlin:20231201T090000\nRRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR";
        let tz = Tz::Europe__Berlin;
        let result = evaluate(rule, 120, tz, "2023-12-05T09:30:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-12-05T08:00:00Z"));
        assert_eq!(result.active_end.unwrap(), utc("2023-12-05T10:00:00Z"));

        assert!(!evaluate(rule, 120, tz, "2023-12-09T09:30:00Z").is_frozen);
    }

    #[test]
    fn test_monthly_last_friday() {
        let rule = "DTSTART:20230101T170000Z\nRRULE:FREQ=MONTHLY;BYDAY=-1FR";
        let result = evaluate(rule, 180, Tz::UTC, "2023-11-24T18:00:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-11-24T17:00:00Z"));

        assert!(!evaluate(rule, 180, Tz::UTC, "2023-11-17T18:00:00Z").is_frozen);
    }

    #[test]
    fn test_set_pos_selects_last_weekday() {
        let rule = "DTSTART:20230101T090000Z\nRRULE:FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1";
        assert!(evaluate(rule, 60, Tz::UTC, "2023-09-29T09:30:00Z").is_frozen);
        assert!(!evaluate(rule, 60, Tz::UTC, "2023-09-28T09:30:00Z").is_frozen);
        assert_eq!(
            most_recent(rule, naive(2023, 9, 28, 9, 30)),
            Some(naive(2023, 8, 31, 9, 0))
        );
    }

    #[test]
    fn test_yearly_inherits_month_and_day() {
        let rule = "DTSTART:20201224T000000Z\nRRULE:FREQ=YEARLY";
        let result = evaluate(rule, 2880, Tz::UTC, "2023-12-25T10:00:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-12-24T00:00:00Z"));
        assert!(!evaluate(rule, 2880, Tz::UTC, "2023-12-27T10:00:00Z").is_frozen);
    }

    #[test]
    fn test_count_limits_occurrences() {
        let rule = "DTSTART:20231101T000000Z\nRRULE:FREQ=DAILY;COUNT=3";
        assert_eq!(
            most_recent(rule, naive(2023, 11, 10, 0, 0)),
            Some(naive(2023, 11, 3, 0, 0))
        );
        assert!(evaluate(rule, 60, Tz::UTC, "2023-11-03T00:30:00Z").is_frozen);
        assert!(!evaluate(rule, 60, Tz::UTC, "2023-11-04T00:30:00Z").is_frozen);
    }

    #[test]
    fn test_until_limits_occurrences() {
        let rule = "DTSTART:20231101T000000Z\nRRULE:FREQ=DAILY;UNTIL=20231103T000000Z";
        assert_eq!(
            most_recent(rule, naive(2023, 11, 10, 0, 0)),
            Some(naive(2023, 11, 3, 0, 0))
        );
        assert!(evaluate(rule, 60, Tz::UTC, "2023-11-03T00:30:00Z").is_frozen);
        assert!(!evaluate(rule, 60, Tz::UTC, "2023-11-04T00:30:00Z").is_frozen);
    }

    #[test]
    fn test_start_in_future() {
        let rule = "DTSTART:20300101T000000Z\nRRULE:FREQ=DAILY";
        assert_eq!(most_recent(rule, naive(2023, 11, 10, 0, 0)), None);
        assert!(!evaluate(rule, 1440, Tz::UTC, "2023-11-10T00:00:00Z").is_frozen);
    }

    #[test]
    fn test_hourly_with_hour_filter() {
        let rule = "DTSTART:20231101T000000Z\nRRULE:FREQ=HOURLY;BYHOUR=9,17";
        let result = evaluate(rule, 30, Tz::UTC, "2023-11-06T17:10:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-11-06T17:00:00Z"));

        assert_eq!(
            most_recent(rule, naive(2023, 11, 6, 12, 10)),
            Some(naive(2023, 11, 6, 9, 0))
        );
    }

    #[test]
    fn test_minutely_skips_rejected_days() {
        let rule = "DTSTART:20231101T000000Z\nRRULE:FREQ=MINUTELY;INTERVAL=15;BYDAY=MO";
        assert_eq!(
            most_recent(rule, naive(2023, 11, 8, 12, 0)),
            Some(naive(2023, 11, 6, 23, 45))
        );
    }

    #[test]
    fn test_search_limit_gives_up() {
        // February never has a 31st
        let rule = "DTSTART:17000101T000000Z\nRRULE:FREQ=HOURLY;BYMONTH=2;BYMONTHDAY=31";
        assert_eq!(most_recent(rule, naive(2023, 11, 10, 0, 0)), None);
    }

    #[test]
    fn test_large_count_still_active() {
        // Occurrence 117,582 of 200,000
        let rule = "DTSTART:20100101T000000Z\nRRULE:FREQ=HOURLY;COUNT=200000";
        let result = evaluate(rule, 30, Tz::UTC, "2023-06-01T05:10:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-06-01T05:00:00Z"));
        assert_eq!(result.active_end.unwrap(), utc("2023-06-01T05:30:00Z"));

        assert!(!evaluate(rule, 30, Tz::UTC, "2023-06-01T05:40:00Z").is_frozen);
    }

    #[test]
    fn test_large_count_ends_series() {
        let rule = "DTSTART:20100101T000000Z\nRRULE:FREQ=HOURLY;COUNT=150000";
        assert_eq!(
            most_recent(rule, naive(2030, 1, 1, 0, 0)),
            Some(naive(2027, 2, 10, 23, 0))
        );
        assert!(!evaluate(rule, 60, Tz::UTC, "2030-01-01T00:10:00Z").is_frozen);
    }

    #[test]
    fn test_large_count_with_interval_and_days() {
        // Mondays and Fridays every other week, 9:00
        let rule = "DTSTART:20000103T090000Z\nRRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,FR;COUNT=1000";
        // The week of 2010-06-14 is skipped, so the Friday before is
        // occurrence 546
        assert_eq!(
            most_recent(rule, naive(2010, 6, 16, 0, 0)),
            Some(naive(2010, 6, 11, 9, 0))
        );
        // Occurrence 1,000 is a Friday in 2019
        assert_eq!(
            most_recent(rule, naive(2023, 6, 6, 0, 0)),
            Some(naive(2019, 2, 22, 9, 0))
        );
    }

    #[test]
    fn test_count_scan_gives_up_at_limit() {
        // Reaching June one minute at a time needs more periods than allowed
        let rule = "DTSTART:20230101T000000Z\nRRULE:FREQ=MINUTELY;BYHOUR=9;COUNT=100000000";
        assert_eq!(most_recent(rule, naive(2023, 6, 1, 9, 30)), None);
    }

    #[test]
    fn test_dst_fall_back_ambiguous_occurrence() {
        // 01:30 happens twice in New York on 2023-11-05
        let rule = "DTSTART:20230101T013000\nRRULE:FREQ=DAILY";
        let tz = Tz::America__New_York;

        // Second pass through 01:45 (EST)
        let result = evaluate(rule, 60, tz, "2023-11-05T06:45:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-11-05T06:30:00Z"));
        assert_eq!(result.active_end.unwrap(), utc("2023-11-05T07:30:00Z"));

        // First pass through 01:45 (EDT) matches the same wall-clock window,
        // which is reported at its later instant
        let result = evaluate(rule, 60, tz, "2023-11-05T05:45:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-11-05T06:30:00Z"));
    }

    #[test]
    fn test_dst_spring_forward_gap_occurrence() {
        // 02:00 does not exist in New York on 2023-03-12
        let rule = "DTSTART:20230101T020000\nRRULE:FREQ=DAILY";
        let tz = Tz::America__New_York;
        let result = evaluate(rule, 90, tz, "2023-03-12T07:15:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-03-12T07:00:00Z"));
        assert_eq!(result.active_end.unwrap(), utc("2023-03-12T07:30:00Z"));
    }

    #[test]
    fn test_dst_gap_end_never_precedes_start() {
        let rule = "DTSTART:20230101T023000\nRRULE:FREQ=DAILY";
        let tz = Tz::America__New_York;
        let result = evaluate(rule, 45, tz, "2023-03-12T07:00:00Z");
        assert!(result.is_frozen);
        assert_eq!(result.active_start.unwrap(), utc("2023-03-12T07:30:00Z"));
        assert_eq!(result.active_end.unwrap(), utc("2023-03-12T08:15:00Z"));
    }
}
