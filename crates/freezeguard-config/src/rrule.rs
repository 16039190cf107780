//! Recurrence rule grammar
//!
//! A subset of RFC 5545 recurrence rules:
//!
//! ```text
//! DTSTART;TZID=Europe/Berlin:20231104T000000
//! RRULE:FREQ=WEEKLY;INTERVAL=1;BYDAY=SA
//! ```
//!
//! The `DTSTART` line is optional, and a bare `FREQ=...` body is accepted
//! without the `RRULE:` prefix. Lines may be separated by real newlines or a
//! literal `\n` (as happens with single-line workflow inputs).

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Weekday};
use chrono_tz::Tz;
use freezeguard_util::{FreezeError, Result, localize, parse_timezone};
use std::collections::HashSet;
use std::str::FromStr;

/// Content lines a freeze rule may not carry
const UNSUPPORTED_PROPERTIES: [&str; 3] = ["EXDATE", "RDATE", "EXRULE"];

/// How often a rule repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutely,
}

impl Frequency {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "YEARLY" => Ok(Self::Yearly),
            "MONTHLY" => Ok(Self::Monthly),
            "WEEKLY" => Ok(Self::Weekly),
            "DAILY" => Ok(Self::Daily),
            "HOURLY" => Ok(Self::Hourly),
            "MINUTELY" => Ok(Self::Minutely),
            "SECONDLY" => Err(FreezeError::rule("FREQ=SECONDLY is not supported")),
            other => Err(FreezeError::rule(format!("unknown FREQ '{other}'"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yearly => "YEARLY",
            Self::Monthly => "MONTHLY",
            Self::Weekly => "WEEKLY",
            Self::Daily => "DAILY",
            Self::Hourly => "HOURLY",
            Self::Minutely => "MINUTELY",
        }
    }

    /// Periods shorter than a day
    pub fn is_sub_daily(&self) -> bool {
        matches!(self, Self::Hourly | Self::Minutely)
    }
}

/// A `BYDAY` entry such as `SA`, `1MO` or `-1FR`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdaySpec {
    pub weekday: Weekday,
    /// Nth occurrence within the month (or year); negative counts from the end
    pub ordinal: Option<i32>,
}

impl WeekdaySpec {
    pub fn every(weekday: Weekday) -> Self {
        Self {
            weekday,
            ordinal: None,
        }
    }
}

/// A `DTSTART` or `UNTIL` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTime {
    /// No zone information: local time in whatever zone the rule is evaluated in
    Floating(NaiveDateTime),
    /// Trailing `Z`
    Utc(NaiveDateTime),
    /// `TZID=` parameter
    Zoned { tz: Tz, local: NaiveDateTime },
}

impl RuleTime {
    /// Wall-clock time of this value as seen in `tz`
    pub fn to_local(&self, tz: &Tz) -> NaiveDateTime {
        match self {
            RuleTime::Floating(local) => *local,
            RuleTime::Utc(utc) => tz.from_utc_datetime(utc).naive_local(),
            RuleTime::Zoned { tz: source, local } => {
                localize(source, local).with_timezone(tz).naive_local()
            }
        }
    }
}

/// A parsed recurrence rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
    pub until: Option<RuleTime>,
    /// Explicit `DTSTART`; when absent the evaluation instant is used
    pub start: Option<RuleTime>,
    pub by_day: Vec<WeekdaySpec>,
    pub by_month_day: Vec<i32>,
    pub by_month: Vec<u32>,
    pub by_hour: Vec<u32>,
    pub by_minute: Vec<u32>,
    pub by_second: Vec<u32>,
    pub by_set_pos: Vec<i32>,
    pub week_start: Weekday,
}

impl RecurrenceRule {
    fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            count: None,
            until: None,
            start: None,
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
            by_hour: Vec::new(),
            by_minute: Vec::new(),
            by_second: Vec::new(),
            by_set_pos: Vec::new(),
            week_start: Weekday::Mon,
        }
    }

    /// Parse a rule, optionally preceded by a `DTSTART` line. Exception and
    /// extra-date lines are rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let normalized = text.replace("\\n", "\n");
        let mut start = None;
        let mut body = None;

        for line in normalized.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let upper = line.to_ascii_uppercase();
            if upper.starts_with("DTSTART") {
                if start.is_some() {
                    return Err(FreezeError::rule("DTSTART given more than once"));
                }
                start = Some(parse_dtstart(line)?);
            } else if let Some(name) = UNSUPPORTED_PROPERTIES
                .iter()
                .find(|name| upper.starts_with(*name))
            {
                return Err(FreezeError::rule(format!("{name} is not supported")));
            } else if upper.starts_with("RRULE:") || upper.contains("FREQ=") {
                if body.is_some() {
                    return Err(FreezeError::rule("only one RRULE is supported"));
                }
                let rule_body = if upper.starts_with("RRULE:") {
                    &line["RRULE:".len()..]
                } else {
                    line
                };
                body = Some(rule_body.to_string());
            } else {
                return Err(FreezeError::rule(format!("unsupported line '{line}'")));
            }
        }

        let body = body.ok_or_else(|| FreezeError::rule("missing RRULE with FREQ"))?;
        let mut rule = Self::parse_body(&body)?;
        rule.start = start;
        Ok(rule)
    }

    fn parse_body(body: &str) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut parts = Vec::new();
        for part in body.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| FreezeError::rule(format!("expected KEY=VALUE, got '{part}'")))?;
            let key = key.trim().to_ascii_uppercase();
            if !seen.insert(key.clone()) {
                return Err(FreezeError::rule(format!("{key} given more than once")));
            }
            parts.push((key, value.trim().to_string()));
        }

        let frequency = parts
            .iter()
            .find(|(key, _)| key == "FREQ")
            .map(|(_, value)| Frequency::parse(value))
            .transpose()?
            .ok_or_else(|| FreezeError::rule("FREQ is required"))?;

        let mut rule = Self::new(frequency);
        for (key, value) in &parts {
            match key.as_str() {
                "FREQ" => {}
                "INTERVAL" => rule.interval = parse_positive(key, value)?,
                "COUNT" => rule.count = Some(parse_positive(key, value)?),
                "UNTIL" => rule.until = Some(parse_rule_time(value, None)?),
                "BYDAY" => rule.by_day = parse_by_day(value, frequency)?,
                "BYMONTHDAY" => rule.by_month_day = parse_signed_list(key, value, 31)?,
                "BYMONTH" => rule.by_month = parse_list(key, value, 1, 12)?,
                "BYHOUR" => rule.by_hour = parse_list(key, value, 0, 23)?,
                "BYMINUTE" => rule.by_minute = parse_list(key, value, 0, 59)?,
                "BYSECOND" => rule.by_second = parse_list(key, value, 0, 59)?,
                "BYSETPOS" => rule.by_set_pos = parse_signed_list(key, value, 366)?,
                "WKST" => rule.week_start = parse_weekday(value)?,
                "BYYEARDAY" | "BYWEEKNO" | "BYEASTER" => {
                    return Err(FreezeError::rule(format!("{key} is not supported")));
                }
                other => return Err(FreezeError::rule(format!("unknown rule part '{other}'"))),
            }
        }

        if rule.count.is_some() && rule.until.is_some() {
            return Err(FreezeError::rule("COUNT and UNTIL cannot both be set"));
        }

        Ok(rule)
    }
}

impl FromStr for RecurrenceRule {
    type Err = FreezeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_dtstart(line: &str) -> Result<RuleTime> {
    let (head, value) = line
        .split_once(':')
        .ok_or_else(|| FreezeError::rule(format!("malformed DTSTART '{line}'")))?;

    let mut tz = None;
    for param in head.split(';').skip(1) {
        match param.split_once('=') {
            Some((name, zone)) if name.eq_ignore_ascii_case("TZID") => {
                tz = Some(parse_timezone(zone).map_err(|e| FreezeError::rule(e.to_string()))?);
            }
            Some((name, _)) if name.eq_ignore_ascii_case("VALUE") => {}
            _ => return Err(FreezeError::rule(format!("unsupported DTSTART parameter '{param}'"))),
        }
    }

    parse_rule_time(value, tz)
}

fn parse_rule_time(value: &str, tz: Option<Tz>) -> Result<RuleTime> {
    let value = value.trim();
    let (text, is_utc) = match value.strip_suffix(['Z', 'z']) {
        Some(rest) => (rest, true),
        None => (value, false),
    };

    let naive = NaiveDateTime::parse_from_str(text, "%Y%m%dT%H%M%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y%m%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            FreezeError::rule(format!(
                "invalid date-time '{value}', expected YYYYMMDD or YYYYMMDDTHHMMSS"
            ))
        })?;

    match (tz, is_utc) {
        (Some(_), true) => Err(FreezeError::rule(format!(
            "'{value}' cannot combine TZID with a UTC 'Z' suffix"
        ))),
        (Some(tz), false) => Ok(RuleTime::Zoned { tz, local: naive }),
        (None, true) => Ok(RuleTime::Utc(naive)),
        (None, false) => Ok(RuleTime::Floating(naive)),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(FreezeError::rule(format!(
            "{key} must be a positive integer, got '{value}'"
        ))),
    }
}

fn parse_list(key: &str, value: &str, min: u32, max: u32) -> Result<Vec<u32>> {
    value
        .split(',')
        .map(|item| match item.trim().parse::<u32>() {
            Ok(n) if (min..=max).contains(&n) => Ok(n),
            _ => Err(FreezeError::rule(format!(
                "{key} values must be in {min}..={max}, got '{item}'"
            ))),
        })
        .collect()
}

fn parse_signed_list(key: &str, value: &str, max: i32) -> Result<Vec<i32>> {
    value
        .split(',')
        .map(|item| match item.trim().parse::<i32>() {
            Ok(n) if n != 0 && n.abs() <= max => Ok(n),
            _ => Err(FreezeError::rule(format!(
                "{key} values must be in ±1..={max}, got '{item}'"
            ))),
        })
        .collect()
}

fn parse_weekday(code: &str) -> Result<Weekday> {
    match code.trim().to_ascii_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        other => Err(FreezeError::rule(format!("unknown weekday '{other}'"))),
    }
}

fn parse_by_day(value: &str, frequency: Frequency) -> Result<Vec<WeekdaySpec>> {
    value
        .split(',')
        .map(|item| {
            let item = item.trim();
            if item.len() < 2 || !item.is_char_boundary(item.len() - 2) {
                return Err(FreezeError::rule(format!("invalid BYDAY entry '{item}'")));
            }
            let (prefix, code) = item.split_at(item.len() - 2);
            let weekday = parse_weekday(code)?;
            if prefix.is_empty() {
                return Ok(WeekdaySpec::every(weekday));
            }

            let ordinal = match prefix.parse::<i32>() {
                Ok(n) if n != 0 && n.abs() <= 53 => n,
                _ => return Err(FreezeError::rule(format!("invalid BYDAY ordinal in '{item}'"))),
            };
            if !matches!(frequency, Frequency::Monthly | Frequency::Yearly) {
                return Err(FreezeError::rule(format!(
                    "BYDAY ordinal '{item}' is only valid with FREQ=MONTHLY or FREQ=YEARLY"
                )));
            }
            Ok(WeekdaySpec {
                weekday,
                ordinal: Some(ordinal),
            })
        })
        .collect()
}
