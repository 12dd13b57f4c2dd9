use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use serde_json::Value;

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})(?:-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.(\d{1,3}))?)?)?)?Z?$",
    )
    .expect("iso date pattern")
});

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar date and time read from an ISO-like string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParsedDate(NaiveDateTime);

impl ParsedDate {
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Zero-based month, January is `0`.
    pub fn month_index(&self) -> u32 {
        self.0.month0()
    }

    /// One-based month, January is `1`.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    pub fn millisecond(&self) -> u32 {
        self.0.nanosecond() / 1_000_000
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// `YYYY-MM-DD`
    pub fn to_iso_date(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DDThh:mm:ss.sssZ`
    pub fn to_iso_string(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }

    /// Long English form, e.g. `September 21st, 1999`.
    pub fn to_long_string(&self) -> String {
        format!(
            "{} {}{}, {}",
            MONTH_NAMES[self.month_index() as usize],
            self.day(),
            ordinal_suffix(self.day()),
            self.year()
        )
    }
}

impl From<NaiveDateTime> for ParsedDate {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

/// Parses `YYYY-MM`, `YYYY-MM-DD` or `YYYY-MM-DDThh:mm[:ss[.sss]]`.
///
/// Missing components default to the first day and midnight. Anything that
/// does not match, or names an impossible calendar date, yields `None`.
pub fn parse_date(text: Option<&str>) -> Option<ParsedDate> {
    let caps = ISO_DATE.captures(text?.trim())?;
    let field = |index: usize, default: u32| -> Option<u32> {
        match caps.get(index) {
            Some(found) => found.as_str().parse().ok(),
            None => Some(default),
        }
    };

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = field(2, 1)?;
    let day = field(3, 1)?;
    let hour = field(4, 0)?;
    let minute = field(5, 0)?;
    let second = field(6, 0)?;
    let millis = match caps.get(7) {
        Some(found) => format!("{:0<3}", found.as_str()).parse::<u32>().ok()?,
        None => 0,
    };

    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_milli_opt(hour, minute, second, millis)
        .map(ParsedDate)
}

/// Parses a JSON string value; null and non-string values yield `None`.
pub fn parse_date_value(value: &Value) -> Option<ParsedDate> {
    parse_date(value.as_str())
}

/// English ordinal suffix for a day of the month.
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=20).contains(&day) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
