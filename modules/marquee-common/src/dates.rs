use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Best-effort parsed screening date. Sources are wildly inconsistent:
/// some give full ISO datetimes, some "Nov 20 7:00 PM", some just "11/20"
/// or a weekday, so the time component is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowDate {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl ShowDate {
    pub fn date_only(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time: Some(time),
        }
    }

    /// Same calendar day. This is the dedup tolerance window: two records
    /// for the same film at the same venue on the same day are one event
    /// even when one source omits the showtime.
    pub fn same_day(&self, other: &ShowDate) -> bool {
        self.date == other.date
    }
}

impl std::fmt::Display for ShowDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.time {
            Some(t) => write!(f, "{} {}", self.date.format("%a %b %-d"), t.format("%-I:%M %p")),
            None => write!(f, "{}", self.date.format("%a %b %-d")),
        }
    }
}

fn month_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})\b")
            .expect("valid regex")
    })
}

fn numeric_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{2,4}))?\b").expect("valid regex"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").expect("valid regex")
    })
}

fn weekday_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
            .expect("valid regex")
    })
}

/// Parse a source date string relative to `today` (needed to resolve
/// year-less dates and bare weekday names). Returns None when nothing
/// date-like is found; a date-less record is valid, not an error.
pub fn parse_show_date(raw: &str, today: NaiveDate) -> Option<ShowDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Full ISO datetime or date, as found in <time datetime="..."> attributes.
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw.get(..19).unwrap_or(raw), "%Y-%m-%dT%H:%M:%S")
    {
        return Some(ShowDate::at(dt.date(), dt.time()));
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d") {
        return Some(ShowDate::date_only(d));
    }

    let time = parse_time(raw);

    // "Nov 20", "November 20"
    if let Some(cap) = month_day_re().captures(raw) {
        let month = month_number(&cap[1]);
        let day: u32 = cap[2].parse().ok()?;
        if let Some(date) = resolve_year(month, day, today) {
            return Some(ShowDate { date, time });
        }
    }

    // "11/20" or "11/20/2026"
    if let Some(cap) = numeric_date_re().captures(raw) {
        let month: u32 = cap[1].parse().ok()?;
        let day: u32 = cap[2].parse().ok()?;
        if (1..=12).contains(&month) {
            let date = match cap.get(3) {
                Some(y) => {
                    let mut year: i32 = y.as_str().parse().ok()?;
                    if year < 100 {
                        year += 2000;
                    }
                    NaiveDate::from_ymd_opt(year, month, day)
                }
                None => resolve_year(month, day, today),
            };
            if let Some(date) = date {
                return Some(ShowDate { date, time });
            }
        }
    }

    // Bare weekday: next occurrence on or after today.
    if let Some(cap) = weekday_re().captures(raw) {
        let target = weekday(&cap[1]);
        let mut date = today;
        while date.weekday() != target {
            date = date.succ_opt()?;
        }
        return Some(ShowDate { date, time });
    }

    // A lone showtime ("7:00 PM") with no date carries no day information.
    None
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let cap = time_re().captures(raw)?;
    let mut hour: u32 = cap[1].parse().ok()?;
    let minute: u32 = cap.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let pm = cap[3].eq_ignore_ascii_case("pm");
    if hour > 12 || minute > 59 {
        return None;
    }
    if pm && hour != 12 {
        hour += 12;
    } else if !pm && hour == 12 {
        hour = 0;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Year-less month/day resolves to the upcoming occurrence: this year if
/// not already past, otherwise next year.
fn resolve_year(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if this_year >= today {
        Some(this_year)
    } else {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    }
}

fn month_number(abbrev: &str) -> u32 {
    match abbrev.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        _ => 12,
    }
}

fn weekday(name: &str) -> Weekday {
    match name.to_lowercase().as_str() {
        "monday" => Weekday::Mon,
        "tuesday" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" => Weekday::Thu,
        "friday" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        _ => Weekday::Sun,
    }
}
