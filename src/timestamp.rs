//! Timestamp resolution for mirror date strings
//!
//! The mirror renders dates two ways: a full title attribute like
//! `"Mar 2, 2025 · 6:47 PM UTC"` and a short relative label like `"Mar 13"`
//! or `"10h"`. Resolution prefers the title and falls back to the label.
//! Anything unrecognized resolves to `None` rather than an error; callers
//! treat a missing instant as "unordered", not as a failure.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Full-date format used by the mirror's title attribute
const ABSOLUTE_FORMAT: &str = "%b %e, %Y · %I:%M %p UTC";

/// Date-only half of the title, left of the middle dot
const DATE_PART_FORMAT: &str = "%b %e, %Y";

/// Resolves a post's timestamp from its relative label and optional title
///
/// Evaluated against the current wall clock; see [`resolve_at`] for the
/// clock-injected variant.
pub fn resolve(relative_label: &str, absolute_title: Option<&str>) -> Option<DateTime<Utc>> {
    resolve_at(relative_label, absolute_title, Utc::now())
}

/// Resolves a post's timestamp against an explicit "now"
///
/// The title attribute wins when it parses, either directly or through the
/// middle-dot fallback. Otherwise the relative label is matched against the
/// two shapes the mirror emits: `"<Mon> <day>"` (current year, rolled back
/// one year if that lands in the future, since the mirror omits the year for
/// anything in the last 12 months) and `"<N>h"` (N hours before now).
pub fn resolve_at(
    relative_label: &str,
    absolute_title: Option<&str>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if let Some(title) = absolute_title {
        if let Some(instant) = resolve_absolute(title) {
            return Some(instant);
        }
    }
    resolve_relative(relative_label, now)
}

/// Formats an instant for the collection's display field
pub fn format_display(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Parses the full title attribute
fn resolve_absolute(title: &str) -> Option<DateTime<Utc>> {
    let title = title.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(title, ABSOLUTE_FORMAT) {
        return Some(naive.and_utc());
    }

    // Manual fallback: split on the middle dot and convert the 12-hour
    // clock by hand. This tolerates zone spellings other than "UTC".
    let (date_part, time_part) = title.split_once('·')?;
    let date = NaiveDate::parse_from_str(date_part.trim(), DATE_PART_FORMAT).ok()?;
    let time = parse_clock(time_part.trim())?;
    Some(date.and_time(time).and_utc())
}

/// Parses `"H:MM AM/PM [ZONE]"` into a time of day
fn parse_clock(s: &str) -> Option<NaiveTime> {
    let mut parts = s.split_whitespace();
    let clock = parts.next()?;
    let meridiem = parts.next()?;

    let (hour, minute) = clock.split_once(':')?;
    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;

    match meridiem.to_ascii_uppercase().as_str() {
        "PM" if hour < 12 => hour += 12,
        "AM" if hour == 12 => hour = 0,
        "AM" | "PM" => {}
        _ => return None,
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Resolves a relative label against an explicit "now"
fn resolve_relative(label: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let label = collapse_repeated(label.trim());

    // "<N>h": N hours before now. Only a bare digit run counts; a sign or
    // an out-of-range count is an unrecognized shape, not an error.
    if let Some(n) = label.strip_suffix('h') {
        if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) {
            let hours: i64 = n.parse().ok()?;
            let delta = Duration::try_hours(hours)?;
            return now.checked_sub_signed(delta);
        }
    }

    // "<Mon> <day>": assume the current year, roll back one year when the
    // naive interpretation lands in the future
    let (month, day) = label.split_once(' ')?;
    let month = month_number(month)?;
    let day: u32 = day.trim().parse().ok()?;

    let date = NaiveDate::from_ymd_opt(now.year(), month, day)?;
    let candidate = date.and_hms_opt(0, 0, 0)?.and_utc();
    if candidate > now {
        let rolled = date.with_year(now.year() - 1)?;
        return Some(rolled.and_hms_opt(0, 0, 0)?.and_utc());
    }
    Some(candidate)
}

/// Collapses a back-to-back duplicated month-day token
///
/// The mirror occasionally renders the label twice in a row
/// (`"Mar 13Mar 13"`), a rendering artifact that must be undone before
/// matching.
fn collapse_repeated(label: &str) -> &str {
    let mid = label.len() / 2;
    if !label.is_empty() && label.len() % 2 == 0 && label.is_char_boundary(mid) {
        let (first, second) = label.split_at(mid);
        if first == second && looks_like_month_day(first) {
            return first;
        }
    }
    label
}

fn looks_like_month_day(s: &str) -> bool {
    match s.split_once(' ') {
        Some((month, day)) => {
            month_number(month).is_some()
                && !day.is_empty()
                && day.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(month)
}
