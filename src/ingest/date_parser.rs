use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

/// A known source format: a name for logs and an extractor that returns `None`
/// when the input is not in that format.
struct DateFormat {
    name: &'static str,
    parse: fn(&str) -> Option<DateTime<Utc>>,
}

/// Tried in order; the first format that yields a valid timestamp wins.
/// New formats are added here, not at call sites.
static FORMATS: &[DateFormat] = &[
    DateFormat {
        name: "iso/rfc",
        parse: parse_native,
    },
    DateFormat {
        name: "dd/MMM/yy h:mm am|pm",
        parse: parse_day_month_name,
    },
    DateFormat {
        name: "M/D/YYYY H:mm",
        parse: parse_us_24h,
    },
    DateFormat {
        name: "DD.MM.YYYY HH:mm:ss",
        parse: parse_dotted,
    },
    DateFormat {
        name: "M/D/YYYY h:mm:ss am|pm",
        parse: parse_us_12h_seconds,
    },
    DateFormat {
        name: "date-only fallback",
        parse: parse_date_prefix,
    },
];

/// Resolve a free-form date string to a UTC timestamp.
///
/// Values without an explicit offset are taken to be UTC. Returns `None` when
/// nothing matches; whether that is fatal is the caller's decision.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for format in FORMATS {
        if let Some(dt) = (format.parse)(s) {
            trace!(input = s, format = format.name, "parsed date");
            return Some(dt);
        }
    }
    trace!(input = s, "no date format matched");
    None
}

/// Canonical ISO-8601 rendering, e.g. `2024-05-30T17:20:00.000Z`.
pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse then render; `None` when unparseable.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|dt| to_iso(&dt))
}

/// Parse a timestamp this crate produced (or any RFC 3339 string).
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Utc.from_local_datetime(&naive).single()
}

fn parse_native(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offsets without a colon, e.g. `+0000`.
    const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return utc(naive);
        }
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(utc)
}

static DAY_MONTH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/([A-Za-z]{3})/(\d{4}|\d{2})\s+(\d{1,2}):(\d{2})\s*([AaPp][Mm])$")
        .expect("valid regex")
});

static US_24H: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})\s+(\d{1,2}):(\d{2})$").expect("valid regex")
});

static DOTTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})\s+(\d{1,2}):(\d{2}):(\d{2})$")
        .expect("valid regex")
});

static US_12H_SECONDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})\s+(\d{1,2}):(\d{2}):(\d{2})\s*([AaPp][Mm])$")
        .expect("valid regex")
});

fn num(caps: &Captures<'_>, idx: usize) -> Option<u32> {
    caps.get(idx)?.as_str().parse().ok()
}

fn month_from_abbrev(abbrev: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = abbrev.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|i| i as u32 + 1)
}

/// 12-hour clock to 24-hour; `None` for hours outside 1..=12.
fn to_24h(hour: u32, meridiem: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = meridiem.eq_ignore_ascii_case("pm");
    Some(match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    })
}

fn build(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, min, sec)?;
    utc(naive)
}

fn parse_day_month_name(s: &str) -> Option<DateTime<Utc>> {
    let caps = DAY_MONTH_NAME.captures(s)?;
    let day = num(&caps, 1)?;
    let month = month_from_abbrev(caps.get(2)?.as_str())?;
    let year_str = caps.get(3)?.as_str();
    let mut year: i32 = year_str.parse().ok()?;
    if year_str.len() == 2 {
        year += 2000;
    }
    let hour = to_24h(num(&caps, 4)?, caps.get(6)?.as_str())?;
    build(year, month, day, hour, num(&caps, 5)?, 0)
}

fn parse_us_24h(s: &str) -> Option<DateTime<Utc>> {
    let caps = US_24H.captures(s)?;
    build(
        num(&caps, 3)? as i32,
        num(&caps, 1)?,
        num(&caps, 2)?,
        num(&caps, 4)?,
        num(&caps, 5)?,
        0,
    )
}

fn parse_dotted(s: &str) -> Option<DateTime<Utc>> {
    let caps = DOTTED.captures(s)?;
    build(
        num(&caps, 3)? as i32,
        num(&caps, 2)?,
        num(&caps, 1)?,
        num(&caps, 4)?,
        num(&caps, 5)?,
        num(&caps, 6)?,
    )
}

fn parse_us_12h_seconds(s: &str) -> Option<DateTime<Utc>> {
    let caps = US_12H_SECONDS.captures(s)?;
    let hour = to_24h(num(&caps, 4)?, caps.get(7)?.as_str())?;
    build(
        num(&caps, 3)? as i32,
        num(&caps, 1)?,
        num(&caps, 2)?,
        hour,
        num(&caps, 5)?,
        num(&caps, 6)?,
    )
}

fn parse_date_prefix(s: &str) -> Option<DateTime<Utc>> {
    let (prefix, _) = s.split_once(' ')?;
    parse_native(prefix)
}
