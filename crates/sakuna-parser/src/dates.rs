//! Date extraction from report narratives

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

const TIME_SUFFIX: &str = r"(?:\s+\d{1,2}:\d{2}(?:\s*(?:am|pm|AM|PM))?)?";

static SINGLE_DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let long = "January|February|March|April|May|June|July|August|September|October|November|December";
    let short = "Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec";
    [
        format!(r"(?i)\b(\d{{1,2}}\s+(?:{long})\s+\d{{4}}{TIME_SUFFIX})\b"),
        format!(r"(?i)\b((?:{long})\s+\d{{1,2}},?\s+\d{{4}}{TIME_SUFFIX})\b"),
        format!(r"(?i)\b(\d{{1,2}}\s+(?:{short})\s+\d{{4}}{TIME_SUFFIX})\b"),
        format!(r"(?i)\b((?:{short})\s+\d{{1,2}},?\s+\d{{4}}{TIME_SUFFIX})\b"),
        r"\b(\d{1,2}[/-]\d{1,2}[/-]\d{4})\b".to_string(),
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static RANGE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    let month = "JANUARY|FEBRUARY|MARCH|APRIL|MAY|JUNE|JULY|AUGUST|SEPTEMBER|OCTOBER|NOVEMBER|DECEMBER";
    Regex::new(&format!(
        r"(?i)\((\d{{1,2}}\s+(?:{month})\s+\d{{4}})\s*-\s*(\d{{1,2}}\s+(?:{month})\s+\d{{4}})\)"
    ))
    .ok()
});

static AS_OF: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)as\s+of\s*[(\[]?\s*([^)\]\n]+)").ok());

static ELECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)scheduled\s+for\s+(\d{1,2}\s+\w+\s+\d{4})",
        r"(?i)election.*?(\d{1,2}\s+\w+\s+\d{4})",
        r"(?i)(\d{1,2}\s+\w+\s+\d{4}).*?election",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const DATETIME_FORMATS: &[&str] = &[
    "%d %B %Y %I:%M %p",
    "%d %B %Y %H:%M",
    "%B %d %Y %I:%M %p",
    "%B %d %Y %H:%M",
    "%d %b %Y %I:%M %p",
    "%d %b %Y %H:%M",
    "%b %d %Y %I:%M %p",
    "%b %d %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%d %B %Y", "%B %d %Y", "%d %b %Y", "%b %d %Y", "%d-%m-%Y", "%d/%m/%Y", "%m-%d-%Y", "%m/%d/%Y",
];

/// Parse a date in any of the formats reports use; commas are ignored
pub fn parse_flexible_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim().replace(',', "");

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    Single,
    RangeStart,
    RangeEnd,
}

/// A date found in free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMention {
    pub kind: DateKind,
    pub text: String,
    pub date: NaiveDateTime,

    /// Byte offset of the match
    pub position: usize,
}

impl DateMention {
    fn has_time(&self) -> bool {
        self.text.contains(':')
    }
}

/// Every parseable date in `text`, ordered by position
pub fn extract_dates(text: &str) -> Vec<DateMention> {
    let mut found = Vec::new();

    for re in SINGLE_DATE_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let (Some(whole), Some(m)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if let Some(date) = parse_flexible_date(m.as_str()) {
                found.push(DateMention {
                    kind: DateKind::Single,
                    text: m.as_str().to_string(),
                    date,
                    position: whole.start(),
                });
            }
        }
    }

    if let Some(re) = RANGE_PATTERN.as_ref() {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            for (idx, kind) in [(1, DateKind::RangeStart), (2, DateKind::RangeEnd)] {
                let Some(m) = caps.get(idx) else { continue };
                if let Some(date) = parse_flexible_date(m.as_str()) {
                    found.push(DateMention {
                        kind,
                        text: m.as_str().to_string(),
                        date,
                        position: whole.start(),
                    });
                }
            }
        }
    }

    found.sort_by_key(|d| d.position);
    found
}

/// First "as of" date on the first two pages
pub fn find_as_of_date(pages: &[String]) -> Option<NaiveDateTime> {
    let re = AS_OF.as_ref()?;
    pages.iter().take(2).find_map(|page| {
        re.captures_iter(page).find_map(|caps| {
            let tail = caps.get(1)?.as_str();
            parse_flexible_date(tail).or_else(|| extract_dates(tail).first().map(|d| d.date))
        })
    })
}

/// Timed date near the top of the first page
pub fn find_report_date(first_page: &str) -> Option<NaiveDateTime> {
    extract_dates(prefix_chars(first_page, 300))
        .into_iter()
        .find(|d| d.has_time() && d.position < 200)
        .map(|d| d.date)
}

fn prefix_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Event dates selected for one report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDates {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub report_date: Option<NaiveDateTime>,
}

/// Choose start and end dates from the narrative and page text
///
/// Monitoring reports without narrative dates fall back to the "as of"
/// date, then the report date. Election events prefer the scheduled date.
/// Otherwise an explicit `(start - end)` range wins over the span of all
/// narrative dates.
pub fn select_event_dates(event_name: &str, narrative: &str, pages: &[String]) -> EventDates {
    let event_lower = event_name.to_lowercase();
    let is_sitrep = event_lower.contains("sitrep")
        || narrative.to_lowercase().contains("situational report");
    let is_election = event_lower.contains("election") || event_lower.contains("bske");
    let is_monitoring = is_sitrep || event_lower.contains("monitoring") || event_lower.contains("cases");

    let as_of = find_as_of_date(pages);
    let report_date = pages.first().and_then(|p| find_report_date(p));

    let narrative_dates: Vec<DateMention> = extract_dates(narrative)
        .into_iter()
        .filter(|d| !(d.position < 200 && d.has_time()))
        .collect();

    let fallback = || {
        let date = as_of.or(report_date);
        EventDates {
            start: date,
            end: date,
            report_date,
        }
    };

    if is_monitoring && narrative_dates.is_empty() {
        return fallback();
    }

    if is_election {
        let scheduled = ELECTION_PATTERNS.iter().find_map(|re| {
            re.captures(narrative)
                .and_then(|c| c.get(1))
                .and_then(|m| parse_flexible_date(m.as_str()))
        });
        if let Some(date) = scheduled.or_else(|| narrative_dates.first().map(|d| d.date)) {
            return EventDates {
                start: Some(date),
                end: Some(date),
                report_date,
            };
        }
    }

    if narrative_dates.is_empty() {
        return fallback();
    }

    let range_start = narrative_dates.iter().find(|d| d.kind == DateKind::RangeStart);
    let range_end = narrative_dates.iter().find(|d| d.kind == DateKind::RangeEnd);

    let (start, end) = match (range_start, range_end) {
        (Some(s), Some(e)) => (s.date, e.date),
        _ => {
            let mut all: Vec<NaiveDateTime> = narrative_dates.iter().map(|d| d.date).collect();
            all.sort();
            (all[0], all[all.len() - 1])
        }
    };

    EventDates {
        start: Some(start),
        end: Some(end),
        report_date,
    }
}
