//! Cross-page table title tracking

use chrono::{NaiveDate, NaiveDateTime};
use sakuna_core::ParserConfig;

use crate::layout::{BBox, PageLayout};
use crate::table::TextCase;

/// Section name used before any title has been seen
pub const UNKNOWN_SECTION: &str = "Unknown_Section";

/// Distance from the bottom edge assumed for a trailing title line
const TRAILING_TITLE_OFFSET: f32 = 50.0;

/// Upper bound on the length of an inline title that is not upper-case
const MAX_INLINE_TITLE_LEN: usize = 100;

/// A cleaned table title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTitle {
    /// File-system safe table name
    pub name: String,

    /// Normalized "as of" timestamp, or the raw text if unparseable
    pub last_update: Option<String>,
}

/// Turn a raw title line into a table name and its "as of" suffix
pub fn clean_tablename(title: &str) -> TableTitle {
    let (name_part, last_update) = match find_as_of(title) {
        Some(idx) => {
            let suffix: String = title[idx + 5..]
                .chars()
                .filter(|c| !matches!(c, '(' | ')'))
                .collect();
            (&title[..idx], Some(format_last_update(suffix.trim())))
        }
        None => (title, None),
    };

    let name: String = name_part
        .trim()
        .replace(' ', "_")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    TableTitle {
        name: if name.is_empty() {
            UNKNOWN_SECTION.to_string()
        } else {
            name
        },
        last_update,
    }
}

/// Byte offset of the first case-insensitive "as of"
fn find_as_of(text: &str) -> Option<usize> {
    text.to_ascii_lowercase().find("as of")
}

/// Render an "as of" date as `%Y-%m-%d %H:%M:%S`, keeping unknown formats raw
pub fn format_last_update(raw: &str) -> String {
    const OUTPUT: &str = "%Y-%m-%d %H:%M:%S";

    for fmt in ["%B %d, %Y %H:%M", "%b %d, %Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format(OUTPUT).to_string();
        }
    }
    for fmt in ["%b %d, %Y", "%B %d %Y"] {
        if let Some(dt) = NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return dt.format(OUTPUT).to_string();
        }
    }

    raw.to_string()
}

/// Carries a title found at the bottom of one page onto the first table
/// of the next page
#[derive(Debug)]
pub struct TitleTracker {
    config: ParserConfig,
    pending: Option<(String, u32)>,
}

impl TitleTracker {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            pending: None,
        }
    }

    /// Look for a trailing title in the bottom band of `page`
    pub fn check_page_bottom(&mut self, page: &PageLayout) -> Option<String> {
        let band = BBox::new(
            0.0,
            (page.height - self.config.bottom_band_height).max(0.0),
            page.width,
            page.height,
        );

        let lines = match page.lines_in(&band, self.config.line_tolerance) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!("Page {}: skipping bottom band: {}", page.number, e);
                return None;
            }
        };

        let candidate = lines.iter().rev().map(|l| l.trim()).find(|line| {
            if line.chars().count() < 5
                || line.chars().all(|c| c.is_ascii_digit())
                || line.contains("Page")
            {
                return false;
            }
            TextCase::of(line) == TextCase::Upper
                || line.to_lowercase().contains("as of")
                || line.to_uppercase().contains("AFFECTED POPULATION")
        })?;

        let title_y = page.height - TRAILING_TITLE_OFFSET;
        let inside_table = page
            .tables
            .iter()
            .any(|t| t.bbox.top < title_y && title_y < t.bbox.bottom);
        if inside_table {
            return None;
        }

        tracing::debug!("Page {}: pending title {:?}", page.number, candidate);
        self.pending = Some((candidate.to_string(), page.number));
        Some(candidate.to_string())
    }

    /// Title for a table on `page`, if one can be inferred
    pub fn title_for_table(&mut self, page: &PageLayout, table_bbox: &BBox) -> Option<String> {
        if let Some((title, seen_on)) = &self.pending {
            if *seen_on + 1 == page.number
                && table_bbox.top < page.height * self.config.title_top_fraction
            {
                let title = title.clone();
                self.pending = None;
                tracing::debug!("Page {}: using title from previous page", page.number);
                return Some(title);
            }
        }

        let above = BBox::new(
            0.0,
            (table_bbox.top - self.config.header_search_distance).max(0.0),
            page.width,
            table_bbox.top,
        );
        let lines = page.lines_in(&above, self.config.line_tolerance).ok()?;
        let last = lines.last()?.trim();

        if TextCase::of(last) == TextCase::Upper || last.chars().count() < MAX_INLINE_TITLE_LEN {
            Some(last.to_string())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{TableDetection, Word};

    fn line(text: &str, top: f32) -> Vec<Word> {
        let mut x = 20.0;
        text.split_whitespace()
            .map(|w| {
                let word = Word {
                    text: w.to_string(),
                    x0: x,
                    top,
                    x1: x + 5.0 * w.len() as f32,
                    bottom: top + 8.0,
                };
                x = word.x1 + 4.0;
                word
            })
            .collect()
    }

    fn page(number: u32, words: Vec<Word>, tables: Vec<BBox>) -> PageLayout {
        PageLayout {
            number,
            width: 600.0,
            height: 800.0,
            words,
            tables: tables
                .into_iter()
                .map(|bbox| TableDetection {
                    bbox,
                    rows: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_clean_tablename() {
        let t = clean_tablename("AFFECTED POPULATION as of (Oct 25, 2024)");
        assert_eq!(t.name, "affected_population");
        assert_eq!(t.last_update.as_deref(), Some("2024-10-25 00:00:00"));

        let t = clean_tablename("Related Incidents AS OF October 25, 2024 08:00");
        assert_eq!(t.name, "related_incidents");
        assert_eq!(t.last_update.as_deref(), Some("2024-10-25 08:00:00"));

        let t = clean_tablename("CASUALTIES / Dead & Missing");
        assert_eq!(t.name, "casualties__dead__missing");
        assert!(t.last_update.is_none());

        assert_eq!(clean_tablename("   ").name, UNKNOWN_SECTION);
    }

    #[test]
    fn test_unparseable_last_update_kept_raw() {
        assert_eq!(format_last_update("yesterday noon"), "yesterday noon");
        assert_eq!(format_last_update("October 5 2024"), "2024-10-05 00:00:00");
    }

    #[test]
    fn test_pending_title_carries_to_next_page() {
        let mut tracker = TitleTracker::new(ParserConfig::default());

        let mut words = line("Some narrative text", 100.0);
        words.extend(line("AFFECTED POPULATION", 700.0));
        words.extend(line("Page 1 of 3", 780.0));
        let first = page(1, words, Vec::new());
        assert_eq!(
            tracker.check_page_bottom(&first).as_deref(),
            Some("AFFECTED POPULATION")
        );

        let second = page(2, Vec::new(), vec![BBox::new(10.0, 60.0, 590.0, 500.0)]);
        let title = tracker.title_for_table(&second, &second.tables[0].bbox);
        assert_eq!(title.as_deref(), Some("AFFECTED POPULATION"));

        // consumed
        assert!(tracker.title_for_table(&second, &second.tables[0].bbox).is_none());
    }

    #[test]
    fn test_pending_title_requires_table_near_top() {
        let mut tracker = TitleTracker::new(ParserConfig::default());
        let first = page(1, line("RELATED INCIDENTS", 720.0), Vec::new());
        tracker.check_page_bottom(&first);

        let second = page(2, Vec::new(), vec![BBox::new(10.0, 400.0, 590.0, 700.0)]);
        assert!(tracker.title_for_table(&second, &second.tables[0].bbox).is_none());
    }

    #[test]
    fn test_bottom_title_inside_table_is_ignored() {
        let mut tracker = TitleTracker::new(ParserConfig::default());
        let p = page(
            1,
            line("GRAND TOTAL", 740.0),
            vec![BBox::new(10.0, 300.0, 590.0, 790.0)],
        );
        assert!(tracker.check_page_bottom(&p).is_none());
    }

    #[test]
    fn test_inline_title_above_table() {
        let mut tracker = TitleTracker::new(ParserConfig::default());
        let mut words = line("far away heading", 100.0);
        words.extend(line("STATUS OF LIFELINES", 320.0));
        let p = page(3, words, vec![BBox::new(10.0, 340.0, 590.0, 600.0)]);

        let title = tracker.title_for_table(&p, &p.tables[0].bbox);
        assert_eq!(title.as_deref(), Some("STATUS OF LIFELINES"));
    }
}
