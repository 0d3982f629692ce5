//! Narrative text preceding the report tables

use once_cell::sync::Lazy;
use regex::Regex;

/// Pages scanned for narrative text
pub const MAX_NARRATIVE_PAGES: usize = 5;

/// Markers where the tabular part of a report begins
static TABLE_START: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?im)REGION\s*\|\s*PROVINCE",
        r"(?im)AFFECTED POPULATION",
        r"(?im)RELATED INCIDENTS",
        r"(?im)CASUALTIES",
        r"(?im)^\s*REGION\s*$",
        r"(?im)^\s*PROVINCE\s*$",
        r"(?im)Page \d+\s*/\s*\d+",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Join the narrative of the first pages, stopping at the first table
pub fn extract_narrative(pages: &[String]) -> String {
    let mut parts = Vec::new();

    for (idx, page) in pages.iter().take(MAX_NARRATIVE_PAGES).enumerate() {
        let text = if idx == 0 {
            strip_letterhead(page)
        } else {
            page.clone()
        };

        match table_start(&text) {
            Some(pos) => {
                parts.push(text[..pos].trim().to_string());
                break;
            }
            None => parts.push(text.trim().to_string()),
        }
    }

    parts.join("\n\n").trim().to_string()
}

fn table_start(text: &str) -> Option<usize> {
    TABLE_START
        .iter()
        .filter_map(|re| re.find(text).map(|m| m.start()))
        .min()
}

/// Drop the agency letterhead from the first page
fn strip_letterhead(page: &str) -> String {
    page.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.trim();
            let contact = ["Telefax:", "Email:", "Websites:"]
                .iter()
                .any(|marker| line.contains(marker));
            let short_early = line.chars().count() < 10 && i < 10;

            (i >= 3 && !contact && !short_early && !line.is_empty()).then_some(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
