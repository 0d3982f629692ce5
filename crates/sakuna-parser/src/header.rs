//! Multi-row header detection and merging

use once_cell::sync::Lazy;
use regex::Regex;

/// Column vocabulary that marks a row as header-like
const HEADER_KEYWORDS: &[&str] = &[
    "families",
    "persons",
    "barangay",
    "brgys",
    "cum",
    "now",
    "type",
    "date",
    "time",
    "description",
    "actions",
    "remarks",
    "affected",
    "evacuation",
    "centers",
    "inside",
    "outside",
    "status",
    "region",
    "province",
    "municipality",
    "city",
    "total",
    "served",
    "current",
    "incident",
    "occurrence",
];

/// First-cell patterns that open the data section
static DATA_BOUNDARY: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^REGION\s+(\d+|[IVX]+)",
        r"(?i)^GRAND\s+TOTAL",
        r"(?i)^(DEAD|INJURED|MISSING|CASUALTIES)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static UNDERSCORE_RUN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new("_+").ok());

/// Merged column names of a logical table and where its data begins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSpec {
    pub columns: Vec<String>,

    /// Number of leading rows consumed by the header
    pub data_start: usize,
}

impl HeaderSpec {
    /// Column name for a cell position
    pub fn column_name(&self, idx: usize) -> String {
        self.columns
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("Column_{idx}"))
    }
}

/// Detect the header block in the first `max_rows` rows and merge it
///
/// Returns `None` when the very first row already looks like data.
pub fn detect_headers(rows: &[Vec<Option<String>>], max_rows: usize) -> Option<HeaderSpec> {
    let first = rows.first()?;

    let mut last_header = None;
    for (idx, row) in rows.iter().enumerate().take(max_rows) {
        if row.is_empty() {
            continue;
        }

        let first_cell = cell_text(&row[0]);
        if DATA_BOUNDARY.iter().any(|re| re.is_match(first_cell)) {
            break;
        }

        let (header_like, data_like) = score_row(row);
        if data_like > header_like && data_like > 0 {
            break;
        }

        last_header = Some(idx);
    }

    let data_start = last_header? + 1;
    let columns = merge_header_rows(&rows[..data_start], first.len());
    tracing::debug!("Detected {} header rows", data_start);

    Some(HeaderSpec {
        columns,
        data_start,
    })
}

fn cell_text(cell: &Option<String>) -> &str {
    cell.as_deref().map(str::trim).unwrap_or("")
}

fn score_row(row: &[Option<String>]) -> (usize, usize) {
    let mut header_like = 0;
    let mut data_like = 0;

    for cell in row {
        let text = cell_text(cell);
        if text.is_empty() {
            continue;
        }
        let lower = text.to_lowercase();

        if HEADER_KEYWORDS.iter().any(|k| lower.contains(k)) {
            header_like += 1;
        } else if is_number(&lower) || lower.chars().count() > 50 {
            data_like += 1;
        }
    }

    (header_like, data_like)
}

fn is_number(text: &str) -> bool {
    let digits: String = text.chars().filter(|c| !matches!(c, ',' | '.')).collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_numeric())
}

/// Forward-fill each header row, then merge columns top to bottom
pub fn merge_header_rows(header_rows: &[Vec<Option<String>>], num_columns: usize) -> Vec<String> {
    let filled: Vec<Vec<String>> = header_rows
        .iter()
        .map(|row| {
            let mut last = String::new();
            row.iter()
                .map(|cell| {
                    let text = cell_text(cell);
                    if !text.is_empty() {
                        last = text.to_string();
                    }
                    last.clone()
                })
                .collect()
        })
        .collect();

    (0..num_columns)
        .map(|col| {
            let mut parts: Vec<&str> = Vec::new();
            for row in &filled {
                if let Some(value) = row.get(col).filter(|v| !v.is_empty()) {
                    if !parts.contains(&value.as_str()) {
                        parts.push(value);
                    }
                }
            }

            if parts.is_empty() {
                format!("Column_{col}")
            } else {
                clean_header_name(&parts.join("_"))
            }
        })
        .collect()
}

/// Make a merged header usable as a column key
///
/// Line breaks inside wrapped header cells count as spaces.
pub fn clean_header_name(raw: &str) -> String {
    let replaced: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '.'))
        .map(|c| if c.is_whitespace() || c == '/' { '_' } else { c })
        .collect();

    match UNDERSCORE_RUN.as_ref() {
        Some(re) => re.replace_all(&replaced, "_").into_owned(),
        None => replaced,
    }
}
