//! Table structure recovery
//!
//! Rebuilds logical tables from per-page table detections: header rows
//! are detected once per table title and reused on continuation pages,
//! the first cell of each data row is read for its alignment and casing
//! to decide which administrative level it names, and that level is
//! carried forward onto the rows below it.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use sakuna_core::{HierarchyLevel, LocationLevels, ParserConfig, RawTableRow};

use crate::header::{detect_headers, HeaderSpec};
use crate::layout::{BBox, DocumentLayout, PageLayout, TableDetection};
use crate::title::{clean_tablename, TitleTracker, UNKNOWN_SECTION};
use crate::Result;

static SUMMARY_ROW: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(GRAND TOTAL|SUB-TOTAL|SUB TOTAL|SUBTOTAL|TOTAL|INJURED/ILL|INJURED|ILL|DEAD|MISSING|OVERALL|SUMMARY|CASUALTIES)\b",
    )
    .ok()
});

// ============================================================================
// Cell Style
// ============================================================================

/// Horizontal placement of text inside its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Unknown,
}

impl Alignment {
    /// Compare the text margins against `tolerance`
    pub fn from_margins(left: f32, right: f32, tolerance: f32) -> Self {
        if (left - right).abs() < tolerance {
            Self::Center
        } else if left < tolerance * 2.0 {
            Self::Left
        } else if right < tolerance * 2.0 {
            Self::Right
        } else {
            Self::Unknown
        }
    }
}

/// Letter casing of a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCase {
    Upper,
    Title,
    Mixed,
}

impl TextCase {
    pub fn of(text: &str) -> Self {
        if is_upper(text) {
            Self::Upper
        } else if is_title(text) {
            Self::Title
        } else {
            Self::Mixed
        }
    }
}

/// At least one cased letter and no lower-case ones
fn is_upper(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        cased |= c.is_uppercase();
    }
    cased
}

/// Every word starts upper-case and continues lower-case
fn is_title(text: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for c in text.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}

/// Geometry-derived style of a cell's text
#[derive(Debug, Clone, PartialEq)]
pub struct CellStyle {
    pub alignment: Alignment,
    pub case: TextCase,
    pub text: String,
}

impl CellStyle {
    /// Administrative level implied by this style, if any
    pub fn hierarchy_level(&self) -> Option<HierarchyLevel> {
        match (self.alignment, self.case) {
            (Alignment::Center, TextCase::Upper) => Some(HierarchyLevel::Region),
            (Alignment::Left, TextCase::Upper) => Some(HierarchyLevel::Province),
            (Alignment::Center, _) => Some(HierarchyLevel::Municipality),
            (Alignment::Right, _) => Some(HierarchyLevel::Barangay),
            _ => None,
        }
    }
}

/// Read the words inside a cell box; `None` for an empty cell
pub fn analyze_cell(page: &PageLayout, cell: &BBox, config: &ParserConfig) -> Result<Option<CellStyle>> {
    let words = page.words_in(cell)?;
    if words.is_empty() {
        return Ok(None);
    }

    let text = page.lines_in(cell, config.line_tolerance)?.join(" ");
    let text = text.trim().to_string();

    let text_x0 = words.iter().map(|w| w.x0).fold(f32::INFINITY, f32::min);
    let text_x1 = words.iter().map(|w| w.x1).fold(f32::NEG_INFINITY, f32::max);

    Ok(Some(CellStyle {
        alignment: Alignment::from_margins(
            text_x0 - cell.x0,
            cell.x1 - text_x1,
            config.alignment_tolerance,
        ),
        case: TextCase::of(&text),
        text,
    }))
}

/// True for totals and casualty-section labels
pub fn is_summary_row(text: &str) -> bool {
    !text.trim().is_empty() && SUMMARY_ROW.as_ref().is_some_and(|re| re.is_match(text))
}

// ============================================================================
// Recovered Tables
// ============================================================================

/// A page-spanning table identified by its title
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalTable {
    pub title: String,
    pub header: HeaderSpec,
    pub rows: Vec<RawTableRow>,
}

/// Everything recovered from one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveredTables {
    /// Logical tables in order of first appearance
    pub tables: Vec<LogicalTable>,

    /// Detections dropped because no header could be identified
    pub skipped_tables: usize,

    /// Most recent "as of" timestamp seen in a table title
    pub last_update: Option<String>,
}

impl RecoveredTables {
    pub fn get(&self, title: &str) -> Option<&LogicalTable> {
        self.tables.iter().find(|t| t.title == title)
    }

    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}

// ============================================================================
// Recoverer
// ============================================================================

/// Stateful page-by-page table recovery for one document
pub struct TableRecoverer {
    config: ParserConfig,
    tracker: TitleTracker,
    current_title: String,
    headers: HashMap<String, HeaderSpec>,
    carried: HashMap<String, LocationLevels>,
    output: RecoveredTables,
}

impl TableRecoverer {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            tracker: TitleTracker::new(config.clone()),
            config,
            current_title: UNKNOWN_SECTION.to_string(),
            headers: HashMap::new(),
            carried: HashMap::new(),
            output: RecoveredTables::default(),
        }
    }

    /// Recover every logical table of a document
    pub fn recover(config: ParserConfig, layout: &DocumentLayout) -> RecoveredTables {
        let mut recoverer = Self::new(config);
        for page in &layout.pages {
            recoverer.process_page(page);
        }
        recoverer.finish()
    }

    /// Feed the next page in reading order
    pub fn process_page(&mut self, page: &PageLayout) {
        self.tracker.check_page_bottom(page);

        for table in &page.tables {
            if let Some(raw) = self.tracker.title_for_table(page, &table.bbox) {
                let title = clean_tablename(&raw);
                if title.name != self.current_title {
                    tracing::debug!("Page {}: table title {}", page.number, title.name);
                }
                self.current_title = title.name;
                if title.last_update.is_some() {
                    self.output.last_update = title.last_update;
                }
            }

            self.process_table(page, table);
        }
    }

    pub fn finish(self) -> RecoveredTables {
        self.output
    }

    fn process_table(&mut self, page: &PageLayout, table: &TableDetection) {
        let title = self.current_title.clone();
        let texts = table.texts();

        let header = match self.headers.get(&title) {
            Some(header) => header.clone(),
            None => match detect_headers(&texts, self.config.max_header_rows) {
                Some(header) => {
                    self.headers.insert(title.clone(), header.clone());
                    header
                }
                None => {
                    tracing::warn!(
                        "Page {}: no header rows found for table {}, skipping",
                        page.number,
                        title
                    );
                    self.output.skipped_tables += 1;
                    return;
                }
            },
        };

        let mut rows = Vec::new();
        let levels = self.carried.entry(title.clone()).or_default();

        for (row, row_texts) in table.rows.iter().zip(&texts).skip(header.data_start) {
            let Some(first) = row.cells.first() else {
                continue;
            };

            let style = match first.bbox.as_ref() {
                Some(bbox) => analyze_cell(page, bbox, &self.config).unwrap_or_else(|e| {
                    tracing::debug!("Page {}: unreadable cell: {}", page.number, e);
                    None
                }),
                None => None,
            };
            let label = match (&style, &first.bbox) {
                (Some(style), _) => style.text.clone(),
                (None, None) => first.text.clone().unwrap_or_default().trim().to_string(),
                (None, Some(_)) => String::new(),
            };
            let label = label.as_str();

            if label.contains("REGION") && label.contains("PROVINCE") {
                continue;
            }

            let mut record = RawTableRow::new(page.number);
            if is_summary_row(label) {
                record.is_summary = true;
                record.summary_type = Some(label.to_string());
            } else {
                if let Some(level) = style.as_ref().and_then(CellStyle::hierarchy_level) {
                    levels.set(level, label);
                }
                record.locations = levels.clone();
            }

            record.push_cell(header.column_name(0), label);
            for (col, cell) in row_texts.iter().enumerate().skip(1) {
                let value = cell.as_deref().unwrap_or("").replace('\n', " ");
                record.push_cell(header.column_name(col), value.trim());
            }

            rows.push(record);
        }

        let target = match self.output.tables.iter().position(|t| t.title == title) {
            Some(idx) => &mut self.output.tables[idx],
            None => {
                self.output.tables.push(LogicalTable {
                    title,
                    header,
                    rows: Vec::new(),
                });
                let last = self.output.tables.len() - 1;
                &mut self.output.tables[last]
            }
        };
        target.rows.extend(rows);
    }
}
