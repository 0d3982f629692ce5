//! Report-level metadata and the whole-document parse

use once_cell::sync::Lazy;
use regex::Regex;
use sakuna_core::ParserConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::select_event_dates;
use crate::layout::DocumentLayout;
use crate::narrative::extract_narrative;
use crate::table::{RecoveredTables, TableRecoverer};

/// Agency credited as the recorder of every report
pub const RECORDED_BY: &str = "NDRRMC";

static REPORT_KIND: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)(Breakdown|Final_Report|SitRep|Situational_Report|Terminal_Report|Table)").ok()
});

static SUBJECT_AFTER_FOR: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)for (.+)").ok());

static TRAILING_BREAKDOWN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)(Breakdown.*)$").ok());

static ARTICLE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)\bthe\b\s*").ok());

static SUBJECT_ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("Tropical Storm", "TS"),
        ("Typhoon", "TY"),
        ("Tropical Cyclone", "TC"),
        ("Situational Report", "SitRep"),
        ("Southwest Monsoon", "SWM"),
        ("Low Pressure Area", "LPA"),
        ("Terminal Report", "TR"),
        ("Final Report", "FR"),
    ]
    .into_iter()
    .filter_map(|(full, abbr)| Regex::new(&format!("(?i){full}")).ok().map(|re| (re, abbr)))
    .collect()
});

fn remove(re: &Lazy<Option<Regex>>, text: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

/// Abbreviate well-known event and report words
pub fn normalize_subject(text: &str) -> String {
    SUBJECT_ABBREVIATIONS
        .iter()
        .fold(text.to_string(), |acc, (re, abbr)| re.replace_all(&acc, *abbr).into_owned())
}

/// Derive an event name from a report file name
///
/// `"SitRep_No_5_for_Tropical_Storm_Kristine_2024.pdf"` becomes
/// `"TS Kristine 2024"`.
pub fn clean_filename(filename: &str) -> String {
    let name = filename.replace(".pdf", "");
    let name = remove(&REPORT_KIND, &name).replace('_', " ");

    let subject = SUBJECT_AFTER_FOR
        .as_ref()
        .and_then(|re| re.captures(&name))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| name.trim().to_string());

    let subject = remove(&TRAILING_BREAKDOWN, &subject);
    let subject = remove(&ARTICLE, subject.trim())
        .replace(" -", "")
        .replace(['(', ')'], "");

    normalize_subject(subject.trim()).trim().to_string()
}

/// Descriptive metadata of one report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub id: Uuid,
    pub event_name: String,

    /// `%Y-%m-%d`, empty when unknown
    pub start_date: String,
    pub end_date: String,

    /// `%Y-%m-%d %H:%M:%S` or the raw "as of" text
    pub last_update_date: String,
    pub report_name: String,
    pub recorded_by: String,
    pub obtained_date: String,
    pub report_link: String,

    /// Narrative text
    pub remarks: String,
}

impl ReportMetadata {
    /// Metadata seeded from the report's file name
    pub fn for_report(report_name: impl Into<String>) -> Self {
        let report_name = report_name.into();
        Self {
            id: Uuid::new_v4(),
            event_name: clean_filename(&report_name),
            start_date: String::new(),
            end_date: String::new(),
            last_update_date: String::new(),
            report_name,
            recorded_by: RECORDED_BY.to_string(),
            obtained_date: String::new(),
            report_link: String::new(),
            remarks: String::new(),
        }
    }

    /// Event-facing fields
    pub fn event_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "eventName": self.event_name,
            "startDate": self.start_date,
            "endDate": self.end_date,
            "remarks": self.remarks,
        })
    }

    /// Provenance fields
    pub fn source_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "lastUpdateDate": self.last_update_date,
            "reportName": self.report_name,
            "recordedBy": self.recorded_by,
            "obtainedDate": self.obtained_date,
            "reportLink": self.report_link,
        })
    }
}

/// Result of parsing one report layout
#[derive(Debug, Clone)]
pub struct ParsedReport {
    pub metadata: ReportMetadata,
    pub tables: RecoveredTables,
}

/// Runs narrative, date and table recovery over a report layout
#[derive(Debug, Clone, Default)]
pub struct ReportParser {
    config: ParserConfig,
}

impl ReportParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn parse(&self, layout: &DocumentLayout, report_name: &str) -> ParsedReport {
        let mut metadata = ReportMetadata::for_report(report_name);

        let pages = layout.page_texts(self.config.line_tolerance);
        metadata.remarks = extract_narrative(&pages);

        let dates = select_event_dates(&metadata.event_name, &metadata.remarks, &pages);
        if let Some(start) = dates.start {
            metadata.start_date = start.format("%Y-%m-%d").to_string();
        }
        if let Some(end) = dates.end {
            metadata.end_date = end.format("%Y-%m-%d").to_string();
        }

        let tables = TableRecoverer::recover(self.config.clone(), layout);
        if let Some(last_update) = &tables.last_update {
            metadata.last_update_date = last_update.clone();
        }

        tracing::info!(
            "Parsed {}: {} tables, {} rows, {} skipped",
            report_name,
            tables.tables.len(),
            tables.row_count(),
            tables.skipped_tables
        );

        ParsedReport { metadata, tables }
    }
}
