//! Incident enrichment
//!
//! Turns the recovered related-incidents table into one resolved record
//! per incident: a gazetteer location, a disaster type and a start time.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use sakuna_core::{Classification, LocationLevels, RawTableRow, ResolvedRow, Result};

use crate::classifier::DisasterClassifier;
use crate::location::LocationResolver;

/// Event type used when nothing could be classified
pub const DEFAULT_EVENT_TYPE: &str = "MiscellaneousAccidentGeneral";

const TEXT_SEPARATOR: &str = " — ";

static EVENT_ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("TC", "Tropical cyclone"),
        ("TD", "Tropical depression"),
        ("TS", "Tropical storm"),
        ("LPA", "Low pressure area"),
    ]
    .into_iter()
    .filter_map(|(abbr, full)| Regex::new(&format!(r"\b{abbr}\b")).ok().map(|re| (re, full)))
    .collect()
});

/// Column names of the related-incidents table
#[derive(Debug, Clone)]
pub struct IncidentColumns {
    pub incident_type: String,
    pub flood_status: String,
    pub description: String,
    pub date: String,
    pub time: String,
}

impl Default for IncidentColumns {
    fn default() -> Self {
        Self {
            incident_type: "TYPE_OF_INCIDENT".to_string(),
            flood_status: "STATUS_for_flooded_areas".to_string(),
            description: "DESCRIPTION".to_string(),
            date: "DATE_OF_OCCURENCE".to_string(),
            time: "TIME_OF_OCCURENCE".to_string(),
        }
    }
}

/// Keep only the incident rows of a related-incidents table
///
/// A row without any location inherits the previous row's locations. Rows
/// are kept when `none_col` is empty and `baseline_col` is not, which drops
/// the location heading rows and leaves one row per incident.
pub fn collapse_incidents(rows: &[RawTableRow], none_col: &str, baseline_col: &str) -> Vec<RawTableRow> {
    let mut previous: Option<LocationLevels> = None;
    let mut kept = Vec::new();

    for row in rows {
        let mut row = row.clone();
        if row.locations.is_empty() {
            if let Some(levels) = &previous {
                row.locations = levels.clone();
            }
        } else {
            previous = Some(row.locations.clone());
        }

        if row.non_empty_cell(none_col).is_none() && row.non_empty_cell(baseline_col).is_some() {
            kept.push(row);
        }
    }

    kept
}

/// Expand the first cyclone or weather-system abbreviation found
pub fn expand_event_name(name: &str) -> String {
    EVENT_ABBREVIATIONS
        .iter()
        .find(|(re, _)| re.is_match(name))
        .map(|(re, full)| re.replace_all(name, *full).into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// Parse a count that may carry thousands separators
pub fn parse_count(text: &str) -> Option<i64> {
    text.trim().replace(',', "").parse().ok()
}

/// Combine an incident date and time; date-only when the time is unusable
pub fn parse_incident_datetime(date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = date.trim();
    if let Some(time) = time.map(str::trim).filter(|t| !t.is_empty()) {
        let combined = format!("{date} {time}");
        if let Ok(dt) = NaiveDateTime::parse_from_str(&combined, "%d %B %Y %I:%M %p") {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(date, "%d %B %Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Start time of every row; the date column is forward-filled
pub fn normalize_datetime(rows: &[RawTableRow], date_col: &str, time_col: &str) -> Vec<Option<NaiveDateTime>> {
    let mut last_date: Option<&str> = None;

    rows.iter()
        .map(|row| {
            if let Some(date) = row.non_empty_cell(date_col) {
                last_date = Some(date);
            }
            last_date.and_then(|date| parse_incident_datetime(date, row.cell(time_col)))
        })
        .collect()
}

/// Text classified for one incident row
pub fn classification_text(row: &RawTableRow, columns: &IncidentColumns, event_name: &str) -> String {
    let cause = format!("due to {}", expand_event_name(event_name));

    [&columns.incident_type, &columns.flood_status, &columns.description]
        .into_iter()
        .filter_map(|col| row.non_empty_cell(col))
        .map(str::trim)
        .chain(std::iter::once(cause.as_str()))
        .collect::<Vec<_>>()
        .join(TEXT_SEPARATOR)
}

/// Text classified for a whole event
pub fn event_text(event_name: &str, report_name: &str, remarks: &str) -> String {
    let head = format!("{} {}", expand_event_name(event_name), report_name);
    match remarks.split(". ").next().map(str::trim).filter(|s| !s.is_empty()) {
        Some(first_sentence) => format!("{head}: {first_sentence}"),
        None => head,
    }
}

/// Classify a whole event, falling back to `default_type`
pub async fn classify_event(
    classifier: Option<&DisasterClassifier>,
    default_type: &str,
    event_name: &str,
    report_name: &str,
    remarks: &str,
) -> String {
    let Some(classifier) = classifier else {
        return default_type.to_string();
    };

    match classifier
        .classify_one(&event_text(event_name, report_name, remarks))
        .await
    {
        Ok(Classification { label, .. }) => label,
        Err(e) => {
            tracing::warn!("Event classification failed for {}: {}", event_name, e);
            default_type.to_string()
        }
    }
}

/// Resolves and classifies incident rows
pub struct IncidentEnricher {
    resolver: Arc<LocationResolver>,
    classifier: Arc<DisasterClassifier>,
    columns: IncidentColumns,
}

impl IncidentEnricher {
    pub fn new(resolver: Arc<LocationResolver>, classifier: Arc<DisasterClassifier>) -> Self {
        Self {
            resolver,
            classifier,
            columns: IncidentColumns::default(),
        }
    }

    pub fn with_columns(mut self, columns: IncidentColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Collapse, resolve and classify, preserving source order
    ///
    /// `none_col` is the table's first column, empty on incident rows.
    pub async fn enrich(&self, rows: &[RawTableRow], none_col: &str, event_name: &str) -> Result<Vec<ResolvedRow>> {
        let collapsed = collapse_incidents(rows, none_col, &self.columns.incident_type);

        let texts: Vec<String> = collapsed
            .iter()
            .map(|row| classification_text(row, &self.columns, event_name))
            .collect();
        let types = self.classifier.classify(&texts).await?;

        let locations: Vec<String> = collapsed
            .iter()
            .map(|row| row.locations.location_string())
            .collect();
        let resolved = self.resolver.match_locations(&locations);

        let dates = normalize_datetime(&collapsed, &self.columns.date, &self.columns.time);

        let unresolved = resolved.iter().filter(|r| !r.is_resolved()).count();
        tracing::info!(
            "Enriched {} incidents ({} unresolved locations)",
            collapsed.len(),
            unresolved
        );

        Ok(collapsed
            .into_iter()
            .zip(resolved)
            .zip(types)
            .zip(dates)
            .enumerate()
            .map(|(idx, (((row, has_location), has_type), start_date))| ResolvedRow {
                incident_id: idx as u32 + 1,
                row,
                has_location,
                has_type,
                start_date,
            })
            .collect())
    }
}
