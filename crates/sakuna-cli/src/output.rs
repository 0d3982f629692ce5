//! Per-report output folders
//!
//! Reports are grouped by event: each one lands in
//! `<out>/<event_name>/<report_stem>/`, so reports of the same event sit
//! side by side. A report is written to a hidden staging folder inside
//! the event folder first and renamed into place once every file is on
//! disk. Staging is removed on every failure path.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;

pub const METADATA_FILE: &str = "metadata.json";
pub const SOURCE_FILE: &str = "source.json";
pub const ENRICHED_SUFFIX: &str = ".enriched.json";

/// Everything produced for one report
#[derive(Debug, Clone)]
pub struct ReportOutput {
    /// Event folder under the output directory
    pub event_name: String,

    /// Source report name; its stem names the report folder
    pub report_name: String,

    /// Unique per report; names the staging folder
    pub report_id: String,

    /// Rows of every recovered table keyed by table title
    pub tables: Vec<(String, Value)>,

    pub metadata: Value,
    pub source: Value,

    /// Enriched incident rows keyed by the incidents table title
    pub enriched: Option<(String, Value)>,
}

/// Make a title or event name safe to use as a single path component
pub fn path_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.trim_start_matches('.') {
        "" => "unnamed".to_string(),
        s => s.to_string(),
    }
}

fn write_json(path: &Path, value: &Value) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

/// Folder name of a report within its event folder
pub fn report_folder(report_name: &str) -> String {
    let name = report_name.trim();
    let stem = match name.len().checked_sub(4).and_then(|i| name.get(i..).map(|ext| (i, ext))) {
        Some((i, ext)) if ext.eq_ignore_ascii_case(".pdf") => &name[..i],
        _ => name,
    };
    path_component(stem)
}

/// Write a report and move it into place, replacing an older copy of the same report
pub fn write_report(out_dir: &Path, report: &ReportOutput) -> anyhow::Result<PathBuf> {
    let event_dir = out_dir.join(path_component(&report.event_name));
    fs::create_dir_all(&event_dir).with_context(|| format!("creating {}", event_dir.display()))?;

    let staging = event_dir.join(format!(".{}.partial", path_component(&report.report_id)));
    let target = event_dir.join(report_folder(&report.report_name));

    if let Err(e) = stage_and_publish(&staging, &target, report) {
        if staging.exists() {
            let _ = fs::remove_dir_all(&staging);
        }
        return Err(e);
    }

    tracing::debug!("Wrote {} tables to {}", report.tables.len(), target.display());
    Ok(target)
}

fn stage_and_publish(staging: &Path, target: &Path, report: &ReportOutput) -> anyhow::Result<()> {
    if staging.exists() {
        fs::remove_dir_all(staging)?;
    }
    fs::create_dir_all(staging).with_context(|| format!("creating {}", staging.display()))?;
    write_files(staging, report)?;

    if target.exists() {
        fs::remove_dir_all(target).with_context(|| format!("replacing {}", target.display()))?;
    }
    fs::rename(staging, target).with_context(|| format!("moving output to {}", target.display()))
}

fn write_files(dir: &Path, report: &ReportOutput) -> anyhow::Result<()> {
    for (title, rows) in &report.tables {
        write_json(&dir.join(format!("{}.json", path_component(title))), rows)?;
    }
    write_json(&dir.join(METADATA_FILE), &report.metadata)?;
    write_json(&dir.join(SOURCE_FILE), &report.source)?;

    if let Some((title, rows)) = &report.enriched {
        write_json(&dir.join(format!("{}{ENRICHED_SUFFIX}", path_component(title))), rows)?;
    }
    Ok(())
}
