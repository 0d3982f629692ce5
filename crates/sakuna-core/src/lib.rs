//! Sakuna Core - Domain models, errors, and shared types
//!
//! This crate defines the core abstractions used throughout the Sakuna ETL:
//! - Administrative divisions and resolution results
//! - Disaster-type categories and classifications
//! - Row records produced by table recovery and enrichment
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, EmbeddingConfig, EmbeddingProvider, GazetteerConfig, LoggingConfig,
    ParserConfig, PipelineConfig, ResolverConfig, ScorerKind, TaxonomyConfig,
};

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Reference data (gazetteer or taxonomy graph) could not be loaded
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read reference data {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed reference data at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Malformed reference data: {0}")]
    Malformed(String),
}

/// Core error types for Sakuna operations
#[derive(Error, Debug)]
pub enum SakunaError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to process document {document}: {message}")]
    Document { document: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SakunaError>;

// ============================================================================
// Administrative Divisions
// ============================================================================

/// Level of a division in the administrative hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    Region,
    Province,
    /// Municipalities and component/independent cities
    Municipality,
}

impl std::fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Region => write!(f, "region"),
            Self::Province => write!(f, "province"),
            Self::Municipality => write!(f, "municipality"),
        }
    }
}

/// Stable identifier (IRI) of a division in the gazetteer graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DivisionId(String);

impl DivisionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DivisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node in the administrative hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdministrativeDivision {
    pub id: DivisionId,

    /// Display label as found in the gazetteer
    pub label: String,

    pub level: AdminLevel,

    /// Containing division (none for regions)
    pub parent: Option<DivisionId>,
}

/// Outcome of resolving one location string
///
/// Exactly one value is produced per input string, so outputs can be
/// zipped back onto their rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DivisionRef {
    /// A single gazetteer division
    Division { id: DivisionId },

    /// National or island-group name, passed through unresolved
    Area { name: String },

    /// Legacy region code that now covers several regions
    Split { ids: Vec<DivisionId> },

    /// Nothing cleared a matching threshold
    Unresolved { text: String },
}

impl DivisionRef {
    pub fn division(id: DivisionId) -> Self {
        Self::Division { id }
    }

    pub fn unresolved(text: impl Into<String>) -> Self {
        Self::Unresolved { text: text.into() }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved { .. })
    }

    /// Gazetteer identifiers carried by this reference
    pub fn ids(&self) -> Vec<&DivisionId> {
        match self {
            Self::Division { id } => vec![id],
            Self::Split { ids } => ids.iter().collect(),
            Self::Area { .. } | Self::Unresolved { .. } => Vec::new(),
        }
    }
}

impl std::fmt::Display for DivisionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Division { id } => write!(f, "{id}"),
            Self::Area { name } => write!(f, "{name}"),
            Self::Split { ids } => {
                let joined: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
                write!(f, "{}", joined.join("|"))
            }
            Self::Unresolved { text } => write!(f, "unresolved:{text}"),
        }
    }
}

// ============================================================================
// Disaster Taxonomy
// ============================================================================

/// A leaf category of the disaster-type taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterCategory {
    /// Taxonomy leaf label (IRI local name)
    pub label: String,

    /// Definitional text used as the matching anchor
    pub definition: String,

    /// Embedding of `definition`; empty until the classifier embeds it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl DisasterCategory {
    pub fn new(label: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            definition: definition.into(),
            embedding: Vec::new(),
        }
    }
}

/// Best-matching category for a text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,

    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

// ============================================================================
// Row Records
// ============================================================================

/// Hierarchical level a table row label belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    Region,
    Province,
    Municipality,
    Barangay,
}

/// Carried-forward location labels of a table row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationLevels {
    pub region: Option<String>,
    pub province: Option<String>,
    pub city_muni: Option<String>,
    pub barangay: Option<String>,
}

impl LocationLevels {
    /// Set a level and clear every deeper level
    pub fn set(&mut self, level: HierarchyLevel, label: impl Into<String>) {
        let label = Some(label.into());
        match level {
            HierarchyLevel::Region => {
                *self = Self {
                    region: label,
                    ..Default::default()
                };
            }
            HierarchyLevel::Province => {
                self.province = label;
                self.city_muni = None;
                self.barangay = None;
            }
            HierarchyLevel::Municipality => {
                self.city_muni = label;
                self.barangay = None;
            }
            HierarchyLevel::Barangay => self.barangay = label,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_none()
            && self.province.is_none()
            && self.city_muni.is_none()
            && self.barangay.is_none()
    }

    /// Comma-joined location string, most specific level first
    pub fn location_string(&self) -> String {
        [&self.city_muni, &self.province, &self.region]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// One data row recovered from a logical table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTableRow {
    /// 1-based page the row was read from
    pub page: u32,

    /// Location labels; all empty on summary rows
    pub locations: LocationLevels,

    pub is_summary: bool,

    /// Matched summary text (e.g. "GRAND TOTAL")
    pub summary_type: Option<String>,

    /// Remaining cells keyed by merged header name, in column order
    pub cells: Vec<(String, String)>,
}

impl RawTableRow {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    /// Cell value by header name
    pub fn cell(&self, name: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Cell value, treating empty strings as absent
    pub fn non_empty_cell(&self, name: &str) -> Option<&str> {
        self.cell(name).filter(|v| !v.trim().is_empty())
    }

    pub fn push_cell(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cells.push((name.into(), value.into()));
    }
}

impl Serialize for RawTableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6 + self.cells.len()))?;
        map.serialize_entry("Page", &self.page)?;
        map.serialize_entry("Region", &self.locations.region)?;
        map.serialize_entry("Province", &self.locations.province)?;
        map.serialize_entry("City_Muni", &self.locations.city_muni)?;
        map.serialize_entry("Barangay", &self.locations.barangay)?;
        map.serialize_entry("Summary_Type", &self.summary_type)?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A row after location resolution and type classification
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRow {
    /// 1-based position within the collapsed incident list
    pub incident_id: u32,

    #[serde(flatten)]
    pub row: RawTableRow,

    #[serde(rename = "hasLocation")]
    pub has_location: DivisionRef,

    #[serde(rename = "hasType")]
    pub has_type: Classification,

    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDateTime>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_levels_reset_deeper() {
        let mut levels = LocationLevels::default();
        levels.set(HierarchyLevel::Region, "REGION IV-A");
        levels.set(HierarchyLevel::Province, "LAGUNA");
        levels.set(HierarchyLevel::Municipality, "Calamba City");
        levels.set(HierarchyLevel::Barangay, "Bucal");

        levels.set(HierarchyLevel::Province, "BATANGAS");
        assert_eq!(levels.region.as_deref(), Some("REGION IV-A"));
        assert_eq!(levels.province.as_deref(), Some("BATANGAS"));
        assert!(levels.city_muni.is_none());
        assert!(levels.barangay.is_none());

        levels.set(HierarchyLevel::Region, "NCR");
        assert!(levels.province.is_none());
    }

    #[test]
    fn test_location_string_skips_missing_levels() {
        let levels = LocationLevels {
            region: Some("Region IV-A".to_string()),
            province: None,
            city_muni: Some("Calamba City".to_string()),
            barangay: Some("Bucal".to_string()),
        };
        assert_eq!(levels.location_string(), "Calamba City,Region IV-A");
        assert_eq!(LocationLevels::default().location_string(), "");
    }

    #[test]
    fn test_division_ref_ids() {
        let split = DivisionRef::Split {
            ids: vec![DivisionId::new("a"), DivisionId::new("b")],
        };
        assert_eq!(split.ids().len(), 2);
        assert!(split.is_resolved());
        assert!(!DivisionRef::unresolved("x").is_resolved());
        assert_eq!(split.to_string(), "a|b");
    }

    #[test]
    fn test_raw_row_serializes_in_column_order() {
        let mut row = RawTableRow::new(3);
        row.locations.set(HierarchyLevel::Province, "LAGUNA");
        row.push_cell("TYPE_OF_INCIDENT", "Flooding");
        row.push_cell("QTY", "");

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.starts_with("{\"Page\":3,\"Region\":null,\"Province\":\"LAGUNA\""));
        assert!(json.ends_with("\"TYPE_OF_INCIDENT\":\"Flooding\",\"QTY\":\"\"}"));
        assert_eq!(row.non_empty_cell("QTY"), None);
        assert_eq!(row.cell("QTY"), Some(""));
    }
}
