//! Sakuna Parser - Report layout parsing and table structure recovery
//!
//! Works on page layouts exported by an external PDF layout extractor:
//! - Page geometry (words, detected tables, cell boxes)
//! - Multi-row header detection and merging
//! - Hierarchical row-label carry-forward and summary rows
//! - Cross-page table title tracking
//! - Report metadata, narrative and date extraction
//!
//! Each layout source implements the `DocumentParser` trait and produces
//! a `DocumentLayout` that the `TableRecoverer` and `ReportParser`
//! turn into logical tables and report metadata.

use std::path::Path;
use thiserror::Error;

pub mod dates;
pub mod header;
pub mod layout;
pub mod narrative;
pub mod report;
pub mod table;
pub mod title;

pub use header::{detect_headers, HeaderSpec};
pub use layout::{BBox, DetectedCell, DetectedRow, DocumentLayout, LayoutJsonParser, PageLayout, TableDetection, Word};
pub use report::{clean_filename, ParsedReport, ReportMetadata, ReportParser};
pub use table::{Alignment, LogicalTable, RecoveredTables, TableRecoverer, TextCase};
pub use title::{clean_tablename, TableTitle, TitleTracker};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while reading page layouts
#[derive(Error, Debug)]
pub enum ParserError {
    /// File format is not supported
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// IO error while reading the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Layout document is not valid JSON or misses required fields
    #[error("Malformed page layout: {0}")]
    LayoutError(String),

    /// A bounding box cannot be used to select page content
    #[error("Invalid cell geometry: {0}")]
    Geometry(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

// ============================================================================
// Parser Trait
// ============================================================================

/// Trait for page-layout sources
pub trait DocumentParser: Send + Sync {
    /// Read the layout of one report
    fn parse(&self, path: &Path) -> Result<DocumentLayout>;

    /// File extensions this parser understands (lower-case, no dot)
    fn supported_extensions(&self) -> &[&str];

    /// Check if this parser can handle a path
    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.supported_extensions().iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}

/// Registry of available layout parsers
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Register a parser
    pub fn register<P: DocumentParser + 'static>(&mut self, parser: P) {
        self.parsers.push(Box::new(parser));
    }

    /// Find a parser for a path
    pub fn find_parser(&self, path: &Path) -> Option<&dyn DocumentParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(path))
            .map(|p| p.as_ref())
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path) -> Result<DocumentLayout> {
        let parser = self.find_parser(path).ok_or_else(|| {
            ParserError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("none")
                    .to_string(),
            )
        })?;

        parser.parse(path)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(LayoutJsonParser);
        registry
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_finds_layout_parser() {
        let registry = ParserRegistry::default();
        assert!(registry.find_parser(Path::new("report.json")).is_some());
        assert!(registry.find_parser(Path::new("REPORT.JSON")).is_some());
        assert!(registry.find_parser(Path::new("report.pdf")).is_none());
    }

    #[test]
    fn test_registry_rejects_unknown_format() {
        let registry = ParserRegistry::default();
        let err = registry.parse(Path::new("report.docx")).unwrap_err();
        assert!(matches!(err, ParserError::UnsupportedFormat(ext) if ext == "docx"));
    }
}
