//! Page layout model
//!
//! A `DocumentLayout` is the JSON export of an external PDF layout
//! extractor: for every page its size, the positioned words, and the
//! ruled tables it detected (table box, per-row cell boxes and cell text).
//! Boxes use PDF points with the origin at the top-left corner.

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DocumentParser, ParserError, Result};

/// Vertical distance within which words share a text line
pub const DEFAULT_LINE_TOLERANCE: f32 = 3.0;

/// Axis-aligned box `(x0, top, x1, bottom)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BBox {
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self { x0, top, x1, bottom }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Finite coordinates with non-negative extent
    pub fn is_valid(&self) -> bool {
        [self.x0, self.top, self.x1, self.bottom]
            .iter()
            .all(|v| v.is_finite())
            && self.x0 <= self.x1
            && self.top <= self.bottom
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }

    fn validated(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(ParserError::Geometry(format!(
                "({}, {}, {}, {})",
                self.x0, self.top, self.x1, self.bottom
            )))
        }
    }
}

impl From<[f32; 4]> for BBox {
    fn from([x0, top, x1, bottom]: [f32; 4]) -> Self {
        Self { x0, top, x1, bottom }
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.top, b.x1, b.bottom]
    }
}

/// A positioned word on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl Word {
    pub fn bbox(&self) -> BBox {
        BBox::new(self.x0, self.top, self.x1, self.bottom)
    }

    fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

/// One cell of a detected table row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedCell {
    /// Cell box; absent for cells swallowed by a spanning neighbour
    #[serde(default)]
    pub bbox: Option<BBox>,

    /// Extracted cell text
    #[serde(default)]
    pub text: Option<String>,
}

impl DetectedCell {
    pub fn new(bbox: Option<BBox>, text: Option<&str>) -> Self {
        Self {
            bbox,
            text: text.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedRow {
    #[serde(default)]
    pub cells: Vec<DetectedCell>,
}

/// A ruled table found on one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDetection {
    pub bbox: BBox,

    #[serde(default)]
    pub rows: Vec<DetectedRow>,
}

impl TableDetection {
    /// Cell texts row by row
    pub fn texts(&self) -> Vec<Vec<Option<String>>> {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.text.clone()).collect())
            .collect()
    }
}

/// Geometry and content of a single page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-based page number
    pub number: u32,
    pub width: f32,
    pub height: f32,

    #[serde(default)]
    pub words: Vec<Word>,

    #[serde(default)]
    pub tables: Vec<TableDetection>,
}

impl PageLayout {
    pub fn bbox(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width, self.height)
    }

    /// Words whose center falls inside `region`
    pub fn words_in(&self, region: &BBox) -> Result<Vec<&Word>> {
        let region = region.validated()?;
        Ok(self
            .words
            .iter()
            .filter(|w| {
                let (x, y) = w.center();
                region.contains_point(x, y)
            })
            .collect())
    }

    /// Text lines inside `region`, top to bottom
    pub fn lines_in(&self, region: &BBox, tolerance: f32) -> Result<Vec<String>> {
        Ok(group_lines(self.words_in(region)?, tolerance))
    }

    /// Text inside `region`, one line per text line
    pub fn text_in(&self, region: &BBox, tolerance: f32) -> Result<String> {
        Ok(self.lines_in(region, tolerance)?.join("\n"))
    }

    /// Full page text
    pub fn text(&self, tolerance: f32) -> String {
        group_lines(self.words.iter().collect(), tolerance).join("\n")
    }
}

fn group_lines(mut words: Vec<&Word>, tolerance: f32) -> Vec<String> {
    words.sort_by(|a, b| match a.top.total_cmp(&b.top) {
        Ordering::Equal => a.x0.total_cmp(&b.x0),
        other => other,
    });

    let mut lines: Vec<(f32, Vec<&Word>)> = Vec::new();
    for word in words {
        match lines.last_mut() {
            Some((top, line)) if (word.top - *top).abs() <= tolerance => line.push(word),
            _ => lines.push((word.top, vec![word])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut line)| {
            line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            line.iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|l| !l.trim().is_empty())
        .collect()
}

/// Layout of a whole report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// File name of the PDF the layout was extracted from
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ParserError::LayoutError(e.to_string()))
    }

    /// Text of every page, in page order
    pub fn page_texts(&self, tolerance: f32) -> Vec<String> {
        self.pages.iter().map(|p| p.text(tolerance)).collect()
    }
}

/// Reads `DocumentLayout` JSON files
pub struct LayoutJsonParser;

impl DocumentParser for LayoutJsonParser {
    fn parse(&self, path: &Path) -> Result<DocumentLayout> {
        let content = std::fs::read_to_string(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let layout = DocumentLayout::from_json(&content)?;
        tracing::debug!("Read {} pages from {}", layout.pages.len(), path.display());
        Ok(layout)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn word(text: &str, x0: f32, top: f32) -> Word {
        Word {
            text: text.to_string(),
            x0,
            top,
            x1: x0 + 6.0 * text.len() as f32,
            bottom: top + 10.0,
        }
    }

    fn page() -> PageLayout {
        PageLayout {
            number: 1,
            width: 600.0,
            height: 800.0,
            words: vec![
                word("WORLD", 80.0, 101.5),
                word("HELLO", 20.0, 100.0),
                word("second", 20.0, 130.0),
                word("far", 400.0, 500.0),
            ],
            tables: Vec::new(),
        }
    }

    #[test]
    fn test_lines_group_by_top_and_sort_by_x() {
        let p = page();
        let lines = p.lines_in(&BBox::new(0.0, 0.0, 300.0, 200.0), DEFAULT_LINE_TOLERANCE).unwrap();
        assert_eq!(lines, vec!["HELLO WORLD", "second"]);
        assert_eq!(p.text(DEFAULT_LINE_TOLERANCE).lines().count(), 3);
    }

    #[test]
    fn test_words_in_uses_word_center() {
        let p = page();
        // "far" spans 400..418 horizontally, center 409
        assert_eq!(p.words_in(&BBox::new(405.0, 495.0, 420.0, 520.0)).unwrap().len(), 1);
        assert!(p.words_in(&BBox::new(410.0, 495.0, 420.0, 520.0)).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_region_is_geometry_error() {
        let p = page();
        let err = p.words_in(&BBox::new(10.0, 50.0, 5.0, 60.0)).unwrap_err();
        assert!(matches!(err, ParserError::Geometry(_)));
        assert!(p.words_in(&BBox::new(f32::NAN, 0.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_layout_json_file() {
        let json = r#"{
            "source": "SitRep_No_1_for_TC_Kristine.pdf",
            "pages": [{
                "number": 1, "width": 612, "height": 792,
                "words": [{"text": "REGION", "x0": 10, "top": 10, "x1": 50, "bottom": 20}],
                "tables": [{
                    "bbox": [0, 100, 612, 400],
                    "rows": [{"cells": [{"bbox": [0, 100, 200, 120], "text": "REGION"}, {"text": null}]}]
                }]
            }]
        }"#;

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let layout = LayoutJsonParser.parse(file.path()).unwrap();
        assert_eq!(layout.source.as_deref(), Some("SitRep_No_1_for_TC_Kristine.pdf"));
        let table = &layout.pages[0].tables[0];
        assert_eq!(table.bbox.bottom, 400.0);
        assert_eq!(table.texts(), vec![vec![Some("REGION".to_string()), None]]);
        assert!(table.rows[0].cells[1].bbox.is_none());
    }

    #[test]
    fn test_malformed_layout() {
        assert!(matches!(
            DocumentLayout::from_json("{\"pages\": [{}]}"),
            Err(ParserError::LayoutError(_))
        ));
    }
}
