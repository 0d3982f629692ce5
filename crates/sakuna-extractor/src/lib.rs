//! Sakuna Extractor - Location resolution and disaster-type classification
//!
//! Resolves free-text locations against the administrative gazetteer,
//! classifies incident text into the disaster taxonomy, and enriches the
//! related-incidents table of a report with both.

pub mod classifier;
pub mod gazetteer;
pub mod incidents;
pub mod location;
pub mod regions;
pub mod similarity;
pub mod taxonomy;

pub use classifier::DisasterClassifier;
pub use gazetteer::GazetteerIndex;
pub use incidents::{
    classify_event, collapse_incidents, expand_event_name, normalize_datetime, parse_count,
    IncidentColumns, IncidentEnricher, DEFAULT_EVENT_TYPE,
};
pub use location::LocationResolver;
pub use similarity::{SimilarityScorer, TokenSortLevenshtein, TokenSortRatio};
pub use taxonomy::DisasterTaxonomy;
