//! Gazetteer, resolver and classifier integration tests
//!
//! Runs against an inline N-Triples gazetteer and taxonomy with the
//! deterministic hashing embedder, so no files or network are needed.

use std::sync::Arc;

use sakuna_core::{DivisionId, DivisionRef, HierarchyLevel, RawTableRow};
use sakuna_extractor::{
    DisasterClassifier, DisasterTaxonomy, GazetteerIndex, IncidentEnricher, LocationResolver,
};
use sakuna_graph::TripleStore;
use sakuna_parser::detect_headers;
use sakuna_vector::{CachedEmbedding, EmbeddingClient, HashingEmbedding};

const NS: &str = "https://sakuna.ph/";
const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
const SUB: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
const DEF: &str = "http://www.w3.org/2004/02/skos/core#definition";

fn division(s: &str, class: &str, label: &str, parent: Option<&str>) -> String {
    let mut out = format!("<{NS}{s}> <{TYPE}> <{NS}{class}> .\n<{NS}{s}> <{LABEL}> \"{label}\" .\n");
    if let Some(p) = parent {
        out.push_str(&format!("<{NS}{s}> <{NS}isPartOf> <{NS}{p}> .\n"));
    }
    out
}

fn category(class: &str, parent: &str, definition: Option<&str>) -> String {
    let mut out = format!("<{NS}{class}> <{SUB}> <{NS}{parent}> .\n");
    if let Some(d) = definition {
        out.push_str(&format!("<{NS}{class}> <{DEF}> \"{d}\"@en .\n"));
    }
    out
}

fn gazetteer() -> Arc<GazetteerIndex> {
    let source = [
        division("Region_IV-A", "Region", "Region IV-A", None),
        division("National_Capital_Region", "Region", "National Capital Region", None),
        division("Laguna", "Province", "Laguna", Some("Region_IV-A")),
        division("Batangas", "Province", "Batangas", Some("Region_IV-A")),
        division("City_of_Calamba", "City", "City of Calamba", Some("Laguna")),
        division("Santa_Cruz", "Municipality", "Santa Cruz", Some("Laguna")),
        division("Nasugbu", "Municipality", "Nasugbu", Some("Batangas")),
        division("City_of_Manila", "City", "City of Manila", Some("National_Capital_Region")),
    ]
    .concat();

    let store = TripleStore::from_ntriples(&source).unwrap();
    Arc::new(GazetteerIndex::from_store(&store, NS).unwrap())
}

fn taxonomy() -> DisasterTaxonomy {
    let source = [
        category("NaturalHazard", "DisasterType", Some("Hazards of natural origin.")),
        category("HumanInduced", "DisasterType", None),
        category(
            "Flood",
            "NaturalHazard",
            Some("Overflowing of water onto land that is normally dry, caused by heavy rains, swollen rivers or storm surge."),
        ),
        category(
            "Earthquake",
            "NaturalHazard",
            Some("Sudden shaking of the ground caused by the movement of tectonic plates or volcanic activity."),
        ),
        category(
            "Landslide",
            "NaturalHazard",
            Some("Movement of rock, debris or earth down a slope, often triggered by prolonged rainfall."),
        ),
        category("StructuralFire", "HumanInduced", Some("Fire that burns a house, building or other structure.")),
        category(
            "MiscellaneousAccidentGeneral",
            "HumanInduced",
            Some("An accident that is not covered by any other category, such as drowning or vehicular accidents."),
        ),
    ]
    .concat();

    let store = TripleStore::from_ntriples(&source).unwrap();
    DisasterTaxonomy::from_store(&store, &format!("{NS}DisasterType")).unwrap()
}

async fn classifier() -> DisasterClassifier {
    let client: Arc<dyn EmbeddingClient> = Arc::new(HashingEmbedding::default());
    DisasterClassifier::new(taxonomy(), client).await.unwrap()
}

fn id(local: &str) -> DivisionRef {
    DivisionRef::division(DivisionId::new(format!("{NS}{local}")))
}

// =============================================================================
// Location Resolution
// =============================================================================

#[test]
fn test_city_resolves_to_official_name() {
    let resolver = LocationResolver::new(gazetteer());
    let out = resolver.match_locations(&["Calamba City,Laguna,Region IV-A"]);

    assert_eq!(out, vec![id("City_of_Calamba")]);
    let ids = out[0].ids();
    let record = resolver.gazetteer().division(ids[0]).unwrap();
    assert_eq!(record.label, "City of Calamba");
}

#[test]
fn test_region_aliases() {
    let resolver = LocationResolver::new(gazetteer());
    let out = resolver.match_locations(&["NCR", "Metro Manila", "Region 4"]);

    assert_eq!(out[0], id("National_Capital_Region"));
    assert_eq!(out[1], id("National_Capital_Region"));
    assert_eq!(out[2].ids().len(), 2);
    assert_eq!(out[2].ids()[0].as_str(), "https://sakuna.ph/Region_IV-A");
    assert_eq!(out[2].ids()[1].as_str(), "https://sakuna.ph/Region_IV-B");
}

#[test]
fn test_one_typo_province_matches_exact_name() {
    let resolver = LocationResolver::new(gazetteer());
    let out = resolver.match_locations(&["Lagunna,Region IV-A", "Laguna,Region IV-A"]);
    assert_eq!(out[0], out[1]);
    assert_eq!(out[0], id("Laguna"));
}

#[test]
fn test_low_similarity_province_falls_back_to_region() {
    let resolver = LocationResolver::new(gazetteer());
    let out = resolver.match_locations(&["Lgna,Region IV-A", "Lgna"]);
    assert_eq!(out[0], id("Region_IV-A"));
    assert!(!out[1].is_resolved());
}

#[test]
fn test_resolution_is_idempotent() {
    let resolver = LocationResolver::new(gazetteer());
    let inputs = [
        "Calamba City,Laguna,Region IV-A",
        "Nasugbu,Batangas,CALABARZON",
        "Manila,NCR",
        "",
        "Visayas",
    ];
    let first = serde_json::to_string(&resolver.match_locations(&inputs)).unwrap();
    let second = serde_json::to_string(&resolver.match_locations(&inputs)).unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Classification
// =============================================================================

#[tokio::test]
async fn test_flood_text_scores_above_earthquake() {
    let classifier = classifier().await;
    let text = "flood waters rose in the barangay";

    let top = classifier.classify_one(text).await.unwrap();
    assert_eq!(top.label, "Flood");

    let scores = classifier.scores(text).await.unwrap();
    let score_of = |label: &str| scores.iter().find(|(l, _)| l == label).map(|(_, s)| *s).unwrap();
    assert!(score_of("Flood") > score_of("Earthquake"));
    assert!((score_of("Flood") - top.score).abs() < 1e-6);
}

#[tokio::test]
async fn test_only_leaf_categories_are_targets() {
    let classifier = classifier().await;
    let labels: Vec<&str> = classifier.categories().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Flood", "Earthquake", "Landslide", "StructuralFire", "MiscellaneousAccidentGeneral"]
    );
}

#[tokio::test]
async fn test_classification_is_deterministic() {
    let classifier = classifier().await;
    let texts = vec![
        "house fire along the highway".to_string(),
        "ground shaking felt".to_string(),
    ];

    let first = classifier.classify(&texts).await.unwrap();
    let second = classifier.classify(&texts).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].label, "StructuralFire");
    assert_eq!(first[1].label, "Earthquake");
}

#[tokio::test]
async fn test_cached_client_matches_uncached() {
    let inner: Arc<dyn EmbeddingClient> = Arc::new(HashingEmbedding::default());
    let cached: Arc<dyn EmbeddingClient> = Arc::new(CachedEmbedding::new(inner, 100));
    let classifier = DisasterClassifier::new(taxonomy(), cached).await.unwrap();

    let plain = self::classifier().await;
    let text = "flooded streets after heavy rain".to_string();
    assert_eq!(
        classifier.classify_one(&text).await.unwrap(),
        plain.classify_one(&text).await.unwrap()
    );
}

// =============================================================================
// Incident Enrichment
// =============================================================================

#[tokio::test]
async fn test_enrich_related_incidents() {
    let resolver = Arc::new(LocationResolver::new(gazetteer()));
    let classifier = Arc::new(classifier().await);
    let enricher = IncidentEnricher::new(resolver, classifier);

    let mut heading = RawTableRow::new(4);
    heading.locations.set(HierarchyLevel::Region, "REGION IV-A");
    heading.locations.set(HierarchyLevel::Province, "LAGUNA");
    heading.locations.set(HierarchyLevel::Municipality, "Calamba City");
    heading.push_cell("LOCATION", "Calamba City");
    heading.push_cell("TYPE_OF_INCIDENT", "");

    let mut incident = RawTableRow::new(4);
    incident.locations = heading.locations.clone();
    incident.push_cell("LOCATION", "");
    incident.push_cell("TYPE_OF_INCIDENT", "Flooding");
    incident.push_cell("DATE_OF_OCCURENCE", "24 October 2024");
    incident.push_cell("TIME_OF_OCCURENCE", "3:00 PM");
    incident.push_cell("DESCRIPTION", "Knee-deep flood water in low-lying areas");

    let rows = enricher
        .enrich(&[heading, incident], "LOCATION", "TS Kristine")
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].incident_id, 1);
    assert_eq!(rows[0].has_location, id("City_of_Calamba"));
    assert_eq!(rows[0].has_type.label, "Flood");
    assert_eq!(
        rows[0].start_date.map(|d| d.to_string()).as_deref(),
        Some("2024-10-24 15:00:00")
    );

    let json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(json["TYPE_OF_INCIDENT"], "Flooding");
    assert_eq!(json["hasType"]["label"], "Flood");
}

#[tokio::test]
async fn test_wrapped_header_columns_reach_enrichment() {
    let table: Vec<Vec<Option<String>>> = [
        ["REGION / PROVINCE", "TYPE OF\nINCIDENT", "DATE OF\nOCCURENCE", "TIME OF\nOCCURENCE"],
        ["REGION IV-A", "Flooding", "24 October 2024", "3:00 PM"],
    ]
    .iter()
    .map(|row| row.iter().map(|c| Some(c.to_string())).collect())
    .collect();

    let header = detect_headers(&table, 8).unwrap();
    assert_eq!(header.data_start, 1);

    let mut incident = RawTableRow::new(2);
    incident.locations.set(HierarchyLevel::Region, "REGION IV-A");
    incident.locations.set(HierarchyLevel::Province, "LAGUNA");
    incident.locations.set(HierarchyLevel::Municipality, "Calamba City");
    incident.push_cell(header.column_name(0), "");
    for (idx, value) in table[1].iter().enumerate().skip(1) {
        incident.push_cell(header.column_name(idx), value.clone().unwrap_or_default());
    }

    let resolver = Arc::new(LocationResolver::new(gazetteer()));
    let enricher = IncidentEnricher::new(resolver, Arc::new(classifier().await));
    let rows = enricher
        .enrich(&[incident], &header.column_name(0), "Shear Line")
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].row.cell("DATE_OF_OCCURENCE"), Some("24 October 2024"));
    assert_eq!(
        rows[0].start_date.map(|d| d.to_string()).as_deref(),
        Some("2024-10-24 15:00:00")
    );
}
