//! Gazetteer index over the administrative-hierarchy graph
//!
//! Built once at startup and shared read-only by every resolver call.

use std::collections::HashMap;

use sakuna_core::{AdminLevel, AdministrativeDivision, DivisionId, GazetteerConfig, LoadError};
use sakuna_graph::vocab::{self, skg};
use sakuna_graph::{Term, TripleStore};

/// A municipality or city with its case-folded label
#[derive(Debug, Clone)]
pub struct MunicipalityEntry {
    pub id: DivisionId,
    pub label: String,
    pub parent: Option<DivisionId>,
}

/// In-memory lookup tables for regions, provinces and municipalities
#[derive(Debug, Default)]
pub struct GazetteerIndex {
    namespace: String,
    divisions: HashMap<DivisionId, AdministrativeDivision>,

    /// Case-folded province label to id, first-encountered wins
    provinces: HashMap<String, DivisionId>,
    province_labels: Vec<String>,

    /// Municipalities in graph order
    municipalities: Vec<MunicipalityEntry>,

    /// Case-folded municipality label to id, first-encountered wins
    municipalities_rev: HashMap<String, DivisionId>,
    municipality_labels: Vec<String>,
}

impl GazetteerIndex {
    /// Load the gazetteer graph named by `config`
    pub fn load(config: &GazetteerConfig) -> Result<Self, LoadError> {
        let store = TripleStore::load(&config.path)?;
        Self::from_store(&store, &config.namespace)
    }

    /// Build the index from an already loaded graph
    pub fn from_store(store: &TripleStore, namespace: &str) -> Result<Self, LoadError> {
        let mut index = Self {
            namespace: namespace.to_string(),
            ..Default::default()
        };

        let label = Term::iri(vocab::RDFS_LABEL);
        let part_of = Term::iri(vocab::term(namespace, skg::IS_PART_OF));

        for subject in store.subjects_of_type(&vocab::term(namespace, skg::REGION)) {
            let Some(iri) = subject.as_iri() else { continue };
            let name = store
                .value(subject, &label)
                .map(|t| t.value().to_string())
                .unwrap_or_else(|| sakuna_graph::local_name(iri).replace('_', " "));
            index.insert(iri, name, AdminLevel::Region, None);
        }

        for subject in store.subjects_of_type(&vocab::term(namespace, skg::PROVINCE)) {
            let Some(iri) = subject.as_iri() else { continue };
            let name = required_label(store, subject, &label, iri)?;
            let parent = store.value(subject, &part_of).and_then(Term::as_iri);

            let key = name.to_lowercase();
            if !index.provinces.contains_key(&key) {
                index.provinces.insert(key.clone(), DivisionId::new(iri));
                index.province_labels.push(key);
            }
            index.insert(iri, name, AdminLevel::Province, parent);
        }

        for class in [skg::MUNICIPALITY, skg::CITY] {
            for subject in store.subjects_of_type(&vocab::term(namespace, class)) {
                let Some(iri) = subject.as_iri() else { continue };
                let id = DivisionId::new(iri);
                if index.divisions.contains_key(&id) {
                    continue;
                }

                let name = required_label(store, subject, &label, iri)?;
                let parent = store
                    .value(subject, &part_of)
                    .and_then(Term::as_iri)
                    .map(DivisionId::new);

                let key = name.to_lowercase();
                if !index.municipalities_rev.contains_key(&key) {
                    index.municipalities_rev.insert(key.clone(), id.clone());
                    index.municipality_labels.push(key.clone());
                }
                index.municipalities.push(MunicipalityEntry {
                    id,
                    label: key,
                    parent: parent.clone(),
                });
                index.insert(iri, name, AdminLevel::Municipality, parent.as_ref().map(DivisionId::as_str));
            }
        }

        if index.provinces.is_empty() && index.municipalities.is_empty() {
            return Err(LoadError::Malformed(
                "gazetteer has no provinces or municipalities".to_string(),
            ));
        }

        tracing::info!(
            "Gazetteer loaded: {} provinces, {} municipalities",
            index.provinces.len(),
            index.municipalities.len()
        );
        Ok(index)
    }

    fn insert(&mut self, iri: &str, label: String, level: AdminLevel, parent: Option<&str>) {
        let id = DivisionId::new(iri);
        self.divisions.entry(id.clone()).or_insert(AdministrativeDivision {
            id,
            label,
            level,
            parent: parent.map(DivisionId::new),
        });
    }

    /// Namespace used for region and area identifiers
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Identifier of a region given its local name
    pub fn region_id(&self, local: &str) -> DivisionId {
        DivisionId::new(vocab::term(&self.namespace, local))
    }

    pub fn division(&self, id: &DivisionId) -> Option<&AdministrativeDivision> {
        self.divisions.get(id)
    }

    /// Province by case-folded label
    pub fn province(&self, label: &str) -> Option<&DivisionId> {
        self.provinces.get(label)
    }

    /// Case-folded province labels in graph order
    pub fn province_labels(&self) -> impl Iterator<Item = &str> {
        self.province_labels.iter().map(String::as_str)
    }

    pub fn municipalities(&self) -> &[MunicipalityEntry] {
        &self.municipalities
    }

    /// Municipality by case-folded label
    pub fn municipality(&self, label: &str) -> Option<&DivisionId> {
        self.municipalities_rev.get(label)
    }

    /// Distinct case-folded municipality labels in graph order
    pub fn municipality_labels(&self) -> impl Iterator<Item = &str> {
        self.municipality_labels.iter().map(String::as_str)
    }

    pub fn parent_of(&self, id: &DivisionId) -> Option<&DivisionId> {
        self.divisions.get(id).and_then(|d| d.parent.as_ref())
    }

    pub fn province_count(&self) -> usize {
        self.provinces.len()
    }

    pub fn municipality_count(&self) -> usize {
        self.municipalities.len()
    }
}

fn required_label(
    store: &TripleStore,
    subject: &Term,
    label: &Term,
    iri: &str,
) -> Result<String, LoadError> {
    store
        .value(subject, label)
        .map(|t| t.value().to_string())
        .ok_or_else(|| LoadError::Malformed(format!("{iri} has no rdfs:label")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "https://sakuna.ph/";

    fn nt(lines: &[(&str, &str, &str)]) -> String {
        lines
            .iter()
            .map(|(s, p, o)| {
                let p = match *p {
                    "a" => vocab::RDF_TYPE.to_string(),
                    "label" => vocab::RDFS_LABEL.to_string(),
                    other => format!("{NS}{other}"),
                };
                let o = if let Some(lit) = o.strip_prefix('"') {
                    format!("\"{lit}")
                } else {
                    format!("<{NS}{o}>")
                };
                format!("<{NS}{s}> <{p}> {o} .\n")
            })
            .collect()
    }

    fn sample() -> TripleStore {
        let source = nt(&[
            ("Region_IV-A", "a", "Region"),
            ("Laguna", "a", "Province"),
            ("Laguna", "label", "\"Laguna\""),
            ("Laguna", "isPartOf", "Region_IV-A"),
            ("Calamba", "a", "City"),
            ("Calamba", "label", "\"City of Calamba\""),
            ("Calamba", "isPartOf", "Laguna"),
            ("Bay", "a", "Municipality"),
            ("Bay", "label", "\"Bay\""),
            ("Bay", "isPartOf", "Laguna"),
            ("Bay_2", "a", "Municipality"),
            ("Bay_2", "label", "\"Bay\""),
        ]);
        TripleStore::from_ntriples(&source).unwrap()
    }

    #[test]
    fn test_index_lookups() {
        let index = GazetteerIndex::from_store(&sample(), NS).unwrap();

        let laguna = index.province("laguna").unwrap();
        assert_eq!(laguna.as_str(), "https://sakuna.ph/Laguna");
        assert_eq!(index.province_count(), 1);

        let calamba = index.municipality("city of calamba").unwrap();
        let record = index.division(calamba).unwrap();
        assert_eq!(record.level, AdminLevel::Municipality);
        assert_eq!(record.label, "City of Calamba");
        assert_eq!(index.parent_of(calamba), Some(laguna));

        let region = index.division(&index.region_id("Region_IV-A")).unwrap();
        assert_eq!(region.level, AdminLevel::Region);
        assert_eq!(region.label, "Region IV-A");
    }

    #[test]
    fn test_duplicate_label_keeps_first() {
        let index = GazetteerIndex::from_store(&sample(), NS).unwrap();
        assert_eq!(index.municipality("bay").unwrap().as_str(), "https://sakuna.ph/Bay");
        assert_eq!(index.municipality_count(), 3);
        assert_eq!(index.municipality_labels().count(), 2);
    }

    #[test]
    fn test_missing_label_is_malformed() {
        let source = nt(&[("Bay", "a", "Municipality")]);
        let store = TripleStore::from_ntriples(&source).unwrap();
        assert!(matches!(
            GazetteerIndex::from_store(&store, NS),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_graph_is_malformed() {
        let store = TripleStore::from_ntriples("").unwrap();
        assert!(GazetteerIndex::from_store(&store, NS).is_err());
    }

    #[test]
    fn test_unreadable_file() {
        let config = GazetteerConfig {
            path: "/nonexistent/psgc.nt".into(),
            namespace: NS.to_string(),
        };
        assert!(matches!(GazetteerIndex::load(&config), Err(LoadError::Io { .. })));
    }
}
