//! Disaster-type taxonomy loading

use sakuna_core::{DisasterCategory, LoadError, TaxonomyConfig};
use sakuna_graph::{local_name, vocab, ClassHierarchy, Term, TripleStore};

/// Leaf categories of the disaster-type taxonomy, in graph order
#[derive(Debug, Clone)]
pub struct DisasterTaxonomy {
    categories: Vec<DisasterCategory>,
}

impl DisasterTaxonomy {
    /// Taxonomy from categories already in memory
    pub fn new(categories: Vec<DisasterCategory>) -> Self {
        Self { categories }
    }

    pub fn load(config: &TaxonomyConfig) -> Result<Self, LoadError> {
        let store = TripleStore::load(&config.path)?;
        Self::from_store(&store, &vocab::term(&config.namespace, &config.root_class))
    }

    /// Collect leaf classes under `root` that carry a `skos:definition`
    pub fn from_store(store: &TripleStore, root: &str) -> Result<Self, LoadError> {
        let hierarchy = ClassHierarchy::from_store(store);
        let definition = Term::iri(vocab::SKOS_DEFINITION);

        let categories: Vec<DisasterCategory> = hierarchy
            .classes()
            .filter(|class| hierarchy.is_leaf(class) && hierarchy.descends_from(class, root))
            .filter_map(|class| {
                store
                    .value(&Term::iri(class), &definition)
                    .map(|d| DisasterCategory::new(local_name(class), d.value()))
            })
            .collect();

        if categories.is_empty() {
            return Err(LoadError::Malformed(format!(
                "no leaf categories with definitions under {root}"
            )));
        }

        tracing::info!("Loaded {} disaster categories", categories.len());
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[DisasterCategory] {
        &self.categories
    }

    pub fn into_categories(self) -> Vec<DisasterCategory> {
        self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "https://sakuna.ph/";

    fn sub(child: &str, parent: &str) -> String {
        format!("<{NS}{child}> <{}> <{NS}{parent}> .\n", vocab::RDFS_SUBCLASS_OF)
    }

    fn def(class: &str, text: &str) -> String {
        format!("<{NS}{class}> <{}> \"{text}\"@en .\n", vocab::SKOS_DEFINITION)
    }

    #[test]
    fn test_only_defined_leaves_under_root() {
        let source = [
            sub("NaturalHazard", "DisasterType"),
            def("NaturalHazard", "Hazards of natural origin"),
            sub("Flood", "NaturalHazard"),
            def("Flood", "Overflow of water onto dry land"),
            sub("Earthquake", "NaturalHazard"),
            def("Earthquake", "Shaking of the ground"),
            sub("Tsunami", "NaturalHazard"),
            sub("Sedan", "Vehicle"),
            def("Sedan", "A passenger car"),
        ]
        .concat();

        let store = TripleStore::from_ntriples(&source).unwrap();
        let taxonomy = DisasterTaxonomy::from_store(&store, &format!("{NS}DisasterType")).unwrap();

        let labels: Vec<&str> = taxonomy.categories().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Flood", "Earthquake"]);
        assert_eq!(taxonomy.categories()[0].definition, "Overflow of water onto dry land");
    }

    #[test]
    fn test_no_leaves_is_load_error() {
        let store = TripleStore::from_ntriples(&sub("Sedan", "Vehicle")).unwrap();
        assert!(matches!(
            DisasterTaxonomy::from_store(&store, &format!("{NS}DisasterType")),
            Err(LoadError::Malformed(_))
        ));
    }
}
