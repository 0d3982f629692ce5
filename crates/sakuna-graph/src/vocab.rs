//! Vocabulary IRIs used by the reference graphs

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const SKOS_DEFINITION: &str = "http://www.w3.org/2004/02/skos/core#definition";

/// Default project namespace
pub const SKG: &str = "https://sakuna.ph/";

/// Local names of the project vocabulary
pub mod skg {
    pub const REGION: &str = "Region";
    pub const PROVINCE: &str = "Province";
    pub const MUNICIPALITY: &str = "Municipality";
    pub const CITY: &str = "City";
    pub const IS_PART_OF: &str = "isPartOf";
    pub const DISASTER_TYPE: &str = "DisasterType";
}

/// Join a namespace and a local name
pub fn term(namespace: &str, local: &str) -> String {
    format!("{namespace}{local}")
}
