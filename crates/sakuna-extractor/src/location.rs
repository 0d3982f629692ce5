//! Location resolution against the gazetteer
//!
//! A location string lists administrative levels from the most specific to
//! the least specific (`"Calamba City,Laguna,Region IV-A"`). Resolution
//! walks it from the end: region, then province, then municipality,
//! falling back to the deepest level that did resolve.

use std::sync::Arc;

use sakuna_core::{DivisionId, DivisionRef, ResolverConfig};

use crate::gazetteer::GazetteerIndex;
use crate::regions::{area_name, is_split_region, region_for_alias, REGION_ALIASES, SPLIT_REGIONS};
use crate::similarity::{best_match, scorer_for, SimilarityScorer, TokenSortRatio};

pub const REGION_THRESHOLD: u8 = 85;
pub const PROVINCE_THRESHOLD: u8 = 85;
pub const MUNICIPALITY_THRESHOLD: u8 = 60;

/// Provinces that no longer exist; their municipalities are searched
/// without a parent filter
const DISSOLVED_PROVINCES: [&str; 1] = ["maguindanao"];

/// Resolves free-text locations to gazetteer divisions
pub struct LocationResolver {
    gazetteer: Arc<GazetteerIndex>,
    scorer: Box<dyn SimilarityScorer>,
}

impl LocationResolver {
    pub fn new(gazetteer: Arc<GazetteerIndex>) -> Self {
        Self::with_scorer(gazetteer, Box::new(TokenSortRatio))
    }

    pub fn with_scorer(gazetteer: Arc<GazetteerIndex>, scorer: Box<dyn SimilarityScorer>) -> Self {
        Self { gazetteer, scorer }
    }

    pub fn from_config(gazetteer: Arc<GazetteerIndex>, config: &ResolverConfig) -> Self {
        Self::with_scorer(gazetteer, scorer_for(config.scorer))
    }

    pub fn gazetteer(&self) -> &GazetteerIndex {
        &self.gazetteer
    }

    /// Resolve every location, one result per input in input order
    pub fn match_locations<S: AsRef<str>>(&self, locations: &[S]) -> Vec<DivisionRef> {
        locations.iter().map(|l| self.resolve(l.as_ref())).collect()
    }

    /// Resolve a single location string
    pub fn resolve(&self, location: &str) -> DivisionRef {
        let mut levels: Vec<&str> = location
            .split([',', '|'])
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let Some(highest) = levels.pop() else {
            return DivisionRef::unresolved(location);
        };

        if let Some(area) = area_name(highest) {
            return DivisionRef::Area {
                name: area.to_string(),
            };
        }

        if is_split_region(highest) {
            return DivisionRef::Split {
                ids: SPLIT_REGIONS
                    .iter()
                    .map(|r| self.gazetteer.region_id(r))
                    .collect(),
            };
        }

        let resolved = match self.match_region(highest) {
            Some(region) => Some(self.resolve_within_region(region, levels)),
            None => self.resolve_without_region(highest, levels),
        };

        match resolved {
            Some(id) => DivisionRef::division(id),
            None => {
                tracing::debug!("Unresolved location: {}", location);
                DivisionRef::unresolved(location)
            }
        }
    }

    fn resolve_within_region(&self, region: DivisionId, mut levels: Vec<&str>) -> DivisionId {
        let Some(province_label) = levels.pop() else {
            return region;
        };

        if let Some(province) = self.match_province(province_label) {
            return match levels.pop() {
                Some(muni_label) => self
                    .match_municipality(muni_label, Some(&province))
                    .unwrap_or(province),
                None => province,
            };
        }

        // A city sitting in the province column
        if let Some(muni) = self.match_municipality(province_label, Some(&region)) {
            return muni;
        }

        let dissolved = DISSOLVED_PROVINCES.contains(&province_label.to_lowercase().as_str());
        while let Some(muni_label) = levels.pop() {
            let parent = (!dissolved).then_some(&region);
            if let Some(muni) = self.match_municipality(muni_label, parent) {
                return muni;
            }
        }

        region
    }

    fn resolve_without_region(&self, highest: &str, mut levels: Vec<&str>) -> Option<DivisionId> {
        let Some(province_label) = levels.pop() else {
            return self
                .match_province(highest)
                .or_else(|| self.match_municipality(highest, None));
        };

        if let Some(province) = self.match_province(province_label) {
            let Some(muni_label) = levels.pop() else {
                return Some(province);
            };

            let muni = self
                .match_municipality(muni_label, Some(&province))
                .filter(|m| self.gazetteer.parent_of(m) == Some(&province))
                .or_else(|| self.match_municipality(highest, Some(&province)));
            return Some(muni.unwrap_or(province));
        }

        // Region column missing: the highest token is the province
        let province = self.match_province(highest)?;
        Some(
            self.match_municipality(province_label, Some(&province))
                .unwrap_or(province),
        )
    }

    /// Exact alias, else fuzzy alias at [`REGION_THRESHOLD`]
    pub fn match_region(&self, label: &str) -> Option<DivisionId> {
        let region = region_for_alias(label).or_else(|| {
            best_match(
                self.scorer.as_ref(),
                label,
                REGION_ALIASES.iter().map(|(alias, _)| *alias),
                REGION_THRESHOLD,
            )
            .and_then(region_for_alias)
        })?;

        Some(self.gazetteer.region_id(region))
    }

    /// Case-folded exact label, else fuzzy label at [`PROVINCE_THRESHOLD`]
    pub fn match_province(&self, label: &str) -> Option<DivisionId> {
        let label = label.to_lowercase();
        if let Some(id) = self.gazetteer.province(&label) {
            return Some(id.clone());
        }

        best_match(
            self.scorer.as_ref(),
            &label,
            self.gazetteer.province_labels(),
            PROVINCE_THRESHOLD,
        )
        .and_then(|l| self.gazetteer.province(l))
        .cloned()
    }

    /// Municipality under `parent`, accepting "X City" / "City of X" forms
    ///
    /// Falls back to fuzzy matching at [`MUNICIPALITY_THRESHOLD`] without
    /// the parent filter.
    pub fn match_municipality(&self, label: &str, parent: Option<&DivisionId>) -> Option<DivisionId> {
        let label = label.to_lowercase();
        let candidate = label.split(" (").next().unwrap_or(&label).trim();
        if candidate.is_empty() {
            return None;
        }

        if let Some(parent) = parent {
            let city = format!("{candidate} city");
            let city_of = format!("city of {}", city.replace(" city", ""));
            let municipalities = self.gazetteer.municipalities();

            let under_parent = municipalities.iter().find(|m| {
                (m.label == candidate || m.label == city || m.label == city_of)
                    && m.parent.as_ref() == Some(parent)
            });
            if let Some(m) = under_parent {
                return Some(m.id.clone());
            }

            // Highly urbanised cities sit outside their geographic province
            if let Some(m) = municipalities
                .iter()
                .find(|m| m.label == city || m.label == city_of)
            {
                return Some(m.id.clone());
            }
        }

        if let Some(id) = self.gazetteer.municipality(candidate) {
            return Some(id.clone());
        }

        best_match(
            self.scorer.as_ref(),
            candidate,
            self.gazetteer.municipality_labels(),
            MUNICIPALITY_THRESHOLD,
        )
        .and_then(|l| self.gazetteer.municipality(l))
        .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sakuna_graph::vocab;
    use sakuna_graph::TripleStore;

    const NS: &str = "https://sakuna.ph/";

    fn division(s: &str, class: &str, label: &str, parent: Option<&str>) -> String {
        let mut out = format!(
            "<{NS}{s}> <{}> <{NS}{class}> .\n<{NS}{s}> <{}> \"{label}\" .\n",
            vocab::RDF_TYPE,
            vocab::RDFS_LABEL
        );
        if let Some(p) = parent {
            out.push_str(&format!("<{NS}{s}> <{NS}isPartOf> <{NS}{p}> .\n"));
        }
        out
    }

    fn resolver() -> LocationResolver {
        let source = [
            division("Region_IV-A", "Region", "Region IV-A", None),
            division("National_Capital_Region", "Region", "NCR", None),
            division("Laguna", "Province", "Laguna", Some("Region_IV-A")),
            division("Batangas", "Province", "Batangas", Some("Region_IV-A")),
            division("Calamba", "City", "City of Calamba", Some("Laguna")),
            division("Santa_Cruz_Laguna", "Municipality", "Santa Cruz", Some("Laguna")),
            division("Nasugbu", "Municipality", "Nasugbu", Some("Batangas")),
            division("Manila", "City", "City of Manila", Some("National_Capital_Region")),
            division("Datu_Piang", "Municipality", "Datu Piang", Some("Maguindanao_del_Sur")),
        ]
        .concat();

        let store = TripleStore::from_ntriples(&source).unwrap();
        let index = GazetteerIndex::from_store(&store, NS).unwrap();
        LocationResolver::new(Arc::new(index))
    }

    fn id(local: &str) -> DivisionRef {
        DivisionRef::division(DivisionId::new(format!("{NS}{local}")))
    }

    #[test]
    fn test_full_path() {
        let r = resolver();
        assert_eq!(r.resolve("Calamba City,Laguna,Region IV-A"), id("Calamba"));
        assert_eq!(r.resolve("santa cruz (capital), laguna, CALABARZON"), id("Santa_Cruz_Laguna"));
    }

    #[test]
    fn test_region_only_and_areas() {
        let r = resolver();
        assert_eq!(r.resolve("NCR"), id("National_Capital_Region"));
        assert_eq!(r.resolve("Mindanao"), DivisionRef::Area { name: "Mindanao".to_string() });

        let split = r.resolve("Region 4");
        assert_eq!(
            split,
            DivisionRef::Split {
                ids: vec![
                    DivisionId::new(format!("{NS}Region_IV-A")),
                    DivisionId::new(format!("{NS}Region_IV-B"))
                ]
            }
        );
    }

    #[test]
    fn test_unknown_municipality_falls_back_to_province() {
        let r = resolver();
        assert_eq!(r.resolve("Xyzzyqwv,Batangas,Region IV-A"), id("Batangas"));
    }

    #[test]
    fn test_city_in_province_column() {
        let r = resolver();
        assert_eq!(r.resolve("Manila,NCR"), id("Manila"));
    }

    #[test]
    fn test_dissolved_province() {
        let r = resolver();
        assert_eq!(r.resolve("Datu Piang,Maguindanao,BARMM"), id("Datu_Piang"));
    }

    #[test]
    fn test_no_region_paths() {
        let r = resolver();
        assert_eq!(r.resolve("Batangas"), id("Batangas"));
        assert_eq!(r.resolve("Nasugbu,Batangas"), id("Nasugbu"));
        assert_eq!(r.resolve("Nasugbu"), id("Nasugbu"));
    }

    #[test]
    fn test_wrong_parent_retries_highest_token() {
        let r = resolver();
        // Nasugbu is not in Laguna; the highest token is tried under Laguna
        assert_eq!(r.resolve("Nasugbu,Laguna,Santa Cruz"), id("Santa_Cruz_Laguna"));
    }

    #[test]
    fn test_empty_and_garbage_are_unresolved() {
        let r = resolver();
        assert_eq!(r.resolve(""), DivisionRef::unresolved(""));
        assert_eq!(r.resolve(" , "), DivisionRef::unresolved(" , "));
        assert!(!r.resolve("Qwxz").is_resolved());
    }

    #[test]
    fn test_match_locations_preserves_order() {
        let r = resolver();
        let out = r.match_locations(&["NCR", "", "Batangas"]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], id("National_Capital_Region"));
        assert!(!out[1].is_resolved());
        assert_eq!(out[2], id("Batangas"));
    }
}
