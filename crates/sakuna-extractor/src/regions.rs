//! Region alias table
//!
//! Surface forms seen in situational reports (roman numerals, numbers,
//! names, acronyms) mapped to the local name of the canonical region.

/// National and island-group names passed through without resolution
pub const AREAS: [&str; 4] = ["Philippines", "Luzon", "Visayas", "Mindanao"];

/// Legacy code of the region later split into IV-A and IV-B
pub const SPLIT_REGION_CODES: [&str; 4] = ["4", "IV", "Region 4", "Region IV"];

/// Local names of the regions a legacy split code expands to, in order
pub const SPLIT_REGIONS: [&str; 2] = ["Region_IV-A", "Region_IV-B"];

/// Alias to region local name, in lookup order
pub const REGION_ALIASES: &[(&str, &str)] = &[
    ("I", "Region_I"),
    ("1", "Region_I"),
    ("Region I", "Region_I"),
    ("Region 1", "Region_I"),
    ("Ilocos", "Region_I"),
    ("Ilocos Region", "Region_I"),
    ("II", "Region_II"),
    ("2", "Region_II"),
    ("Region II", "Region_II"),
    ("Region 2", "Region_II"),
    ("Cagayan Valley", "Region_II"),
    ("III", "Region_III"),
    ("3", "Region_III"),
    ("Region III", "Region_III"),
    ("Region 3", "Region_III"),
    ("Central Luzon", "Region_III"),
    ("IV-A", "Region_IV-A"),
    ("4A", "Region_IV-A"),
    ("IVA", "Region_IV-A"),
    ("Region IV-A", "Region_IV-A"),
    ("CALABARZON", "Region_IV-A"),
    ("IV-B", "Region_IV-B"),
    ("4B", "Region_IV-B"),
    ("IVB", "Region_IV-B"),
    ("Region IV-B", "Region_IV-B"),
    ("MIMAROPA", "Region_IV-B"),
    ("V", "Region_V"),
    ("5", "Region_V"),
    ("Region V", "Region_V"),
    ("Bicol", "Region_V"),
    ("VI", "Region_VI"),
    ("6", "Region_VI"),
    ("Region VI", "Region_VI"),
    ("Western Visayas", "Region_VI"),
    ("VII", "Region_VII"),
    ("7", "Region_VII"),
    ("Region VII", "Region_VII"),
    ("Central Visayas", "Region_VII"),
    ("VIII", "Region_VIII"),
    ("8", "Region_VIII"),
    ("Region VIII", "Region_VIII"),
    ("Eastern Visayas", "Region_VIII"),
    ("IX", "Region_IX"),
    ("9", "Region_IX"),
    ("Region IX", "Region_IX"),
    ("Zamboanga Peninsula", "Region_IX"),
    ("X", "Region_X"),
    ("10", "Region_X"),
    ("Region X", "Region_X"),
    ("Northern Mindanao", "Region_X"),
    ("XI", "Region_XI"),
    ("11", "Region_XI"),
    ("Region XI", "Region_XI"),
    ("Davao", "Region_XI"),
    ("XII", "Region_XII"),
    ("12", "Region_XII"),
    ("Region XII", "Region_XII"),
    ("SOCCSKSARGEN", "Region_XII"),
    ("XIII", "Region_XIII"),
    ("13", "Region_XIII"),
    ("Region XIII", "Region_XIII"),
    ("CARAGA", "Region_XIII"),
    ("RTR", "Region_XIII"),
    ("NCR", "National_Capital_Region"),
    ("Metro Manila", "National_Capital_Region"),
    ("National Capital Region", "National_Capital_Region"),
    ("CAR", "Cordillera_Administrative_Region"),
    ("Cordillera", "Cordillera_Administrative_Region"),
    ("BARMM", "Bangsamoro_Autonomous_Region_In_Muslim_Mindanao"),
    ("ARMM", "Bangsamoro_Autonomous_Region_In_Muslim_Mindanao"),
    ("Bangsamoro", "Bangsamoro_Autonomous_Region_In_Muslim_Mindanao"),
];

/// Exact, case-sensitive alias lookup
pub fn region_for_alias(alias: &str) -> Option<&'static str> {
    REGION_ALIASES
        .iter()
        .find(|(key, _)| *key == alias)
        .map(|(_, region)| *region)
}

/// Case-insensitive national or island-group name
pub fn area_name(text: &str) -> Option<&'static str> {
    AREAS.iter().copied().find(|area| area.eq_ignore_ascii_case(text))
}

/// Case-insensitive legacy split-region code
pub fn is_split_region(text: &str) -> bool {
    SPLIT_REGION_CODES
        .iter()
        .any(|code| code.eq_ignore_ascii_case(text.trim()))
}
