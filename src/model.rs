// 🏛️ Canonical Model - Institution records and parameter totals
// What every ingested row becomes, regardless of its source layout

use crate::error::RankingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATEGORY
// ============================================================================

/// Institution category - closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Overall,
    Engineering,
    University,
    College,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Overall,
        Category::Engineering,
        Category::University,
        Category::College,
    ];

    /// Lowercase name used in storage and URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Overall => "overall",
            Category::Engineering => "engineering",
            Category::University => "university",
            Category::College => "college",
        }
    }

    /// Engineering files use their own sub-column scales
    pub fn is_engineering(&self) -> bool {
        matches!(self, Category::Engineering)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overall" => Ok(Category::Overall),
            // "eng" is what older imports stored
            "engineering" | "eng" => Ok(Category::Engineering),
            "university" => Ok(Category::University),
            "college" => Ok(Category::College),
            _ => Err(RankingError::UnknownCategory(s.to_string())),
        }
    }
}

// ============================================================================
// PARAMETER
// ============================================================================

/// The five canonical ranking parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    /// Teaching, Learning & Resources
    Tlr,
    /// Research & Professional Practice
    Rp,
    /// Graduation Outcomes
    Go,
    /// Outreach & Inclusivity
    Oi,
    /// Perception
    Pr,
}

impl Parameter {
    /// Fixed iteration order, used everywhere order matters
    pub const ALL: [Parameter; 5] = [
        Parameter::Tlr,
        Parameter::Rp,
        Parameter::Go,
        Parameter::Oi,
        Parameter::Pr,
    ];

    /// Upper-case code as it appears in source column headers
    pub fn code(&self) -> &'static str {
        match self {
            Parameter::Tlr => "TLR",
            Parameter::Rp => "RP",
            Parameter::Go => "GO",
            Parameter::Oi => "OI",
            Parameter::Pr => "PR",
        }
    }

    /// Lower-case key used in weight sets
    pub fn key(&self) -> &'static str {
        match self {
            Parameter::Tlr => "tlr",
            Parameter::Rp => "rp",
            Parameter::Go => "go",
            Parameter::Oi => "oi",
            Parameter::Pr => "pr",
        }
    }

    /// Accepts keys, codes, and the legacy query names `rpp` / `perc`
    pub fn parse(s: &str) -> Option<Parameter> {
        match s.trim().to_lowercase().as_str() {
            "tlr" => Some(Parameter::Tlr),
            "rp" | "rpp" => Some(Parameter::Rp),
            "go" => Some(Parameter::Go),
            "oi" => Some(Parameter::Oi),
            "pr" | "perc" => Some(Parameter::Pr),
            _ => None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// PARAMETER TOTALS
// ============================================================================

/// Five canonical parameter totals (each defaults to 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterTotals {
    #[serde(rename = "TLR", default)]
    pub tlr: f64,
    #[serde(rename = "RP", default)]
    pub rp: f64,
    #[serde(rename = "GO", default)]
    pub go: f64,
    #[serde(rename = "OI", default)]
    pub oi: f64,
    #[serde(rename = "PR", default)]
    pub pr: f64,
}

impl ParameterTotals {
    pub fn new(tlr: f64, rp: f64, go: f64, oi: f64, pr: f64) -> Self {
        ParameterTotals { tlr, rp, go, oi, pr }
    }

    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Tlr => self.tlr,
            Parameter::Rp => self.rp,
            Parameter::Go => self.go,
            Parameter::Oi => self.oi,
            Parameter::Pr => self.pr,
        }
    }

    pub fn add(&mut self, parameter: Parameter, value: f64) {
        match parameter {
            Parameter::Tlr => self.tlr += value,
            Parameter::Rp => self.rp += value,
            Parameter::Go => self.go += value,
            Parameter::Oi => self.oi += value,
            Parameter::Pr => self.pr += value,
        }
    }

    pub fn is_zero(&self) -> bool {
        Parameter::ALL.iter().all(|p| self.get(*p) == 0.0)
    }
}

// ============================================================================
// SUB-COMPONENT SCORES (traceability only)
// ============================================================================

/// Sixteen optional sub-component scores.
/// Kept alongside the totals for traceability; recomputation never reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct SubScores {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub TLR_SS: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub TLR_FSR: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub TLR_FQE: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub TLR_FRU: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub RP_PU: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub RP_QP: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub RP_IPR: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub RP_FPPP: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub GO_GPH: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub GO_GUE: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub GO_MS: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub GO_GPHD: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub OI_RD: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub OI_WD: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub OI_ESCS: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub OI_PCS: Option<f64>,
}

impl SubScores {
    /// Mutable slot for a sub-component code like "TLR_SS"
    pub fn slot_mut(&mut self, code: &str) -> Option<&mut Option<f64>> {
        let slot = match code {
            "TLR_SS" => &mut self.TLR_SS,
            "TLR_FSR" => &mut self.TLR_FSR,
            "TLR_FQE" => &mut self.TLR_FQE,
            "TLR_FRU" => &mut self.TLR_FRU,
            "RP_PU" => &mut self.RP_PU,
            "RP_QP" => &mut self.RP_QP,
            "RP_IPR" => &mut self.RP_IPR,
            "RP_FPPP" => &mut self.RP_FPPP,
            "GO_GPH" => &mut self.GO_GPH,
            "GO_GUE" => &mut self.GO_GUE,
            "GO_MS" => &mut self.GO_MS,
            "GO_GPHD" => &mut self.GO_GPHD,
            "OI_RD" => &mut self.OI_RD,
            "OI_WD" => &mut self.OI_WD,
            "OI_ESCS" => &mut self.OI_ESCS,
            "OI_PCS" => &mut self.OI_PCS,
            _ => return None,
        };
        Some(slot)
    }

    pub fn set(&mut self, code: &str, value: f64) {
        if let Some(slot) = self.slot_mut(code) {
            *slot = Some(value);
        }
    }
}

// ============================================================================
// INSTITUTION RECORD
// ============================================================================

/// One institution's standing for one (year, category) pair.
///
/// Stored values are historical and never mutated by recomputation;
/// computed scores and ranks live in `ranking::RankedInstitution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionRecord {
    /// Stable identity (UUID) assigned at ingestion
    pub id: String,

    /// Both aliases always carry the same non-empty value
    pub name: String,
    pub institution: String,

    pub city: String,
    pub state: String,

    /// Source-provided historical rank (positive)
    pub rank: u32,
    /// Source-provided historical score
    pub score: f64,

    pub year: i32,
    pub category: Category,

    #[serde(flatten)]
    pub totals: ParameterTotals,

    #[serde(flatten)]
    pub sub_scores: SubScores,

    #[serde(default)]
    pub source_file: String,
}

impl InstitutionRecord {
    /// Create a record; the identity fills both name aliases
    pub fn new(institution: impl Into<String>, year: i32, category: Category) -> Self {
        let institution = institution.into().trim().to_string();
        InstitutionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: institution.clone(),
            institution,
            city: String::new(),
            state: String::new(),
            rank: 0,
            score: 0.0,
            year,
            category,
            totals: ParameterTotals::default(),
            sub_scores: SubScores::default(),
            source_file: String::new(),
        }
    }

    /// Builder pattern: add location
    pub fn with_location(mut self, city: impl Into<String>, state: impl Into<String>) -> Self {
        self.city = city.into().trim().to_string();
        self.state = state.into().trim().to_string();
        self
    }

    /// Builder pattern: add historical rank and score
    pub fn with_standing(mut self, rank: u32, score: f64) -> Self {
        self.rank = rank;
        self.score = score;
        self
    }

    /// Builder pattern: add canonical totals
    pub fn with_totals(mut self, totals: ParameterTotals) -> Self {
        self.totals = totals;
        self
    }

    /// Builder pattern: add sub-component scores
    pub fn with_sub_scores(mut self, sub_scores: SubScores) -> Self {
        self.sub_scores = sub_scores;
        self
    }

    /// Builder pattern: add provenance
    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = source_file.into();
        self
    }

    /// Display name, whichever alias is populated
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.institution
        } else {
            &self.name
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("Overall".parse::<Category>().unwrap(), Category::Overall);
        assert_eq!("eng".parse::<Category>().unwrap(), Category::Engineering);
        assert_eq!(" college ".parse::<Category>().unwrap(), Category::College);
        assert!("medical".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::University).unwrap();
        assert_eq!(json, "\"university\"");
    }

    #[test]
    fn test_parameter_parse_legacy_names() {
        assert_eq!(Parameter::parse("rpp"), Some(Parameter::Rp));
        assert_eq!(Parameter::parse("perc"), Some(Parameter::Pr));
        assert_eq!(Parameter::parse("TLR"), Some(Parameter::Tlr));
        assert_eq!(Parameter::parse("xyz"), None);
    }

    #[test]
    fn test_totals_add_and_get() {
        let mut totals = ParameterTotals::default();
        assert!(totals.is_zero());
        totals.add(Parameter::Go, 12.5);
        totals.add(Parameter::Go, 2.5);
        assert_eq!(totals.get(Parameter::Go), 15.0);
        assert!(!totals.is_zero());
    }

    #[test]
    fn test_sub_scores_set_unknown_code_is_ignored() {
        let mut subs = SubScores::default();
        subs.set("TLR_SS", 18.0);
        subs.set("PR", 50.0);
        assert_eq!(subs.TLR_SS, Some(18.0));
        assert_eq!(subs, SubScores { TLR_SS: Some(18.0), ..Default::default() });
    }

    #[test]
    fn test_record_aliases_match() {
        let record = InstitutionRecord::new("  IIT Madras ", 2024, Category::Engineering)
            .with_location("Chennai", "Tamil Nadu")
            .with_standing(1, 89.46);

        assert_eq!(record.name, "IIT Madras");
        assert_eq!(record.institution, record.name);
        assert_eq!(record.display_name(), "IIT Madras");
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_record_serializes_flat_totals() {
        let record = InstitutionRecord::new("X", 2023, Category::Overall)
            .with_totals(ParameterTotals::new(1.0, 2.0, 3.0, 4.0, 5.0));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["TLR"], 1.0);
        assert_eq!(value["PR"], 5.0);
        assert_eq!(value["category"], "overall");
        assert!(value.get("TLR_SS").is_none());
    }
}
