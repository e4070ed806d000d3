// 🧮 ColumnMapper - Category-specific sub-columns → canonical totals
//
// Engineering and non-engineering files publish the same sub-parameters
// with different maximum scales, so the header literal differs:
//   engineering: "TLR_FSR Score (Max 30.00)"
//   general:     "TLR_FSR Score (Max 25.00)"
// The schema is picked once per file from its category.

use crate::model::{Category, Parameter, ParameterTotals, SubScores};
use csv::StringRecord;

// ============================================================================
// SUB-COLUMN
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubColumn {
    pub parameter: Parameter,
    /// Sub-component code, e.g. "TLR_SS" (or "PR" for the single perception column)
    pub code: &'static str,
    /// Maximum score published in the header
    pub max: u32,
}

impl SubColumn {
    const fn new(parameter: Parameter, code: &'static str, max: u32) -> Self {
        SubColumn { parameter, code, max }
    }

    /// Literal header: "<CODE> Score (Max <N>.00)"
    pub fn header(&self) -> String {
        format!("{} Score (Max {}.00)", self.code, self.max)
    }
}

const ENGINEERING_COLUMNS: [SubColumn; 17] = [
    SubColumn::new(Parameter::Tlr, "TLR_SS", 20),
    SubColumn::new(Parameter::Tlr, "TLR_FSR", 30),
    SubColumn::new(Parameter::Tlr, "TLR_FQE", 20),
    SubColumn::new(Parameter::Tlr, "TLR_FRU", 30),
    SubColumn::new(Parameter::Rp, "RP_PU", 35),
    SubColumn::new(Parameter::Rp, "RP_QP", 40),
    SubColumn::new(Parameter::Rp, "RP_IPR", 15),
    SubColumn::new(Parameter::Rp, "RP_FPPP", 10),
    SubColumn::new(Parameter::Go, "GO_GPH", 40),
    SubColumn::new(Parameter::Go, "GO_GUE", 15),
    SubColumn::new(Parameter::Go, "GO_MS", 25),
    SubColumn::new(Parameter::Go, "GO_GPHD", 20),
    SubColumn::new(Parameter::Oi, "OI_RD", 30),
    SubColumn::new(Parameter::Oi, "OI_WD", 30),
    SubColumn::new(Parameter::Oi, "OI_ESCS", 20),
    SubColumn::new(Parameter::Oi, "OI_PCS", 20),
    SubColumn::new(Parameter::Pr, "PR", 100),
];

const GENERAL_COLUMNS: [SubColumn; 17] = [
    SubColumn::new(Parameter::Tlr, "TLR_SS", 20),
    SubColumn::new(Parameter::Tlr, "TLR_FSR", 25),
    SubColumn::new(Parameter::Tlr, "TLR_FQE", 20),
    SubColumn::new(Parameter::Tlr, "TLR_FRU", 20),
    SubColumn::new(Parameter::Rp, "RP_PU", 15),
    SubColumn::new(Parameter::Rp, "RP_QP", 30),
    SubColumn::new(Parameter::Rp, "RP_IPR", 30),
    SubColumn::new(Parameter::Rp, "RP_FPPP", 15),
    SubColumn::new(Parameter::Go, "GO_GPH", 15),
    SubColumn::new(Parameter::Go, "GO_GUE", 10),
    SubColumn::new(Parameter::Go, "GO_MS", 60),
    SubColumn::new(Parameter::Go, "GO_GPHD", 40),
    SubColumn::new(Parameter::Oi, "OI_RD", 30),
    SubColumn::new(Parameter::Oi, "OI_WD", 30),
    SubColumn::new(Parameter::Oi, "OI_ESCS", 20),
    SubColumn::new(Parameter::Oi, "OI_PCS", 20),
    SubColumn::new(Parameter::Pr, "PR", 100),
];

// ============================================================================
// COLUMN SCHEMA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSchema {
    Engineering,
    /// overall, university and college files
    General,
}

impl ColumnSchema {
    pub fn for_category(category: Category) -> Self {
        if category.is_engineering() {
            ColumnSchema::Engineering
        } else {
            ColumnSchema::General
        }
    }

    /// Ordered sub-columns for this layout
    pub fn columns(&self) -> &'static [SubColumn] {
        match self {
            ColumnSchema::Engineering => &ENGINEERING_COLUMNS,
            ColumnSchema::General => &GENERAL_COLUMNS,
        }
    }

    pub fn columns_for(&self, parameter: Parameter) -> impl Iterator<Item = &'static SubColumn> {
        self.columns().iter().filter(move |c| c.parameter == parameter)
    }
}

// ============================================================================
// NUMERIC POLICY
// ============================================================================

/// Parse a numeric cell. Missing, blank or non-numeric → None.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    let value = cell
        .parse::<f64>()
        .ok()
        // Try removing thousands separators
        .or_else(|| cell.replace(',', "").parse::<f64>().ok())?;

    value.is_finite().then_some(value)
}

/// Sub-score cell value: bad or negative cells count as zero
pub fn number_or_zero(cell: Option<&str>) -> f64 {
    cell.and_then(parse_number)
        .filter(|v| *v >= 0.0)
        .unwrap_or(0.0)
}

// ============================================================================
// COLUMN MAPPER
// ============================================================================

/// One mapped source row, before acceptance checks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRow {
    pub institution: String,
    pub city: String,
    pub state: String,
    pub rank: Option<u32>,
    pub score: Option<f64>,
    pub totals: ParameterTotals,
    pub sub_scores: SubScores,
}

// Identity aliases, in priority order
const IDENTITY_HEADERS: [&str; 4] = ["name", "institution", "college", "university"];

/// Maps rows of one file onto canonical totals.
/// Header positions are resolved once in `new`, not per row.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    schema: ColumnSchema,
    sub_columns: Vec<(SubColumn, Option<usize>)>,
    identity: Vec<usize>,
    city: Option<usize>,
    state: Option<usize>,
    rank: Option<usize>,
    score: Option<usize>,
}

impl ColumnMapper {
    pub fn new(schema: ColumnSchema, headers: &StringRecord) -> Self {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let exact = |name: &str| normalized.iter().position(|h| h == name);
        let loose = |name: &str| normalized.iter().position(|h| h.eq_ignore_ascii_case(name));

        let sub_columns = schema
            .columns()
            .iter()
            .map(|col| (*col, exact(col.header().as_str())))
            .collect();

        let identity = IDENTITY_HEADERS.iter().filter_map(|h| loose(*h)).collect();

        ColumnMapper {
            schema,
            sub_columns,
            identity,
            city: loose("city"),
            state: loose("state"),
            rank: loose("rank"),
            score: loose("score"),
        }
    }

    pub fn schema(&self) -> ColumnSchema {
        self.schema
    }

    /// Sub-column headers this file does not carry (all count as zero)
    pub fn missing_columns(&self) -> Vec<String> {
        self.sub_columns
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(col, _)| col.header())
            .collect()
    }

    pub fn map_row(&self, row: &StringRecord) -> MappedRow {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));
        let text = |idx: Option<usize>| cell(idx).unwrap_or("").trim().to_string();

        let mut totals = ParameterTotals::default();
        let mut sub_scores = SubScores::default();

        for (col, idx) in &self.sub_columns {
            let value = number_or_zero(cell(*idx));
            totals.add(col.parameter, value);
            if idx.is_some() {
                sub_scores.set(col.code, value);
            }
        }

        let institution = self
            .identity
            .iter()
            .filter_map(|i| row.get(*i))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .unwrap_or("")
            .to_string();

        let rank = cell(self.rank)
            .and_then(parse_number)
            .filter(|r| *r >= 1.0)
            .map(|r| r as u32);

        let score = cell(self.score).and_then(parse_number).filter(|s| *s >= 0.0);

        MappedRow {
            institution,
            city: text(self.city),
            state: text(self.state),
            rank,
            score,
            totals,
            sub_scores,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cols: &[&str]) -> StringRecord {
        StringRecord::from(cols.to_vec())
    }

    #[test]
    fn test_header_literal() {
        let col = ENGINEERING_COLUMNS[0];
        assert_eq!(col.header(), "TLR_SS Score (Max 20.00)");
        assert_eq!(ENGINEERING_COLUMNS[16].header(), "PR Score (Max 100.00)");
    }

    #[test]
    fn test_schema_by_category() {
        assert_eq!(ColumnSchema::for_category(Category::Engineering), ColumnSchema::Engineering);
        assert_eq!(ColumnSchema::for_category(Category::College), ColumnSchema::General);
        assert_eq!(ColumnSchema::for_category(Category::Overall), ColumnSchema::General);
    }

    #[test]
    fn test_tlr_scales_differ() {
        let eng: Vec<u32> = ColumnSchema::Engineering.columns_for(Parameter::Tlr).map(|c| c.max).collect();
        let gen: Vec<u32> = ColumnSchema::General.columns_for(Parameter::Tlr).map(|c| c.max).collect();
        assert_eq!(eng, vec![20, 30, 20, 30]);
        assert_eq!(gen, vec![20, 25, 20, 20]);
    }

    #[test]
    fn test_engineering_tlr_sum() {
        let hdr = headers(&[
            "name",
            "TLR_SS Score (Max 20.00)",
            "TLR_FSR Score (Max 30.00)",
            "TLR_FQE Score (Max 20.00)",
            "TLR_FRU Score (Max 30.00)",
        ]);
        let mapper = ColumnMapper::new(ColumnSchema::Engineering, &hdr);
        let row = mapper.map_row(&headers(&["IIT X", "18", "28", "19", "27"]));

        assert_eq!(row.totals.tlr, 92.0);
        assert_eq!(row.totals.rp, 0.0);
        assert_eq!(row.sub_scores.TLR_FSR, Some(28.0));
        assert_eq!(row.sub_scores.RP_PU, None);
    }

    #[test]
    fn test_general_schema_ignores_engineering_headers() {
        // Engineering-scale header in a college file is not a college column
        let hdr = headers(&["name", "TLR_FSR Score (Max 30.00)", "TLR_FSR Score (Max 25.00)"]);
        let mapper = ColumnMapper::new(ColumnSchema::General, &hdr);
        let row = mapper.map_row(&headers(&["C", "29", "21"]));
        assert_eq!(row.totals.tlr, 21.0);
    }

    #[test]
    fn test_non_numeric_cells_are_zero() {
        let hdr = headers(&["name", "OI_RD Score (Max 30.00)", "OI_WD Score (Max 30.00)", "PR Score (Max 100.00)"]);
        let mapper = ColumnMapper::new(ColumnSchema::General, &hdr);
        let row = mapper.map_row(&headers(&["U", "n/a", " 12.5 ", ""]));
        assert_eq!(row.totals.oi, 12.5);
        assert_eq!(row.totals.pr, 0.0);
        assert_eq!(row.sub_scores.OI_RD, Some(0.0));
    }

    #[test]
    fn test_negative_cells_are_zero() {
        assert_eq!(number_or_zero(Some("-30")), 0.0);
        assert_eq!(number_or_zero(Some("0")), 0.0);

        let hdr = headers(&["name", "TLR_SS Score (Max 20.00)", "TLR_FSR Score (Max 25.00)", "PR Score (Max 100.00)"]);
        let mapper = ColumnMapper::new(ColumnSchema::General, &hdr);
        let row = mapper.map_row(&headers(&["Negative College", "-30", "5", "40"]));

        assert_eq!(row.totals.tlr, 5.0);
        assert_eq!(row.totals.pr, 40.0);
        assert_eq!(row.sub_scores.TLR_SS, Some(0.0));
        for p in Parameter::ALL {
            assert!(row.totals.get(p) >= 0.0);
        }
    }

    #[test]
    fn test_short_row_does_not_panic() {
        let hdr = headers(&["name", "city", "PR Score (Max 100.00)"]);
        let mapper = ColumnMapper::new(ColumnSchema::General, &hdr);
        let row = mapper.map_row(&headers(&["Only Name"]));
        assert_eq!(row.institution, "Only Name");
        assert_eq!(row.city, "");
        assert!(row.totals.is_zero());
    }

    #[test]
    fn test_identity_alias_priority() {
        let hdr = headers(&["Institution", "Name", "City", "State"]);
        let mapper = ColumnMapper::new(ColumnSchema::General, &hdr);

        let row = mapper.map_row(&headers(&["Inst Alias", "", "Pune", "Maharashtra"]));
        assert_eq!(row.institution, "Inst Alias");
        assert_eq!(row.city, "Pune");
        assert_eq!(row.state, "Maharashtra");

        let row = mapper.map_row(&headers(&["Inst Alias", "Name Alias", "Pune", "Maharashtra"]));
        assert_eq!(row.institution, "Name Alias");
    }

    #[test]
    fn test_rank_and_score_columns() {
        let hdr = headers(&["name", "Rank", "Score"]);
        let mapper = ColumnMapper::new(ColumnSchema::General, &hdr);

        let row = mapper.map_row(&headers(&["A", "3", "71.24"]));
        assert_eq!(row.rank, Some(3));
        assert_eq!(row.score, Some(71.24));

        let row = mapper.map_row(&headers(&["A", "-", "oops"]));
        assert_eq!(row.rank, None);
        assert_eq!(row.score, None);
    }

    #[test]
    fn test_missing_columns_reported() {
        let hdr = headers(&["name", "PR Score (Max 100.00)"]);
        let mapper = ColumnMapper::new(ColumnSchema::Engineering, &hdr);
        let missing = mapper.missing_columns();
        assert_eq!(missing.len(), 16);
        assert!(!missing.contains(&"PR Score (Max 100.00)".to_string()));
    }

    #[test]
    fn test_parse_number_policy() {
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("  7 "), Some(7.0));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(number_or_zero(None), 0.0);
    }
}
