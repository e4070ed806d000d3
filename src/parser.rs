// 🏗️ Parser Framework - Ranking source files
// File name → (category, year) → column schema → canonical records

use crate::columns::{ColumnMapper, ColumnSchema};
use crate::error::ClassificationError;
use crate::model::{Category, InstitutionRecord};
use crate::regions::RegionTable;
use crate::scoring::{default_composite, round2};
use anyhow::{Context, Result};
use csv::{ByteRecord, StringRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Infer (category, year) from a source file name.
///
/// Category substrings are checked in order, case-insensitive:
/// "eng" → engineering, "overall", "college", "university".
/// Year is the first run of exactly four digits.
///
/// # Examples:
/// ```
/// use rankr::{classify, Category};
/// assert_eq!(classify("eng_2023.csv"), Ok((Category::Engineering, 2023)));
/// assert_eq!(classify("College_full_img_2024_data.csv"), Ok((Category::College, 2024)));
/// assert!(classify("notes.csv").is_err());
/// ```
pub fn classify(file_name: &str) -> Result<(Category, i32), ClassificationError> {
    let lower = file_name.to_lowercase();

    let category = if lower.contains("eng") {
        Category::Engineering
    } else if lower.contains("overall") {
        Category::Overall
    } else if lower.contains("college") {
        Category::College
    } else if lower.contains("university") {
        Category::University
    } else {
        return Err(ClassificationError::UnknownCategory(file_name.to_string()));
    };

    let year = four_digit_token(file_name)
        .ok_or_else(|| ClassificationError::MissingYear(file_name.to_string()))?;

    Ok((category, year))
}

fn four_digit_token(s: &str) -> Option<i32> {
    s.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
}

// ============================================================================
// SOURCE FILE
// ============================================================================

/// A classified source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub file_name: String,
    pub category: Category,
    pub year: i32,
}

impl SourceFile {
    pub fn new(file_name: impl Into<String>, category: Category, year: i32) -> Self {
        SourceFile {
            file_name: file_name.into(),
            category,
            year,
        }
    }

    /// Classify a path by its file name (directories are ignored)
    pub fn detect(path: &Path) -> Result<SourceFile, ClassificationError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        let (category, year) = classify(&file_name)?;
        Ok(SourceFile::new(file_name, category, year))
    }

    pub fn schema(&self) -> ColumnSchema {
        ColumnSchema::for_category(self.category)
    }
}

// ============================================================================
// PARSED FILE
// ============================================================================

/// Output of parsing one source file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub source: SourceFile,
    pub records: Vec<InstitutionRecord>,
    /// Rows without identity or with a non-positive default score
    pub rejected_rows: usize,
    /// Accepted records whose state is not in the region table
    pub unknown_states: usize,
    /// Schema columns absent from the header (counted as zero)
    pub missing_columns: Vec<String>,
}

// ============================================================================
// CSV PARSER
// ============================================================================

/// Parses one classified CSV file using its category's column schema
pub struct CsvRankingParser {
    source: SourceFile,
}

impl CsvRankingParser {
    pub fn new(source: SourceFile) -> Self {
        CsvRankingParser { source }
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn parse(&self, file_path: &Path) -> Result<ParsedFile> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;
        self.parse_reader(file)
    }

    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<ParsedFile> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .byte_headers()
            .map(lossy_record)
            .with_context(|| format!("Failed to read CSV header in {}", self.source.file_name))?;

        // resolved once for the whole file
        let mapper = ColumnMapper::new(self.source.schema(), &headers);
        let missing_columns = mapper.missing_columns();
        if !missing_columns.is_empty() {
            debug!(
                file = %self.source.file_name,
                missing = missing_columns.len(),
                "schema columns absent, counted as zero"
            );
        }

        let regions = RegionTable::global();
        let mut records = Vec::new();
        let mut rejected_rows = 0;
        let mut unknown_states = 0;

        for (line_num, result) in reader.byte_records().enumerate() {
            let row = result.map(|r| lossy_record(&r)).with_context(|| {
                format!(
                    "Failed to parse CSV line {} in {}",
                    line_num + 2,
                    self.source.file_name
                )
            })?;

            let mapped = mapper.map_row(&row);
            let sanity_score = default_composite(&mapped.totals);

            if mapped.institution.is_empty() || sanity_score <= 0.0 {
                rejected_rows += 1;
                continue;
            }

            if !regions.is_known_state(&mapped.state) {
                unknown_states += 1;
            }

            let score = mapped.score.unwrap_or_else(|| round2(sanity_score));
            // missing rank → position among accepted rows
            let rank = mapped.rank.unwrap_or(records.len() as u32 + 1);

            let record = InstitutionRecord::new(mapped.institution, self.source.year, self.source.category)
                .with_location(mapped.city, mapped.state)
                .with_standing(rank, score)
                .with_totals(mapped.totals)
                .with_sub_scores(mapped.sub_scores)
                .with_source_file(self.source.file_name.clone());

            records.push(record);
        }

        if unknown_states > 0 {
            warn!(
                file = %self.source.file_name,
                count = unknown_states,
                "records with states outside the region table"
            );
        }

        Ok(ParsedFile {
            source: self.source.clone(),
            records,
            rejected_rows,
            unknown_states,
            missing_columns,
        })
    }
}

// Invalid UTF-8 in a cell becomes U+FFFD; the row is kept
fn lossy_record(record: &ByteRecord) -> StringRecord {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

/// Classify and parse a file in one step
pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let source = SourceFile::detect(path)?;
    CsvRankingParser::new(source).parse(path)
}

// ============================================================================
// TESTS
// ============================================================================
