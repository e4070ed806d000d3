// ⚠️ Error Types - Core engine errors
// Typed errors for request validation, weight rules and ingestion

use crate::model::Parameter;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankingError>;

#[derive(Debug, Error)]
pub enum RankingError {
    /// year or category missing from a request
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("No rankings found for year {year}, category {category}")]
    NoMatchingRecords { year: i32, category: String },

    #[error("{parameter} weight {value} is outside [{min}, {max}]")]
    WeightOutOfBounds {
        parameter: Parameter,
        value: i64,
        min: u32,
        max: u32,
    },

    #[error("Total weight {sum} must be between {min} and {max}")]
    WeightSumOutOfRange { sum: i64, min: u32, max: u32 },

    #[error("Unparseable ingestion file {file}: {reason}")]
    UnparseableIngestionFile { file: String, reason: String },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl RankingError {
    /// Request-side errors the caller can fix (vs. storage failures)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RankingError::MissingRequiredField(_)
                | RankingError::WeightOutOfBounds { .. }
                | RankingError::WeightSumOutOfRange { .. }
                | RankingError::UnknownCategory(_)
                | RankingError::UnknownParameter(_)
        )
    }
}

/// Why a source file name could not be classified
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("could not determine category from file name: {0}")]
    UnknownCategory(String),

    #[error("could not determine year from file name: {0}")]
    MissingYear(String),
}

impl From<ClassificationError> for RankingError {
    fn from(err: ClassificationError) -> Self {
        let file = match &err {
            ClassificationError::UnknownCategory(f) | ClassificationError::MissingYear(f) => f.clone(),
        };
        RankingError::UnparseableIngestionFile {
            file,
            reason: err.to_string(),
        }
    }
}
