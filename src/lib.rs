// rankr - Parameter Normalization & Weighted Recomputation Engine
// Exposes all modules for use in CLI, API server, and tests

pub mod columns;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod model;
pub mod parser;
pub mod ranking;
pub mod recompute;
pub mod regions;
pub mod scoring;
pub mod weights;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use columns::{ColumnMapper, ColumnSchema, SubColumn};
pub use config::Config;
pub use db::{
    open_database, setup_database, insert_records, find_records, clear_rankings,
    verify_count, count_by_category, CategoryCount, IngestionRun, RunOutcome,
};
pub use error::{ClassificationError, RankingError};
pub use ingest::{import_files, FileReport, ImportReport};
pub use model::{Category, InstitutionRecord, Parameter, ParameterTotals, SubScores};
pub use parser::{classify, parse_file, CsvRankingParser, ParsedFile, SourceFile};
pub use ranking::{assign_ranks, historical_order, RankedInstitution};
pub use recompute::{recompute, RankingQuery, RankingStore, RecomputeRequest, RecomputeRow};
pub use regions::{Region, RegionTable, StateFilter};
pub use scoring::{compose, composite, default_composite};
pub use weights::{rebalance, rebalance_input, validate, Bounds, WeightSet};
