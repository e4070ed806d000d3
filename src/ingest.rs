// 📥 Bulk Import - Clear-and-reload of the ranking store
// Every file is classified, checksummed, parsed and logged; one bad file never aborts the run

use crate::db::{
    clear_rankings, count_by_category, file_checksum, insert_ingestion_run, insert_records,
    CategoryCount, IngestionRun, RunOutcome,
};
use crate::error::RankingError;
use crate::model::Category;
use crate::parser::{CsvRankingParser, SourceFile};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome for one source file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file_name: String,
    pub category: Option<Category>,
    pub year: Option<i32>,
    pub accepted: usize,
    pub rejected: usize,
    pub unknown_states: usize,
    pub outcome: RunOutcome,
    pub message: Option<String>,
}

impl FileReport {
    fn new(file_name: impl Into<String>, outcome: RunOutcome) -> Self {
        FileReport {
            file_name: file_name.into(),
            category: None,
            year: None,
            accepted: 0,
            rejected: 0,
            unknown_states: 0,
            outcome,
            message: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn with_source(mut self, source: &SourceFile) -> Self {
        self.category = Some(source.category);
        self.year = Some(source.year);
        self
    }
}

/// Result of a whole import run
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: String,
    pub files: Vec<FileReport>,
    pub total_records: usize,
    /// Store contents after the reload
    pub counts: Vec<CategoryCount>,
}

impl ImportReport {
    pub fn imported_files(&self) -> usize {
        self.count(RunOutcome::Imported)
    }

    pub fn skipped_files(&self) -> usize {
        self.count(RunOutcome::Skipped)
    }

    pub fn failed_files(&self) -> usize {
        self.count(RunOutcome::Failed)
    }

    fn count(&self, outcome: RunOutcome) -> usize {
        self.files.iter().filter(|f| f.outcome == outcome).count()
    }
}

/// Replace the stored records with the contents of `paths`.
///
/// Runs in a single transaction: readers see either the old store or the
/// fully reloaded one. Unclassifiable files are skipped, unreadable or
/// malformed ones are marked failed; both are logged to `ingestion_runs`.
pub fn import_files<P: AsRef<Path>>(conn: &mut Connection, paths: &[P]) -> Result<ImportReport> {
    let run_id = Uuid::new_v4().to_string();
    info!(run_id = %run_id, files = paths.len(), "starting import");

    let tx = conn.transaction().context("Failed to start import transaction")?;
    let cleared = clear_rankings(&tx).context("Failed to clear rankings")?;
    info!(cleared, "previous rankings cleared");

    let mut files = Vec::with_capacity(paths.len());
    let mut total_records = 0;

    for path in paths {
        let path = path.as_ref();
        let (report, checksum) = import_one(&tx, path)?;
        total_records += report.accepted;

        let run = IngestionRun {
            run_id: run_id.clone(),
            file_name: report.file_name.clone(),
            category: report.category,
            year: report.year,
            checksum,
            accepted: report.accepted,
            rejected: report.rejected,
            unknown_states: report.unknown_states,
            outcome: report.outcome.clone(),
            message: report.message.clone(),
            imported_at: Utc::now(),
        };
        insert_ingestion_run(&tx, &run).context("Failed to log ingestion run")?;

        files.push(report);
    }

    tx.commit().context("Failed to commit import")?;

    let counts = count_by_category(conn).context("Failed to count imported rankings")?;
    info!(run_id = %run_id, total_records, "import complete");

    Ok(ImportReport {
        run_id,
        files,
        total_records,
        counts,
    })
}

/// Import a single file inside the open transaction.
/// Only storage failures are returned as errors; file problems end up in the report.
fn import_one(conn: &Connection, path: &Path) -> Result<(FileReport, Option<String>)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let source = match SourceFile::detect(path) {
        Ok(source) => source,
        Err(e) => {
            warn!(file = %file_name, error = %e, "skipping unclassifiable file");
            let report = FileReport::new(file_name, RunOutcome::Skipped).with_message(e.to_string());
            return Ok((report, None));
        }
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(file = %file_name, error = %e, "could not read file");
            let report = FileReport::new(file_name, RunOutcome::Failed)
                .with_source(&source)
                .with_message(format!("Failed to read {}: {}", path.display(), e));
            return Ok((report, None));
        }
    };
    let checksum = file_checksum(&bytes);

    let parsed = match CsvRankingParser::new(source.clone()).parse_reader(bytes.as_slice()) {
        Ok(parsed) => parsed,
        Err(e) => {
            let err = RankingError::UnparseableIngestionFile {
                file: file_name.clone(),
                reason: format!("{:#}", e),
            };
            warn!(error = %err, "file rejected");
            let report = FileReport::new(file_name, RunOutcome::Failed)
                .with_source(&source)
                .with_message(err.to_string());
            return Ok((report, Some(checksum)));
        }
    };

    let inserted = insert_records(conn, &parsed.records)
        .with_context(|| format!("Failed to store records from {}", file_name))?;

    info!(
        file = %file_name,
        category = %source.category,
        year = source.year,
        accepted = inserted,
        rejected = parsed.rejected_rows,
        "file imported"
    );

    let mut report = FileReport::new(file_name, RunOutcome::Imported).with_source(&source);
    report.accepted = inserted;
    report.rejected = parsed.rejected_rows;
    report.unknown_states = parsed.unknown_states;

    Ok((report, Some(checksum)))
}
