// 🗄️ Storage - SQLite (WAL) persistence for institution records
// Records are immutable once stored; a reingestion clears and reloads them

use crate::error::Result;
use crate::model::{Category, InstitutionRecord, ParameterTotals, SubScores};
use crate::recompute::{RankingQuery, RankingStore};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Rankings Table (one row per institution per year/category)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS rankings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_uuid TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            institution TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            rank INTEGER NOT NULL,
            score REAL NOT NULL,
            year INTEGER NOT NULL,
            category TEXT NOT NULL,
            tlr REAL NOT NULL DEFAULT 0,
            rp REAL NOT NULL DEFAULT 0,
            go REAL NOT NULL DEFAULT 0,
            oi REAL NOT NULL DEFAULT 0,
            pr REAL NOT NULL DEFAULT 0,
            sub_scores TEXT,
            source_file TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Ingestion Runs Table (audit trail, one row per source file per run)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ingestion_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            file_name TEXT NOT NULL,
            category TEXT,
            year INTEGER,
            checksum TEXT,
            accepted INTEGER NOT NULL DEFAULT 0,
            rejected INTEGER NOT NULL DEFAULT 0,
            unknown_states INTEGER NOT NULL DEFAULT 0,
            outcome TEXT NOT NULL,
            message TEXT,
            imported_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_rankings_year_category ON rankings(year, category)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_rankings_state ON rankings(state)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_runs_run_id ON ingestion_runs(run_id)",
        [],
    )?;

    Ok(())
}

/// Delete every stored record (first half of a reingestion)
pub fn clear_rankings(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM rankings", [])?;
    debug!(deleted, "cleared rankings table");
    Ok(deleted)
}

pub fn insert_records(conn: &Connection, records: &[InstitutionRecord]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO rankings (
            record_uuid, name, institution, city, state, rank, score, year, category,
            tlr, rp, go, oi, pr, sub_scores, source_file
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    )?;

    let mut inserted = 0;
    for record in records {
        let sub_scores_json =
            serde_json::to_string(&record.sub_scores).unwrap_or_else(|_| "{}".to_string());

        inserted += stmt.execute(params![
            record.id,
            record.name,
            record.institution,
            record.city,
            record.state,
            record.rank,
            record.score,
            record.year,
            record.category.as_str(),
            record.totals.tlr,
            record.totals.rp,
            record.totals.go,
            record.totals.oi,
            record.totals.pr,
            sub_scores_json,
            record.source_file,
        ])?;
    }

    Ok(inserted)
}

/// Records for a (year, category), optionally restricted to a state set.
/// Ordered by historical rank, then insertion order.
pub fn find_records(conn: &Connection, query: &RankingQuery) -> Result<Vec<InstitutionRecord>> {
    let mut values: Vec<Value> = vec![Value::Integer(query.year as i64)];

    let categories: Vec<&str> = match query.category {
        // older imports stored the short form
        Category::Engineering => vec!["engineering", "eng"],
        other => vec![other.as_str()],
    };
    let category_slots = placeholders(values.len() + 1, categories.len());
    values.extend(categories.iter().map(|c| Value::Text(c.to_string())));

    let mut sql = format!(
        "SELECT record_uuid, name, institution, city, state, rank, score, year, category,
                tlr, rp, go, oi, pr, sub_scores, source_file
         FROM rankings
         WHERE year = ?1 AND category IN ({})",
        category_slots
    );

    if let Some(states) = query.filter.states() {
        let state_slots = placeholders(values.len() + 1, states.len());
        values.extend(states.iter().map(|s| Value::Text(s.to_string())));
        sql.push_str(&format!(" AND state IN ({})", state_slots));
    }

    sql.push_str(" ORDER BY rank ASC, id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            let category_str: String = row.get(8)?;
            let category = category_str
                .parse::<Category>()
                .map_err(|_| rusqlite::Error::InvalidQuery)?;

            let sub_scores_json: Option<String> = row.get(14)?;
            let sub_scores: SubScores = sub_scores_json
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default();

            let name: String = row.get(1)?;
            let institution: String = row.get(2)?;

            Ok(InstitutionRecord {
                id: row.get(0)?,
                // keep both aliases populated even for hand-edited rows
                name: if name.is_empty() { institution.clone() } else { name.clone() },
                institution: if institution.is_empty() { name } else { institution },
                city: row.get(3)?,
                state: row.get(4)?,
                rank: row.get(5)?,
                score: row.get(6)?,
                year: row.get(7)?,
                category,
                totals: ParameterTotals {
                    tlr: row.get(9)?,
                    rp: row.get(10)?,
                    go: row.get(11)?,
                    oi: row.get(12)?,
                    pr: row.get(13)?,
                },
                sub_scores,
                source_file: row.get(15)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records)
}

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

impl RankingStore for Connection {
    fn find(&self, query: &RankingQuery) -> Result<Vec<InstitutionRecord>> {
        find_records(self, query)
    }
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM rankings", [], |row| row.get(0))?;

    Ok(count)
}

/// Record count per (category, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub year: i32,
    pub count: i64,
}

pub fn count_by_category(conn: &Connection) -> Result<Vec<CategoryCount>> {
    let mut stmt = conn.prepare(
        "SELECT category, year, COUNT(*)
         FROM rankings
         GROUP BY category, year
         ORDER BY category, year DESC",
    )?;

    let counts = stmt
        .query_map([], |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                year: row.get(1)?,
                count: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(counts)
}

// ============================================================================
// INGESTION RUNS (audit trail)
// ============================================================================

/// SHA-256 of a source file's bytes (hex)
pub fn file_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Imported,
    Skipped,
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Imported => "imported",
            RunOutcome::Skipped => "skipped",
            RunOutcome::Failed => "failed",
        }
    }

    fn from_db(s: &str) -> RunOutcome {
        match s {
            "imported" => RunOutcome::Imported,
            "skipped" => RunOutcome::Skipped,
            _ => RunOutcome::Failed,
        }
    }
}

/// One source file's result within an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRun {
    pub run_id: String,
    pub file_name: String,
    pub category: Option<Category>,
    pub year: Option<i32>,
    pub checksum: Option<String>,
    pub accepted: usize,
    pub rejected: usize,
    pub unknown_states: usize,
    pub outcome: RunOutcome,
    pub message: Option<String>,
    pub imported_at: DateTime<Utc>,
}

pub fn insert_ingestion_run(conn: &Connection, run: &IngestionRun) -> Result<()> {
    conn.execute(
        "INSERT INTO ingestion_runs (
            run_id, file_name, category, year, checksum, accepted, rejected,
            unknown_states, outcome, message, imported_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            run.run_id,
            run.file_name,
            run.category.map(|c| c.as_str()),
            run.year,
            run.checksum,
            run.accepted as i64,
            run.rejected as i64,
            run.unknown_states as i64,
            run.outcome.as_str(),
            run.message,
            run.imported_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

pub fn get_ingestion_runs(conn: &Connection, run_id: &str) -> Result<Vec<IngestionRun>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, file_name, category, year, checksum, accepted, rejected,
                unknown_states, outcome, message, imported_at
         FROM ingestion_runs
         WHERE run_id = ?1
         ORDER BY id ASC",
    )?;

    let runs = stmt
        .query_map([run_id], |row| {
            let category: Option<String> = row.get(2)?;
            let outcome: String = row.get(8)?;
            let imported_at: String = row.get(10)?;

            Ok(IngestionRun {
                run_id: row.get(0)?,
                file_name: row.get(1)?,
                category: category.and_then(|c| c.parse().ok()),
                year: row.get(3)?,
                checksum: row.get(4)?,
                accepted: row.get::<_, i64>(5)? as usize,
                rejected: row.get::<_, i64>(6)? as usize,
                unknown_states: row.get::<_, i64>(7)? as usize,
                outcome: RunOutcome::from_db(&outcome),
                message: row.get(9)?,
                imported_at: DateTime::parse_from_rfc3339(&imported_at)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::StateFilter;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn record(name: &str, state: &str, rank: u32, year: i32, category: Category) -> InstitutionRecord {
        let mut sub_scores = SubScores::default();
        sub_scores.set("TLR_SS", 18.0);
        InstitutionRecord::new(name, year, category)
            .with_location("City", state)
            .with_standing(rank, 50.0 + rank as f64)
            .with_totals(ParameterTotals::new(90.0, 60.0, 70.0, 40.0, 30.0))
            .with_sub_scores(sub_scores)
            .with_source_file("eng_2024.csv")
    }

    fn query(year: i32, category: Category, filter: StateFilter) -> RankingQuery {
        RankingQuery { year, category, filter }
    }

    #[test]
    fn test_insert_and_find_roundtrip() {
        let conn = test_conn();
        let original = record("IIT Madras", "Tamil Nadu", 1, 2024, Category::Engineering);
        insert_records(&conn, &[original.clone()]).unwrap();

        let found = find_records(&conn, &query(2024, Category::Engineering, StateFilter::All)).unwrap();
        assert_eq!(found, vec![original]);
    }

    #[test]
    fn test_find_filters_year_category_and_state() {
        let conn = test_conn();
        insert_records(
            &conn,
            &[
                record("A", "Kerala", 2, 2024, Category::Overall),
                record("B", "Delhi", 1, 2024, Category::Overall),
                record("C", "Karnataka", 3, 2024, Category::Overall),
                record("D", "Kerala", 1, 2023, Category::Overall),
                record("E", "Kerala", 1, 2024, Category::College),
            ],
        )
        .unwrap();

        let all = find_records(&conn, &query(2024, Category::Overall, StateFilter::All)).unwrap();
        let names: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);

        let south = StateFilter::resolve(Some("South"), None);
        let found = find_records(&conn, &query(2024, Category::Overall, south)).unwrap();
        let names: Vec<&str> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);

        let single = StateFilter::resolve(None, Some("Delhi"));
        let found = find_records(&conn, &query(2024, Category::Overall, single)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "B");
    }

    #[test]
    fn test_legacy_eng_category_matches_engineering() {
        let conn = test_conn();
        insert_records(&conn, &[record("Legacy", "Goa", 1, 2022, Category::Engineering)]).unwrap();
        conn.execute("UPDATE rankings SET category = 'eng'", []).unwrap();

        let found = find_records(&conn, &query(2022, Category::Engineering, StateFilter::All)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, Category::Engineering);
    }

    #[test]
    fn test_clear_and_counts() {
        let conn = test_conn();
        insert_records(
            &conn,
            &[
                record("A", "Goa", 1, 2024, Category::Overall),
                record("B", "Goa", 2, 2024, Category::Overall),
                record("C", "Goa", 1, 2024, Category::College),
            ],
        )
        .unwrap();

        assert_eq!(verify_count(&conn).unwrap(), 3);
        let counts = count_by_category(&conn).unwrap();
        assert_eq!(
            counts,
            vec![
                CategoryCount { category: "college".to_string(), year: 2024, count: 1 },
                CategoryCount { category: "overall".to_string(), year: 2024, count: 2 },
            ]
        );

        assert_eq!(clear_rankings(&conn).unwrap(), 3);
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_ingestion_run_log() {
        let conn = test_conn();
        let run = IngestionRun {
            run_id: "run-1".to_string(),
            file_name: "eng_2024.csv".to_string(),
            category: Some(Category::Engineering),
            year: Some(2024),
            checksum: Some(file_checksum(b"abc")),
            accepted: 10,
            rejected: 2,
            unknown_states: 1,
            outcome: RunOutcome::Imported,
            message: None,
            imported_at: Utc::now(),
        };
        insert_ingestion_run(&conn, &run).unwrap();

        let runs = get_ingestion_runs(&conn, "run-1").unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].accepted, 10);
        assert_eq!(runs[0].category, Some(Category::Engineering));
        assert_eq!(runs[0].outcome, RunOutcome::Imported);
        assert!(get_ingestion_runs(&conn, "other").unwrap().is_empty());
    }

    #[test]
    fn test_file_checksum() {
        assert_eq!(
            file_checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
