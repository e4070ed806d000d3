// 🔁 Recomputation Engine - Request → filter → compose → rank
// Pure over the stored records: nothing here mutates them

use crate::error::{RankingError, Result};
use crate::model::{Category, InstitutionRecord};
use crate::ranking::{assign_ranks, historical_order, RankedInstitution};
use crate::regions::StateFilter;
use crate::scoring::compose;
use crate::weights::{validate, WeightSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ============================================================================
// QUERY + STORE SEAM
// ============================================================================

/// Candidate selection for one request
#[derive(Debug, Clone, PartialEq)]
pub struct RankingQuery {
    pub year: i32,
    pub category: Category,
    pub filter: StateFilter,
}

impl RankingQuery {
    pub fn matches(&self, record: &InstitutionRecord) -> bool {
        record.year == self.year
            && record.category == self.category
            && self.filter.matches(&record.state)
    }
}

/// Anything that can hand back stored records for a query
pub trait RankingStore {
    /// Matching records, ordered by historical rank
    fn find(&self, query: &RankingQuery) -> Result<Vec<InstitutionRecord>>;
}

impl RankingStore for [InstitutionRecord] {
    fn find(&self, query: &RankingQuery) -> Result<Vec<InstitutionRecord>> {
        let mut found: Vec<InstitutionRecord> =
            self.iter().filter(|r| query.matches(r)).cloned().collect();
        found.sort_by_key(|r| r.rank);
        Ok(found)
    }
}

impl RankingStore for Vec<InstitutionRecord> {
    fn find(&self, query: &RankingQuery) -> Result<Vec<InstitutionRecord>> {
        self.as_slice().find(query)
    }
}

// ============================================================================
// REQUEST / RESPONSE
// ============================================================================

/// Recomputation request; year and category are mandatory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecomputeRequest {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Absent → historical listing
    #[serde(default)]
    pub weights: Option<WeightSet>,
}

impl RecomputeRequest {
    pub fn new(year: i32, category: impl Into<String>) -> Self {
        RecomputeRequest {
            year: Some(year),
            category: Some(category.into()),
            ..Default::default()
        }
    }

    /// Builder pattern: add region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Builder pattern: add state
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Builder pattern: add weights
    pub fn with_weights(mut self, weights: WeightSet) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Resolve the mandatory fields into a query
    pub fn to_query(&self) -> Result<RankingQuery> {
        let year = self
            .year
            .filter(|y| *y != 0)
            .ok_or(RankingError::MissingRequiredField("year"))?;

        let category = match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.parse::<Category>()?,
            _ => return Err(RankingError::MissingRequiredField("category")),
        };

        let filter = StateFilter::resolve(self.region.as_deref(), self.state.as_deref());

        Ok(RankingQuery { year, category, filter })
    }
}

/// One row of the recomputation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecomputeRow {
    pub institution_id: String,
    pub institution: String,
    pub city: String,
    pub state: String,
    pub original_rank: u32,
    pub original_score: f64,
    pub computed_rank: u32,
    pub computed_score: f64,
}

impl From<RankedInstitution> for RecomputeRow {
    fn from(ranked: RankedInstitution) -> Self {
        let institution = ranked.record.display_name().to_string();
        RecomputeRow {
            institution_id: ranked.record.id,
            institution,
            city: ranked.record.city,
            state: ranked.record.state,
            original_rank: ranked.record.rank,
            original_score: ranked.record.score,
            computed_rank: ranked.computed_rank,
            computed_score: ranked.computed_score,
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Run one request against a store.
///
/// Weights (when given) are validated before any record is read. An empty
/// candidate set is reported as `NoMatchingRecords`, not an empty list.
pub fn recompute<S: RankingStore + ?Sized>(
    store: &S,
    request: &RecomputeRequest,
) -> Result<Vec<RecomputeRow>> {
    let query = request.to_query()?;

    if let Some(weights) = &request.weights {
        validate(weights)?;
    }

    debug!(year = query.year, category = %query.category, filter = ?query.filter, "fetching candidates");
    let records = store.find(&query)?;

    if records.is_empty() {
        return Err(RankingError::NoMatchingRecords {
            year: query.year,
            category: query.category.to_string(),
        });
    }

    let ranked = match &request.weights {
        Some(weights) => rank_with_weights(records, weights),
        None => historical_order(records),
    };

    info!(
        year = query.year,
        category = %query.category,
        results = ranked.len(),
        weighted = request.weights.is_some(),
        "rankings computed"
    );

    Ok(ranked.into_iter().map(RecomputeRow::from).collect())
}

/// Compose and rank an already-selected candidate set
pub fn rank_with_weights(records: Vec<InstitutionRecord>, weights: &WeightSet) -> Vec<RankedInstitution> {
    let scored = records
        .into_iter()
        .map(|record| {
            let score = compose(&record, weights);
            (record, score)
        })
        .collect();

    assign_ranks(scored)
}

// ============================================================================
// TESTS
// ============================================================================
