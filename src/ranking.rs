// 🏆 RankAssigner - Deterministic re-ranking by computed score

use crate::model::InstitutionRecord;
use serde::Serialize;
use std::cmp::Ordering;

/// Derived view: computed standing layered over the stored record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedInstitution {
    pub record: InstitutionRecord,
    pub computed_score: f64,
    pub computed_rank: u32,
}

impl RankedInstitution {
    pub fn original_rank(&self) -> u32 {
        self.record.rank
    }

    pub fn original_score(&self) -> f64 {
        self.record.score
    }

    /// Positive = moved up compared to the historical rank
    pub fn rank_change(&self) -> i64 {
        self.record.rank as i64 - self.computed_rank as i64
    }
}

/// Sort by computed score (descending) and assign 1-based ranks.
///
/// The sort is stable: tied scores keep their input order and still get
/// distinct consecutive ranks.
pub fn assign_ranks(scored: Vec<(InstitutionRecord, f64)>) -> Vec<RankedInstitution> {
    let mut scored = scored;
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (record, computed_score))| RankedInstitution {
            record,
            computed_score,
            computed_rank: idx as u32 + 1,
        })
        .collect()
}

/// Historical listing: order by stored rank, computed = original
pub fn historical_order(records: Vec<InstitutionRecord>) -> Vec<RankedInstitution> {
    let mut records = records;
    records.sort_by_key(|r| r.rank);

    records
        .into_iter()
        .map(|record| RankedInstitution {
            computed_score: record.score,
            computed_rank: record.rank,
            record,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn rec(name: &str, rank: u32) -> InstitutionRecord {
        InstitutionRecord::new(name, 2024, Category::Overall).with_standing(rank, 0.0)
    }

    fn names(ranked: &[RankedInstitution]) -> Vec<&str> {
        ranked.iter().map(|r| r.record.display_name()).collect()
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = assign_ranks(vec![(rec("A", 1), 85.0), (rec("B", 2), 90.0), (rec("C", 3), 85.0)]);
        assert_eq!(names(&ranked), vec!["B", "A", "C"]);
        let ranks: Vec<u32> = ranked.iter().map(|r| r.computed_rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);

        let ranked = assign_ranks(vec![(rec("C", 3), 85.0), (rec("B", 2), 90.0), (rec("A", 1), 85.0)]);
        assert_eq!(names(&ranked), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_original_rank_retained() {
        let ranked = assign_ranks(vec![(rec("A", 1), 50.0), (rec("B", 2), 60.0)]);
        assert_eq!(ranked[0].original_rank(), 2);
        assert_eq!(ranked[0].computed_rank, 1);
        assert_eq!(ranked[0].rank_change(), 1);
        assert_eq!(ranked[1].rank_change(), -1);
    }

    #[test]
    fn test_ranks_are_permutation() {
        let scores = [12.5, 99.0, 47.25, 3.0, 88.8, 61.0, 70.1];
        let input = scores
            .iter()
            .enumerate()
            .map(|(i, s)| (rec(&format!("I{i}"), i as u32 + 1), *s))
            .collect();
        let ranked = assign_ranks(input);

        let mut ranks: Vec<u32> = ranked.iter().map(|r| r.computed_rank).collect();
        ranks.sort();
        assert_eq!(ranks, (1..=scores.len() as u32).collect::<Vec<_>>());

        for pair in ranked.windows(2) {
            assert!(pair[0].computed_score >= pair[1].computed_score);
        }
    }

    #[test]
    fn test_reranking_is_idempotent() {
        let first = assign_ranks(vec![
            (rec("A", 1), 70.0),
            (rec("B", 2), 70.0),
            (rec("C", 3), 95.5),
            (rec("D", 4), 10.0),
        ]);
        let again = assign_ranks(
            first
                .iter()
                .map(|r| (r.record.clone(), r.computed_score))
                .collect(),
        );
        assert_eq!(first, again);
    }

    #[test]
    fn test_empty_input() {
        assert!(assign_ranks(Vec::new()).is_empty());
    }

    #[test]
    fn test_historical_order() {
        let listed = historical_order(vec![rec("Second", 2), rec("First", 1)]);
        assert_eq!(names(&listed), vec!["First", "Second"]);
        assert_eq!(listed[0].computed_rank, 1);
    }
}
