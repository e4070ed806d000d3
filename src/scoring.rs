// ⚖️ ScoreComposer - Weighted composite of the five parameter totals
//
// composite = Σ(total_i × weight_i) / Σ weight_i, reported to 2 decimals.
// Dividing by the total weight keeps the composite on the same scale as the
// parameter totals for any submitted weight sum in [100, 200].

use crate::model::{InstitutionRecord, Parameter, ParameterTotals};
use crate::weights::WeightSet;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Raw composite; `None` when the result is not finite (e.g. total weight 0)
pub fn composite(totals: &ParameterTotals, weights: &WeightSet) -> Option<f64> {
    let total_weight = weights.total() as f64;
    let weighted: f64 = Parameter::ALL
        .iter()
        .map(|p| totals.get(*p) * weights.get(*p) as f64)
        .sum();

    let score = weighted / total_weight;
    score.is_finite().then_some(score)
}

/// Composite score for a record, falling back to its stored historical score
pub fn compose(record: &InstitutionRecord, weights: &WeightSet) -> f64 {
    match composite(&record.totals, weights) {
        Some(score) => round2(score),
        None => record.score,
    }
}

/// Ingestion sanity score: equal 20/20/20/20/20 weighting
pub fn default_composite(totals: &ParameterTotals) -> f64 {
    composite(totals, &WeightSet::INGESTION).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn record(totals: ParameterTotals, score: f64) -> InstitutionRecord {
        InstitutionRecord::new("Test Institute", 2024, Category::Overall)
            .with_standing(1, score)
            .with_totals(totals)
    }

    #[test]
    fn test_zero_totals_score_zero_for_any_weights() {
        let zero = record(ParameterTotals::default(), 77.0);
        for weights in [
            WeightSet::default(),
            WeightSet::new(60, 50, 50, 20, 20),
            WeightSet::new(10, 5, 5, 5, 5),
        ] {
            assert_eq!(compose(&zero, &weights), 0.0);
        }
    }

    #[test]
    fn test_normalized_by_total_weight() {
        let rec = record(ParameterTotals::new(80.0, 60.0, 70.0, 50.0, 40.0), 0.0);
        // 80*30 + 60*30 + 70*20 + 50*10 + 40*10 = 6500 / 100
        assert_eq!(compose(&rec, &WeightSet::default()), 65.0);

        // doubling every weight leaves the composite unchanged
        let doubled = WeightSet::new(60, 60, 40, 20, 20);
        assert_eq!(compose(&rec, &doubled), 65.0);
    }

    #[test]
    fn test_rounded_to_two_decimals() {
        let rec = record(ParameterTotals::new(10.0, 10.0, 10.0, 10.0, 1.0), 0.0);
        // 10*30+10*30+10*20+10*10+1*10 = 910 / 100 → 9.1
        assert_eq!(compose(&rec, &WeightSet::default()), 9.1);

        let rec = record(ParameterTotals::new(1.0, 0.0, 0.0, 0.0, 0.0), 0.0);
        // 1*10/105 = 0.095238... → 0.1
        assert_eq!(compose(&rec, &WeightSet::new(10, 50, 25, 10, 10)), 0.1);
    }

    #[test]
    fn test_zero_total_weight_falls_back_to_stored_score() {
        let rec = record(ParameterTotals::new(80.0, 60.0, 70.0, 50.0, 40.0), 71.25);
        let zero = WeightSet::new(0, 0, 0, 0, 0);
        assert_eq!(composite(&rec.totals, &zero), None);
        assert_eq!(compose(&rec, &zero), 71.25);
    }

    #[test]
    fn test_default_composite_equal_weights() {
        let totals = ParameterTotals::new(92.0, 50.0, 40.0, 10.0, 8.0);
        assert_eq!(default_composite(&totals), 40.0);
        assert_eq!(default_composite(&ParameterTotals::default()), 0.0);
    }
}
