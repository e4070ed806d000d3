use super::{Bounds, WeightSet, MAX_TOTAL, MIN_TOTAL};
use crate::error::{RankingError, Result};
use crate::model::Parameter;

/// Validate a weight set before recomputation.
///
/// Per-parameter bounds are checked first (tlr, rp, go, oi, pr), then the
/// total. The first failing rule is reported; nothing is partially applied.
pub fn validate(weights: &WeightSet) -> Result<()> {
    for parameter in Parameter::ALL {
        let bounds = Bounds::of(parameter);
        let value = weights.get(parameter) as i64;
        if !bounds.contains(value) {
            return Err(RankingError::WeightOutOfBounds {
                parameter,
                value,
                min: bounds.min,
                max: bounds.max,
            });
        }
    }

    let sum = weights.total();
    if sum < MIN_TOTAL as i64 || sum > MAX_TOTAL as i64 {
        return Err(RankingError::WeightSumOutOfRange {
            sum,
            min: MIN_TOTAL,
            max: MAX_TOTAL,
        });
    }

    Ok(())
}
