use super::{Bounds, WeightSet, TARGET_TOTAL};
use crate::model::Parameter;

/// Set one parameter and redistribute the rest toward a total of 100.
///
/// The requested value is clamped into its bounds. The remaining budget is
/// split across the other four parameters in proportion to their current
/// weights, each clamped to its own bounds. If the others are all zero the
/// budget is split equally and any shortfall goes to the last of them.
///
/// Best-effort: clamping can leave the total off 100. Only the bounds are
/// guaranteed.
pub fn rebalance(current: &WeightSet, parameter: Parameter, requested: i64) -> WeightSet {
    let target = TARGET_TOTAL as i64;
    let new_value = Bounds::of(parameter).clamp(requested);

    let mut next = *current;
    next.set(parameter, new_value);

    if next.total() == target {
        return clamp_all(next);
    }

    let remainder = target - new_value as i64;
    let others: Vec<Parameter> = Parameter::ALL
        .into_iter()
        .filter(|p| *p != parameter)
        .collect();
    let others_total: i64 = others.iter().map(|p| current.get(*p) as i64).sum();

    if others_total > 0 {
        for p in &others {
            let share = current.get(*p) as f64 / others_total as f64 * remainder as f64;
            next.set(*p, Bounds::of(*p).clamp(round_half_up(share)));
        }
    } else {
        let equal_share = remainder.div_euclid(others.len() as i64);
        for p in &others {
            next.set(*p, Bounds::of(*p).clamp(equal_share));
        }

        let actual = next.total();
        if actual < target {
            if let Some(last) = others.last() {
                let topped = next.get(*last) as i64 + (target - actual);
                next.set(*last, Bounds::of(*last).clamp(topped));
            }
        }
    }

    next
}

/// `rebalance` for raw user input.
///
/// Only the leading integer counts ("12.7" and "12abc" both mean 12); input
/// without one means the parameter's minimum.
pub fn rebalance_input(current: &WeightSet, parameter: Parameter, input: &str) -> WeightSet {
    let requested = leading_integer(input).unwrap_or(Bounds::of(parameter).min as i64);
    rebalance(current, parameter, requested)
}

fn leading_integer(input: &str) -> Option<i64> {
    let input = input.trim_start();
    let digits_start = usize::from(input.starts_with(['+', '-']));
    let digits_end = input[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(input.len(), |i| i + digits_start);

    input[..digits_end].parse().ok()
}

// Untouched weights may come from the caller out of bounds
fn clamp_all(mut weights: WeightSet) -> WeightSet {
    for p in Parameter::ALL {
        let value = weights.get(p) as i64;
        weights.set(p, Bounds::of(p).clamp(value));
    }
    weights
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
