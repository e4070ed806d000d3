//! Weight sets for on-demand recomputation.
//!
//! A `WeightSet` is built per request and never persisted.

pub mod balancer;
pub mod validation;

use crate::model::Parameter;
use serde::{Deserialize, Serialize};

pub use balancer::{rebalance, rebalance_input};
pub use validation::validate;

/// Interactive edits balance toward this total
pub const TARGET_TOTAL: u32 = 100;

/// Envelope a submitted set's sum must fall within
pub const MIN_TOTAL: u32 = 100;
pub const MAX_TOTAL: u32 = 200;

/// Inclusive bounds for one parameter's weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub fn of(parameter: Parameter) -> Bounds {
        match parameter {
            Parameter::Tlr => Bounds { min: 10, max: 60 },
            Parameter::Rp => Bounds { min: 5, max: 50 },
            Parameter::Go => Bounds { min: 5, max: 50 },
            Parameter::Oi => Bounds { min: 5, max: 20 },
            Parameter::Pr => Bounds { min: 5, max: 20 },
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min as i64 && value <= self.max as i64
    }

    pub fn clamp(&self, value: i64) -> u32 {
        value.clamp(self.min as i64, self.max as i64) as u32
    }
}

/// Five named weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightSet {
    pub tlr: u32,
    // legacy clients send rpp / perc
    #[serde(alias = "rpp")]
    pub rp: u32,
    pub go: u32,
    pub oi: u32,
    #[serde(alias = "perc")]
    pub pr: u32,
}

impl Default for WeightSet {
    fn default() -> Self {
        WeightSet::new(30, 30, 20, 10, 10)
    }
}

impl WeightSet {
    /// Equal weights used by the ingestion sanity filter
    pub const INGESTION: WeightSet = WeightSet {
        tlr: 20,
        rp: 20,
        go: 20,
        oi: 20,
        pr: 20,
    };

    pub const fn new(tlr: u32, rp: u32, go: u32, oi: u32, pr: u32) -> Self {
        WeightSet { tlr, rp, go, oi, pr }
    }

    pub fn get(&self, parameter: Parameter) -> u32 {
        match parameter {
            Parameter::Tlr => self.tlr,
            Parameter::Rp => self.rp,
            Parameter::Go => self.go,
            Parameter::Oi => self.oi,
            Parameter::Pr => self.pr,
        }
    }

    pub fn set(&mut self, parameter: Parameter, value: u32) {
        match parameter {
            Parameter::Tlr => self.tlr = value,
            Parameter::Rp => self.rp = value,
            Parameter::Go => self.go = value,
            Parameter::Oi => self.oi = value,
            Parameter::Pr => self.pr = value,
        }
    }

    pub fn total(&self) -> i64 {
        Parameter::ALL.iter().map(|p| self.get(*p) as i64).sum()
    }

    /// Parse "tlr,rp,go,oi,pr" (e.g. "30,30,20,10,10")
    pub fn parse_csv(input: &str) -> Option<WeightSet> {
        let values: Vec<u32> = input
            .split(',')
            .map(|v| v.trim().parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;

        match values.as_slice() {
            [tlr, rp, go, oi, pr] => Some(WeightSet::new(*tlr, *rp, *go, *oi, *pr)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_target() {
        assert_eq!(WeightSet::default().total(), TARGET_TOTAL as i64);
        assert_eq!(WeightSet::INGESTION.total(), TARGET_TOTAL as i64);
    }

    #[test]
    fn test_bounds_table() {
        assert_eq!(Bounds::of(Parameter::Tlr), Bounds { min: 10, max: 60 });
        assert_eq!(Bounds::of(Parameter::Oi), Bounds { min: 5, max: 20 });
        assert!(Bounds::of(Parameter::Pr).contains(20));
        assert!(!Bounds::of(Parameter::Pr).contains(21));
        assert_eq!(Bounds::of(Parameter::Go).clamp(-3), 5);
        assert_eq!(Bounds::of(Parameter::Go).clamp(99), 50);
    }

    #[test]
    fn test_get_set_roundtrip_per_parameter() {
        let mut w = WeightSet::default();
        w.set(Parameter::Oi, 15);
        assert_eq!(w.get(Parameter::Oi), 15);
        assert_eq!(w.total(), 105);
    }

    #[test]
    fn test_parse_csv() {
        assert_eq!(WeightSet::parse_csv("40, 20,20,10,10"), Some(WeightSet::new(40, 20, 20, 10, 10)));
        assert_eq!(WeightSet::parse_csv("40,20,20,10"), None);
        assert_eq!(WeightSet::parse_csv("40,x,20,10,10"), None);
    }

    #[test]
    fn test_deserialize_legacy_keys() {
        let w: WeightSet =
            serde_json::from_str(r#"{"tlr":30,"rpp":30,"go":20,"oi":10,"perc":10}"#).unwrap();
        assert_eq!(w, WeightSet::default());
    }
}
