// 🗺️ Region Table + RegionFilter
// Static region → state reference data, shared process-wide

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Sentinel accepted for both region and state meaning "no filter"
pub const ALL: &str = "All";

// ============================================================================
// REGION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
    Northeast,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::North,
        Region::South,
        Region::East,
        Region::West,
        Region::Central,
        Region::Northeast,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
            Region::Central => "Central",
            Region::Northeast => "Northeast",
        }
    }

    /// Case-insensitive lookup; `None` for unknown names and for "All"
    pub fn parse(name: &str) -> Option<Region> {
        let name = name.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name))
    }

    fn member_states(&self) -> &'static [&'static str] {
        match self {
            Region::North => &[
                "Delhi",
                "Haryana",
                "Himachal Pradesh",
                "Jammu and Kashmir",
                "Punjab",
                "Uttarakhand",
                "Uttar Pradesh",
                "Chandigarh",
                "Ladakh",
            ],
            Region::South => &[
                "Andhra Pradesh",
                "Karnataka",
                "Kerala",
                "Tamil Nadu",
                "Telangana",
                "Puducherry",
                "Lakshadweep",
            ],
            Region::East => &[
                "Bihar",
                "Jharkhand",
                "Odisha",
                "West Bengal",
                "Andaman and Nicobar Islands",
            ],
            Region::West => &[
                "Goa",
                "Gujarat",
                "Maharashtra",
                "Rajasthan",
                "Dadra and Nagar Haveli",
                "Daman and Diu",
            ],
            Region::Central => &["Chhattisgarh", "Madhya Pradesh"],
            Region::Northeast => &[
                "Arunachal Pradesh",
                "Assam",
                "Manipur",
                "Meghalaya",
                "Mizoram",
                "Nagaland",
                "Sikkim",
                "Tripura",
            ],
        }
    }
}

// ============================================================================
// REGION TABLE
// ============================================================================

/// Read-only region reference data.
/// Built once on first use; no locking after that.
#[derive(Debug)]
pub struct RegionTable {
    regions: Vec<(Region, &'static [&'static str])>,
    state_index: HashMap<String, Region>,
}

static REGION_TABLE: OnceLock<RegionTable> = OnceLock::new();

impl RegionTable {
    fn build() -> Self {
        let regions: Vec<_> = Region::ALL
            .into_iter()
            .map(|r| (r, r.member_states()))
            .collect();

        let state_index = regions
            .iter()
            .flat_map(|(region, states)| states.iter().map(move |s| (s.to_lowercase(), *region)))
            .collect();

        RegionTable { regions, state_index }
    }

    /// Process-wide table
    pub fn global() -> &'static RegionTable {
        REGION_TABLE.get_or_init(RegionTable::build)
    }

    pub fn states(&self, region: Region) -> &'static [&'static str] {
        self.regions
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, states)| *states)
            .unwrap_or(&[])
    }

    /// Region a state belongs to (case-insensitive)
    pub fn region_of(&self, state: &str) -> Option<Region> {
        self.state_index.get(&state.trim().to_lowercase()).copied()
    }

    pub fn is_known_state(&self, state: &str) -> bool {
        self.region_of(state).is_some()
    }

    /// Every known state, in region order
    pub fn all_states(&self) -> Vec<&'static str> {
        self.regions
            .iter()
            .flat_map(|(_, states)| states.iter().copied())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Region, &'static [&'static str])> + '_ {
        self.regions.iter().copied()
    }
}

// ============================================================================
// STATE FILTER (RegionFilter)
// ============================================================================

/// State restriction applied to a candidate set before ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateFilter {
    /// No state restriction
    All,
    /// Every member state of a region
    Region(Region, Vec<String>),
    /// A single named state
    State(String),
}

impl StateFilter {
    /// Resolve region/state arguments into a filter.
    ///
    /// A known region wins and the state argument is ignored. Otherwise a
    /// specific state (not "All") is used. Unknown regions behave as "All".
    pub fn resolve(region: Option<&str>, state: Option<&str>) -> StateFilter {
        if let Some(region) = region.and_then(Region::parse) {
            let states = RegionTable::global()
                .states(region)
                .iter()
                .map(|s| s.to_string())
                .collect();
            return StateFilter::Region(region, states);
        }

        match state.map(str::trim) {
            Some(s) if !s.is_empty() && !s.eq_ignore_ascii_case(ALL) => {
                StateFilter::State(s.to_string())
            }
            _ => StateFilter::All,
        }
    }

    /// State names to restrict by, or `None` for no restriction
    pub fn states(&self) -> Option<Vec<&str>> {
        match self {
            StateFilter::All => None,
            StateFilter::Region(_, states) => Some(states.iter().map(String::as_str).collect()),
            StateFilter::State(state) => Some(vec![state.as_str()]),
        }
    }

    pub fn matches(&self, state: &str) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Region(_, states) => states.iter().any(|s| s == state),
            StateFilter::State(s) => s == state,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_south_region_states() {
        let filter = StateFilter::resolve(Some("South"), Some("Delhi"));
        let mut states = filter.states().unwrap();
        states.sort();
        assert_eq!(
            states,
            vec![
                "Andhra Pradesh",
                "Karnataka",
                "Kerala",
                "Lakshadweep",
                "Puducherry",
                "Tamil Nadu",
                "Telangana",
            ]
        );
        assert!(!filter.matches("Delhi"));
        assert!(filter.matches("Kerala"));
    }

    #[test]
    fn test_state_only_filter() {
        let filter = StateFilter::resolve(Some("All"), Some("Punjab"));
        assert_eq!(filter, StateFilter::State("Punjab".to_string()));
        assert!(filter.matches("Punjab"));
        assert!(!filter.matches("Goa"));
    }

    #[test]
    fn test_unknown_region_behaves_as_all() {
        assert_eq!(StateFilter::resolve(Some("Atlantis"), None), StateFilter::All);
        assert_eq!(StateFilter::resolve(Some("Atlantis"), Some("All")), StateFilter::All);
        assert_eq!(StateFilter::resolve(None, None), StateFilter::All);
        assert!(StateFilter::All.matches("anything"));
        assert!(StateFilter::All.states().is_none());
    }

    #[test]
    fn test_unknown_region_falls_back_to_state() {
        let filter = StateFilter::resolve(Some("Atlantis"), Some("Goa"));
        assert_eq!(filter, StateFilter::State("Goa".to_string()));
    }

    #[test]
    fn test_region_parse_case_insensitive() {
        assert_eq!(Region::parse("northeast"), Some(Region::Northeast));
        assert_eq!(Region::parse(" CENTRAL "), Some(Region::Central));
        assert_eq!(Region::parse("All"), None);
    }

    #[test]
    fn test_region_of_state() {
        let table = RegionTable::global();
        assert_eq!(table.region_of("tamil nadu"), Some(Region::South));
        assert_eq!(table.region_of("Assam"), Some(Region::Northeast));
        assert_eq!(table.region_of("Narnia"), None);
    }

    #[test]
    fn test_every_state_belongs_to_one_region() {
        let table = RegionTable::global();
        let all = table.all_states();
        assert_eq!(all.len(), 37);
        for state in all {
            assert!(table.is_known_state(state));
        }
    }
}
