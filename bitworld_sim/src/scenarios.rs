//! Counterfactual resource scenarios.
//!
//! A scenario replaces the initial endowment of every run in a batch and
//! tags the output rows with `scenario,initial_resource`.

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// Reference endowment of 100
    Baseline,

    /// A tenth of the baseline
    Scarcity,

    /// Ten times the baseline
    Abundance,

    /// No endowment: no edit can ever be paid for
    Barren,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::Scarcity,
            ScenarioId::Abundance,
            ScenarioId::Barren,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::Scarcity => "scarcity",
            ScenarioId::Abundance => "abundance",
            ScenarioId::Barren => "barren",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "Initial endowment of 100 resource units",
            ScenarioId::Scarcity => "Initial endowment of 10: the store runs dry early",
            ScenarioId::Abundance => "Initial endowment of 1000: edits are rarely blocked",
            ScenarioId::Barren => "No endowment: sequences stay at their initial values",
        }
    }

    /// Initial endowment the scenario imposes.
    pub fn initial_resource(&self) -> f64 {
        match self {
            ScenarioId::Baseline => 100.0,
            ScenarioId::Scarcity => 10.0,
            ScenarioId::Abundance => 1000.0,
            ScenarioId::Barren => 0.0,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(ScenarioId::Baseline),
            "scarcity" | "scarce" => Ok(ScenarioId::Scarcity),
            "abundance" | "abundant" => Ok(ScenarioId::Abundance),
            "barren" | "none" => Ok(ScenarioId::Barren),
            _ => Err(DriverError::UnknownScenario(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>().unwrap(), scenario);
        }
    }

    #[test]
    fn test_unknown_scenario() {
        assert!(matches!(
            "doomsday".parse::<ScenarioId>(),
            Err(DriverError::UnknownScenario(name)) if name == "doomsday"
        ));
    }

    #[test]
    fn test_endowments_ordered() {
        assert!(ScenarioId::Barren.initial_resource() < ScenarioId::Scarcity.initial_resource());
        assert!(ScenarioId::Scarcity.initial_resource() < ScenarioId::Baseline.initial_resource());
        assert!(ScenarioId::Baseline.initial_resource() < ScenarioId::Abundance.initial_resource());
    }
}
