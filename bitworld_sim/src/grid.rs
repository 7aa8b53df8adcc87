//! Parameter grids and seed generation for batch runs.

use bitworld_core::SimulationConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::scenarios::ScenarioId;

/// η/λ values swept by the reference batch.
pub const DEFAULT_RATES: [f64; 11] = [
    0.01, 0.05, 0.10, 0.20, 0.40, 0.50, 0.60, 0.80, 0.90, 0.95, 0.99,
];

/// Draws `samples` distinct seeds from `0..max`, sorted ascending.
///
/// Asking for more seeds than the range holds returns the whole range.
pub fn seed_gen<R: Rng + ?Sized>(samples: usize, max: u64, rng: &mut R) -> Vec<u64> {
    let wanted = (samples as u64).min(max) as usize;
    let mut seeds = BTreeSet::new();
    while seeds.len() < wanted {
        seeds.insert(rng.gen_range(0..max));
    }
    seeds.into_iter().collect()
}

/// One engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTask {
    /// Position in the batch, used to order results
    pub index: usize,

    pub config: SimulationConfig,

    /// Set for counterfactual runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioId>,
}

impl RunTask {
    /// File name stem unique to this run within a batch.
    ///
    /// Scenario runs are prefixed with the scenario name, which fixes the
    /// endowment; other runs carry the endowment as a suffix.
    pub fn file_stem(&self) -> String {
        let stem = format!(
            "seed{}_eta{}_lambda{}",
            self.config.seed, self.config.eta, self.config.lambda
        );
        match self.scenario {
            Some(scenario) => format!("{}_{}", scenario.name(), stem),
            None => format!("{}_endow{}", stem, self.config.initial_endowment),
        }
    }
}

/// Cartesian product of seeds, η, λ and endowments (or scenarios) over a
/// base configuration.
#[derive(Debug, Clone)]
pub struct ParameterGrid {
    base: SimulationConfig,
    seeds: Vec<u64>,
    etas: Vec<f64>,
    lambdas: Vec<f64>,
    endowments: Vec<f64>,
    scenarios: Vec<ScenarioId>,
}

impl ParameterGrid {
    /// A grid with a single point: the base configuration.
    pub fn new(base: SimulationConfig) -> Self {
        Self {
            seeds: vec![base.seed],
            etas: vec![base.eta],
            lambdas: vec![base.lambda],
            endowments: vec![base.initial_endowment],
            scenarios: Vec::new(),
            base,
        }
    }

    pub fn with_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_etas(mut self, etas: Vec<f64>) -> Self {
        self.etas = etas;
        self
    }

    pub fn with_lambdas(mut self, lambdas: Vec<f64>) -> Self {
        self.lambdas = lambdas;
        self
    }

    pub fn with_endowments(mut self, endowments: Vec<f64>) -> Self {
        self.endowments = endowments;
        self
    }

    /// Scenarios take the place of the endowment axis when non-empty.
    pub fn with_scenarios(mut self, scenarios: Vec<ScenarioId>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Number of tasks the grid expands to.
    pub fn len(&self) -> usize {
        let third_axis = if self.scenarios.is_empty() {
            self.endowments.len()
        } else {
            self.scenarios.len()
        };
        self.seeds.len() * self.etas.len() * self.lambdas.len() * third_axis
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expands the grid, η outermost and seeds innermost.
    pub fn tasks(&self) -> Vec<RunTask> {
        let third_axis: Vec<(f64, Option<ScenarioId>)> = if self.scenarios.is_empty() {
            self.endowments.iter().map(|e| (*e, None)).collect()
        } else {
            self.scenarios
                .iter()
                .map(|s| (s.initial_resource(), Some(*s)))
                .collect()
        };

        let mut tasks = Vec::with_capacity(self.len());
        for &eta in &self.etas {
            for &lambda in &self.lambdas {
                for &(endowment, scenario) in &third_axis {
                    for &seed in &self.seeds {
                        let config = self
                            .base
                            .clone()
                            .with_seed(seed)
                            .with_rates(eta, lambda)
                            .with_endowment(endowment);
                        tasks.push(RunTask {
                            index: tasks.len(),
                            config,
                            scenario,
                        });
                    }
                }
            }
        }
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_single_point_grid() {
        let grid = ParameterGrid::new(SimulationConfig::new(5));
        let tasks = grid.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].config, SimulationConfig::new(5));
        assert_eq!(tasks[0].file_stem(), "seed5_eta0.5_lambda0.5_endow100");
    }

    #[test]
    fn test_full_grid_expansion() {
        let grid = ParameterGrid::new(SimulationConfig::default())
            .with_seeds(vec![1, 2, 3])
            .with_etas(DEFAULT_RATES.to_vec())
            .with_lambdas(vec![0.1, 0.9]);
        let tasks = grid.tasks();

        assert_eq!(tasks.len(), 3 * 11 * 2);
        assert_eq!(grid.len(), tasks.len());
        assert!(tasks.iter().enumerate().all(|(i, t)| t.index == i));

        let stems: BTreeSet<String> = tasks.iter().map(RunTask::file_stem).collect();
        assert_eq!(stems.len(), tasks.len());
    }

    #[test]
    fn test_scenarios_replace_endowments() {
        let grid = ParameterGrid::new(SimulationConfig::default())
            .with_endowments(vec![1.0, 2.0, 3.0])
            .with_scenarios(vec![ScenarioId::Scarcity, ScenarioId::Barren]);
        let tasks = grid.tasks();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].config.initial_endowment, 10.0);
        assert_eq!(tasks[1].scenario, Some(ScenarioId::Barren));
        assert!(tasks[1].file_stem().starts_with("barren_"));
    }

    #[test]
    fn test_endowment_axis_gets_distinct_stems() {
        let grid = ParameterGrid::new(SimulationConfig::new(1))
            .with_seeds(vec![1, 2])
            .with_endowments(vec![10.0, 1000.0, 2.5]);
        let tasks = grid.tasks();

        let stems: BTreeSet<String> = tasks.iter().map(RunTask::file_stem).collect();
        assert_eq!(stems.len(), 6);
        assert!(stems.contains("seed1_eta0.5_lambda0.5_endow2.5"));
    }

    #[test]
    fn test_seed_gen_caps_at_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(seed_gen(10, 4, &mut rng), vec![0, 1, 2, 3]);
    }

    proptest! {
        #[test]
        fn prop_seed_gen_unique_sorted(samples in 0usize..200, master in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(master);
            let seeds = seed_gen(samples, 1_000_000, &mut rng);
            prop_assert_eq!(seeds.len(), samples);
            prop_assert!(seeds.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(seeds.iter().all(|s| *s < 1_000_000));
        }
    }
}
