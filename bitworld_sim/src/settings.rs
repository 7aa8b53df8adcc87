//! TOML batch settings.
//!
//! ```toml
//! output_dir = "runs"
//! workers = 8
//! samples = 1000
//! master_seed = 7
//! etas = [0.1, 0.5, 0.9]
//! lambdas = [0.1, 0.5, 0.9]
//! scenarios = ["baseline", "scarcity"]
//!
//! [base]
//! generations = 10000
//! limit = 10000
//! t_length = 2
//! s_length = 2
//! ```

use bitworld_core::SimulationConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::DriverError;
use crate::grid::{seed_gen, ParameterGrid, DEFAULT_RATES};
use crate::pool::PoolConfig;
use crate::scenarios::ScenarioId;

/// Upper bound (exclusive) for generated seeds.
pub const SEED_RANGE: u64 = 1_000_000;

/// Settings for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Directory receiving one CSV per run
    pub output_dir: PathBuf,

    /// Worker threads (0 = one per core)
    pub workers: usize,

    /// Seeds drawn per (η, λ, endowment) cell when `seeds` is empty
    pub samples: usize,

    /// Seed for drawing run seeds
    pub master_seed: u64,

    /// Explicit run seeds; overrides `samples`
    pub seeds: Vec<u64>,

    pub etas: Vec<f64>,

    pub lambdas: Vec<f64>,

    /// Initial endowments to sweep (empty = the base endowment)
    pub endowments: Vec<f64>,

    /// Counterfactual scenarios; replace `endowments` when non-empty
    pub scenarios: Vec<ScenarioId>,

    /// Everything else about a run
    pub base: SimulationConfig,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("runs"),
            workers: 0,
            samples: 10,
            master_seed: 42,
            seeds: Vec::new(),
            etas: DEFAULT_RATES.to_vec(),
            lambdas: DEFAULT_RATES.to_vec(),
            endowments: Vec::new(),
            scenarios: Vec::new(),
            base: SimulationConfig::default(),
        }
    }
}

impl BatchSettings {
    /// Parses settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, DriverError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Run seeds: the explicit list, or `samples` seeds drawn from
    /// `master_seed`.
    pub fn run_seeds(&self) -> Vec<u64> {
        if !self.seeds.is_empty() {
            return self.seeds.clone();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.master_seed);
        seed_gen(self.samples, SEED_RANGE, &mut rng)
    }

    /// Builds the parameter grid.
    pub fn grid(&self) -> ParameterGrid {
        let endowments = if self.endowments.is_empty() {
            vec![self.base.initial_endowment]
        } else {
            self.endowments.clone()
        };
        ParameterGrid::new(self.base.clone())
            .with_seeds(self.run_seeds())
            .with_etas(self.etas.clone())
            .with_lambdas(self.lambdas.clone())
            .with_endowments(endowments)
            .with_scenarios(self.scenarios.clone())
    }

    /// Pool configuration for this batch.
    pub fn pool_config(&self) -> PoolConfig {
        let default = PoolConfig::default();
        PoolConfig {
            workers: if self.workers == 0 { default.workers } else { self.workers },
            ..default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitworld_core::ExhaustionPolicy;

    #[test]
    fn test_parse_full_settings() {
        let text = r#"
            output_dir = "out"
            workers = 4
            seeds = [3, 1, 2]
            etas = [0.1, 0.9]
            lambdas = [0.5]
            scenarios = ["baseline", "barren"]

            [base]
            generations = 500
            limit = 200
            exhaustion = "halt"
        "#;
        let settings = BatchSettings::from_toml_str(text).unwrap();

        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.pool_config().workers, 4);
        assert_eq!(settings.run_seeds(), vec![3, 1, 2]);
        assert_eq!(settings.base.generations, 500);
        assert_eq!(settings.base.exhaustion, ExhaustionPolicy::Halt);
        // untouched base fields keep their defaults
        assert_eq!(settings.base.t_length, 2);

        let tasks = settings.grid().tasks();
        assert_eq!(tasks.len(), 3 * 2 * 1 * 2);
        assert!(tasks.iter().all(|t| t.config.generations == 500));
    }

    #[test]
    fn test_defaults_draw_seeds() {
        let settings = BatchSettings::from_toml_str("samples = 5").unwrap();
        let seeds = settings.run_seeds();
        assert_eq!(seeds.len(), 5);
        assert_eq!(seeds, settings.run_seeds());
        assert_eq!(settings.grid().len(), 5 * 11 * 11);
    }

    #[test]
    fn test_bad_toml_is_settings_error() {
        assert!(matches!(
            BatchSettings::from_toml_str("workers = \"many\""),
            Err(DriverError::Settings(_))
        ));
        assert!(matches!(
            BatchSettings::from_toml_str("scenarios = [\"doomsday\"]"),
            Err(DriverError::Settings(_))
        ));
    }
}
