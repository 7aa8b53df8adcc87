//! Run configuration.
//!
//! A [`SimulationConfig`] is built once per run, validated before the first
//! generation and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a generation's spendable budget is produced from effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionModel {
    /// `base_rate × effectiveness`
    #[default]
    Linear,

    /// `|S| × e − |T| × (1 − e)`: gains from the search space minus losses
    /// from an ineffective technological system.
    NetYield,
}

/// What the runner does when the store can no longer fund an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Keep stepping with edits suppressed until another limit is hit.
    #[default]
    Continue,

    /// Stop before emitting the exhausted generation.
    Halt,
}

/// Edit selection used when the deterministic branch fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeterministicRule {
    /// Best single edit toward the other sequence.
    #[default]
    Greedy,

    /// Random edit, kept only if it strictly improves effectiveness.
    Hillclimb,
}

/// Configuration for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the run's random stream
    pub seed: u64,

    /// Initial length of the technological system
    pub t_length: usize,

    /// Probability of a 1 in the initial technological system (0.5 if unset)
    pub t_prob: Option<f64>,

    /// Initial length of the search space
    pub s_length: usize,

    /// Probability of a 1 in the initial search space (0.5 if unset)
    pub s_prob: Option<f64>,

    /// Chance that an edit to T is deterministic
    pub eta: f64,

    /// Chance that an edit to S is deterministic
    pub lambda: f64,

    /// Starting balance of the resource store
    pub initial_endowment: f64,

    /// Chance that an edit slot is spent on T rather than S
    pub p_tradeoff: f64,

    /// Generation cap (inclusive)
    pub generations: u64,

    /// Tech complexity at which the run ends
    pub limit: usize,

    /// Production per unit of effectiveness under [`ProductionModel::Linear`]
    pub base_rate: f64,

    /// Floor on the spendable budget of every generation
    pub baseline_budget: f64,

    /// Cost of any single flip, insertion or deletion
    pub edit_cost: f64,

    pub production: ProductionModel,

    pub deterministic_rule: DeterministicRule,

    pub exhaustion: ExhaustionPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            t_length: 2,
            t_prob: None,
            s_length: 2,
            s_prob: None,
            eta: 0.5,
            lambda: 0.5,
            initial_endowment: 100.0,
            p_tradeoff: 0.5,
            generations: 10_000,
            limit: 10_000,
            base_rate: 10.0,
            baseline_budget: 1.0,
            edit_cost: 1.0,
            production: ProductionModel::Linear,
            deterministic_rule: DeterministicRule::Greedy,
            exhaustion: ExhaustionPolicy::Continue,
        }
    }
}

impl SimulationConfig {
    /// Creates the default configuration with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets η and λ.
    pub fn with_rates(mut self, eta: f64, lambda: f64) -> Self {
        self.eta = eta;
        self.lambda = lambda;
        self
    }

    /// Sets the initial technological system shape.
    pub fn with_tech(mut self, length: usize, prob: Option<f64>) -> Self {
        self.t_length = length;
        self.t_prob = prob;
        self
    }

    /// Sets the initial search space shape.
    pub fn with_space(mut self, length: usize, prob: Option<f64>) -> Self {
        self.s_length = length;
        self.s_prob = prob;
        self
    }

    /// Sets the initial endowment.
    pub fn with_endowment(mut self, endowment: f64) -> Self {
        self.initial_endowment = endowment;
        self
    }

    /// Sets the tradeoff between editing T and S.
    pub fn with_tradeoff(mut self, p_tradeoff: f64) -> Self {
        self.p_tradeoff = p_tradeoff;
        self
    }

    /// Sets the generation cap.
    pub fn with_generations(mut self, generations: u64) -> Self {
        self.generations = generations;
        self
    }

    /// Sets the complexity limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets production, baseline and edit cost in one go.
    pub fn with_ledger(mut self, base_rate: f64, baseline_budget: f64, edit_cost: f64) -> Self {
        self.base_rate = base_rate;
        self.baseline_budget = baseline_budget;
        self.edit_cost = edit_cost;
        self
    }

    pub fn with_production(mut self, production: ProductionModel) -> Self {
        self.production = production;
        self
    }

    pub fn with_deterministic_rule(mut self, rule: DeterministicRule) -> Self {
        self.deterministic_rule = rule;
        self
    }

    pub fn with_exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion = policy;
        self
    }

    /// Checks every invariant, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("eta", self.eta)?;
        check_unit("lambda", self.lambda)?;
        check_unit("p_tradeoff", self.p_tradeoff)?;
        if let Some(p) = self.t_prob {
            check_unit("t_prob", p)?;
        }
        if let Some(p) = self.s_prob {
            check_unit("s_prob", p)?;
        }

        if self.t_length == 0 {
            return Err(ConfigError::ZeroLength { field: "t_length" });
        }
        if self.s_length == 0 {
            return Err(ConfigError::ZeroLength { field: "s_length" });
        }
        if self.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        if self.limit == 0 {
            return Err(ConfigError::NonPositiveLimit);
        }

        check_amount("initial_endowment", self.initial_endowment)?;
        check_amount("base_rate", self.base_rate)?;
        check_amount("baseline_budget", self.baseline_budget)?;
        if !self.edit_cost.is_finite() || self.edit_cost <= 0.0 {
            return Err(ConfigError::NonPositiveCost(self.edit_cost));
        }

        Ok(())
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    // NaN fails `contains`
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(field, value))
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid_amount(field, value))
    }
}
