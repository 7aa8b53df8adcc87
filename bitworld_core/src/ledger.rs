//! Resource accounting for a run.
//!
//! Two quantities are tracked:
//! - `resource_store`: the finite balance the run consumes. It starts at the
//!   initial endowment and only ever goes down, one `edit_cost` per
//!   committed edit.
//! - `available_resources`: the spendable budget of the current generation,
//!   produced from effectiveness. It caps how many edits may be attempted;
//!   each attempt is still paid for out of the store.

use rand::Rng;

use crate::config::{ProductionModel, SimulationConfig};
use crate::sequence::Target;

/// Tracks the store, the per-generation budget and edit charges.
#[derive(Debug, Clone)]
pub struct ResourceLedger {
    resource_store: f64,
    available_resources: f64,
    base_rate: f64,
    baseline_budget: f64,
    edit_cost: f64,
    p_tradeoff: f64,
    production: ProductionModel,
    /// Set when the store could not fund an edit this generation
    exhausted: bool,
}

impl ResourceLedger {
    /// Builds a ledger from a validated configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            resource_store: config.initial_endowment,
            available_resources: 0.0,
            base_rate: config.base_rate,
            baseline_budget: config.baseline_budget,
            edit_cost: config.edit_cost,
            p_tradeoff: config.p_tradeoff,
            production: config.production,
            exhausted: false,
        }
    }

    pub fn resource_store(&self) -> f64 {
        self.resource_store
    }

    pub fn available_resources(&self) -> f64 {
        self.available_resources
    }

    pub fn edit_cost(&self) -> f64 {
        self.edit_cost
    }

    /// Produces this generation's budget and resets the exhaustion flag.
    ///
    /// The budget never drops below `baseline_budget`, so a run with zero
    /// effectiveness can still try to change.
    pub fn produce(&mut self, effectiveness: f64, tech_len: usize, space_len: usize) -> f64 {
        let raw = match self.production {
            ProductionModel::Linear => self.base_rate * effectiveness,
            ProductionModel::NetYield => {
                space_len as f64 * effectiveness - tech_len as f64 * (1.0 - effectiveness)
            }
        };
        self.available_resources = raw.max(0.0).max(self.baseline_budget);
        self.exhausted = !self.can_afford(self.edit_cost);
        self.available_resources
    }

    /// Number of edits the current budget pays for.
    pub fn edit_slots(&self) -> u64 {
        let slots = (self.available_resources / self.edit_cost).floor();
        if slots.is_finite() && slots > 0.0 {
            slots as u64
        } else {
            0
        }
    }

    /// Routes each edit slot to T with probability `p_tradeoff`, else to S.
    pub fn allocate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Target> {
        (0..self.edit_slots())
            .map(|_| {
                if rng.gen_bool(self.p_tradeoff) {
                    Target::Tech
                } else {
                    Target::Space
                }
            })
            .collect()
    }

    /// True if the store covers `cost`.
    pub fn can_afford(&self, cost: f64) -> bool {
        self.resource_store - cost >= 0.0
    }

    /// Debits `cost` from the store.
    ///
    /// Fails without touching the store when the balance would go negative,
    /// and marks the generation as exhausted.
    pub fn charge(&mut self, cost: f64) -> bool {
        if !self.can_afford(cost) {
            self.exhausted = true;
            return false;
        }
        self.resource_store -= cost;
        true
    }

    /// Charges one edit.
    pub fn charge_edit(&mut self) -> bool {
        self.charge(self.edit_cost)
    }

    /// Whether the store failed to fund an edit this generation.
    pub fn exhausted(&self) -> bool {
        self.exhausted
    }
}
