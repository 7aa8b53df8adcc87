//! Per-generation output of a run.

use serde::{Deserialize, Serialize};

/// Snapshot of one generation after its edits were applied.
///
/// Field order is the persisted column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub seed: u64,
    pub eta: f64,
    pub lambda: f64,
    pub generation: u64,
    pub tech_complexity: usize,
    pub space_complexity: usize,
    pub effectiveness: f64,
    pub available_resources: f64,
    pub resource_store: f64,
}

impl GenerationRecord {
    /// Column names in persisted order.
    pub const COLUMNS: [&'static str; 9] = [
        "seed",
        "eta",
        "lambda",
        "generation",
        "tech_complexity",
        "space_complexity",
        "effectiveness",
        "available_resources",
        "resource_store",
    ];
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Running,

    /// The generation cap was reached
    TerminatedGenerationLimit,

    /// Tech complexity reached the configured limit
    TerminatedComplexityLimit,

    /// The store ran dry under [`crate::ExhaustionPolicy::Halt`]
    TerminatedResourceExhausted,

    /// Aborted from outside between two generations
    Cancelled,
}

impl SimulationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SimulationStatus::Running)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SimulationStatus::Running => "running",
            SimulationStatus::TerminatedGenerationLimit => "generation_limit",
            SimulationStatus::TerminatedComplexityLimit => "complexity_limit",
            SimulationStatus::TerminatedResourceExhausted => "resource_exhausted",
            SimulationStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Edit bookkeeping for one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Slots granted by the budget
    pub slots: u64,

    /// Edits paid for and applied
    pub committed: u64,

    /// Slots where no edit was proposed
    pub skipped: u64,

    /// Set when the store could not fund an edit
    pub budget_exhausted: bool,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub seed: u64,

    /// Terminal status
    pub status: SimulationStatus,

    /// One record per emitted generation, in order
    pub records: Vec<GenerationRecord>,
}

impl RunOutcome {
    /// Generation of the last emitted record, 0 if none was emitted.
    pub fn final_generation(&self) -> u64 {
        self.records.last().map_or(0, |r| r.generation)
    }

    pub fn final_record(&self) -> Option<&GenerationRecord> {
        self.records.last()
    }
}
