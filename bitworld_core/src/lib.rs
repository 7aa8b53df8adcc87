//! bitworld core - co-evolution of technological systems and search spaces
//!
//! A technological system T and a search space S are binary sequences that
//! change one generation at a time:
//! 1. **Effectiveness**: how well T fits S, `1 − lev(T, S) / max(|T|, |S|)`
//! 2. **Resources**: effectiveness produces a per-generation budget, every
//!    edit is paid for out of a finite store
//! 3. **Mutation**: edits are deterministic (toward the other sequence) with
//!    probability η for T and λ for S, random otherwise
//!
//! A run is a pure function of its [`SimulationConfig`]: the only entropy is
//! a ChaCha8 stream seeded from `config.seed`, so the same configuration
//! always yields the same records.
//!
//! # Usage
//!
//! ```
//! use bitworld_core::{SimulationConfig, SimulationRunner, SimulationStatus};
//!
//! let config = SimulationConfig::new(42)
//!     .with_rates(0.9, 0.1)
//!     .with_generations(100);
//!
//! let outcome = SimulationRunner::new(config).unwrap().run();
//! assert!(outcome.status != SimulationStatus::Running);
//! ```

pub mod complexity;
pub mod config;
pub mod effectiveness;
pub mod error;
pub mod ledger;
pub mod mutation;
pub mod record;
pub mod runner;
pub mod sequence;

pub use complexity::{Complexity, ComplexityTracker};
pub use config::{DeterministicRule, ExhaustionPolicy, ProductionModel, SimulationConfig};
pub use effectiveness::{levenshtein, EffectivenessEvaluator};
pub use error::{ConfigError, ParseSequenceError};
pub use ledger::ResourceLedger;
pub use mutation::{closing_edit, random_edit, EditMode, MutationEngine, MutationOutcome};
pub use record::{GenerationRecord, GenerationReport, RunOutcome, SimulationStatus};
pub use runner::{simulate, SimulationRunner, SimulationState};
pub use sequence::{BitSequence, Edit, SequenceStore, Target};
