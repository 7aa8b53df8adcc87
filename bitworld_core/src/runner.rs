//! Simulation runner - drives one run from configuration to terminal state.
//!
//! Each generation:
//! 1. Take the effectiveness and complexity of the current sequences
//! 2. Produce a budget and split it into edit slots by tradeoff
//! 3. Spend the slots on edits, each paid for out of the store
//! 4. Re-evaluate and emit a record of the post-edit state
//! 5. Stop on the complexity limit or the generation cap, else advance

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::complexity::{Complexity, ComplexityTracker};
use crate::config::{ExhaustionPolicy, SimulationConfig};
use crate::effectiveness::EffectivenessEvaluator;
use crate::error::ConfigError;
use crate::ledger::ResourceLedger;
use crate::mutation::{MutationEngine, MutationOutcome};
use crate::record::{GenerationRecord, GenerationReport, RunOutcome, SimulationStatus};
use crate::sequence::SequenceStore;

/// Mutable state of a run. Owned by exactly one runner.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Generation about to run (or the last one, once terminal)
    generation: u64,
    sequences: SequenceStore,
    ledger: ResourceLedger,
    effectiveness: f64,
    complexity: Complexity,
    rng: ChaCha8Rng,
}

impl SimulationState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sequences(&self) -> &SequenceStore {
        &self.sequences
    }

    pub fn effectiveness(&self) -> f64 {
        self.effectiveness
    }

    pub fn complexity(&self) -> Complexity {
        self.complexity
    }

    pub fn available_resources(&self) -> f64 {
        self.ledger.available_resources()
    }

    pub fn resource_store(&self) -> f64 {
        self.ledger.resource_store()
    }
}

/// Runs one simulation.
///
/// Also an iterator over the emitted records, so a collector can consume
/// generations as they are produced.
pub struct SimulationRunner {
    config: SimulationConfig,
    state: SimulationState,
    evaluator: EffectivenessEvaluator,
    tracker: ComplexityTracker,
    engine: MutationEngine,
    status: SimulationStatus,
    last_report: GenerationReport,
    /// First generation of the current stall, for logging
    stalled_since: Option<u64>,
}

impl SimulationRunner {
    /// Validates `config` and draws the initial sequences.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let sequences = SequenceStore::initialize(
            config.t_length,
            config.t_prob,
            config.s_length,
            config.s_prob,
            &mut rng,
        );
        Ok(Self::with_sequences(config, sequences, rng))
    }

    /// Starts from given sequences instead of drawing them.
    pub fn from_sequences(
        config: SimulationConfig,
        sequences: SequenceStore,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self::with_sequences(config, sequences, rng))
    }

    fn with_sequences(config: SimulationConfig, sequences: SequenceStore, rng: ChaCha8Rng) -> Self {
        let mut evaluator = EffectivenessEvaluator::new();
        let mut tracker = ComplexityTracker::new(config.limit);
        let effectiveness =
            evaluator.evaluate(sequences.tech().as_slice(), sequences.space().as_slice());
        let complexity = tracker.update(sequences.tech(), sequences.space());

        let state = SimulationState {
            generation: 1,
            ledger: ResourceLedger::from_config(&config),
            sequences,
            effectiveness,
            complexity,
            rng,
        };

        Self {
            engine: MutationEngine::from_config(&config),
            config,
            state,
            evaluator,
            tracker,
            status: SimulationStatus::Running,
            last_report: GenerationReport::default(),
            stalled_since: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    /// Edit bookkeeping of the most recent generation.
    pub fn last_report(&self) -> GenerationReport {
        self.last_report
    }

    /// Runs one generation.
    ///
    /// Returns the generation's record, or `None` once the run is terminal.
    /// Under [`ExhaustionPolicy::Halt`] a generation whose store cannot pay
    /// for one edit is not run and not emitted.
    pub fn step(&mut self) -> Option<GenerationRecord> {
        if self.status.is_terminal() {
            return None;
        }
        let generation = self.state.generation;
        let state = &mut self.state;

        state.ledger.produce(
            state.effectiveness,
            state.complexity.tech,
            state.complexity.space,
        );

        // The store cannot fund a single edit: absorbing barrier under Halt.
        // Nothing has been edited or charged yet, so the last record still
        // describes the state.
        if state.ledger.exhausted() && self.config.exhaustion == ExhaustionPolicy::Halt {
            warn!(
                "seed {} depleted resource store at generation {} (tech={}, space={})",
                self.config.seed, generation, state.complexity.tech, state.complexity.space
            );
            self.last_report = GenerationReport {
                slots: state.ledger.edit_slots(),
                budget_exhausted: true,
                ..Default::default()
            };
            self.status = SimulationStatus::TerminatedResourceExhausted;
            return None;
        }

        let slots = state.ledger.allocate(&mut state.rng);
        let mut report = GenerationReport {
            slots: slots.len() as u64,
            ..Default::default()
        };
        for target in slots {
            match self.engine.mutate(
                target,
                &mut state.sequences,
                &mut state.ledger,
                &mut state.rng,
            ) {
                MutationOutcome::Committed { .. } => report.committed += 1,
                MutationOutcome::NoEdit => report.skipped += 1,
                // the store never refills, later slots would fail too
                MutationOutcome::Unaffordable => break,
            }
        }
        report.budget_exhausted = state.ledger.exhausted();
        self.last_report = report;

        // A store that ran dry mid-generation still emits this generation;
        // Halt stops at the next one.
        if report.budget_exhausted
            && self.config.exhaustion == ExhaustionPolicy::Continue
            && self.stalled_since.is_none()
        {
            warn!(
                "seed {} out of resources at generation {}, edits suppressed",
                self.config.seed, generation
            );
            self.stalled_since = Some(generation);
        }

        let (tech, space) = (state.sequences.tech(), state.sequences.space());
        state.effectiveness = self.evaluator.evaluate(tech.as_slice(), space.as_slice());
        state.complexity = self.tracker.update(tech, space);

        let record = GenerationRecord {
            seed: self.config.seed,
            eta: self.config.eta,
            lambda: self.config.lambda,
            generation,
            tech_complexity: state.complexity.tech,
            space_complexity: state.complexity.space,
            effectiveness: state.effectiveness,
            available_resources: state.ledger.available_resources(),
            resource_store: state.ledger.resource_store(),
        };

        debug!(
            "seed {} | gen {} | tech {} | space {} | resources {:.2} | store {:.2} | effectiveness {:.3}",
            record.seed,
            record.generation,
            record.tech_complexity,
            record.space_complexity,
            record.available_resources,
            record.resource_store,
            record.effectiveness
        );

        if self.tracker.limit_reached() {
            info!("seed {} reached complexity limit at generation {}", self.config.seed, generation);
            self.status = SimulationStatus::TerminatedComplexityLimit;
        } else if generation >= self.config.generations {
            self.status = SimulationStatus::TerminatedGenerationLimit;
        } else {
            state.generation += 1;
        }

        Some(record)
    }

    /// Runs to a terminal state.
    pub fn run(self) -> RunOutcome {
        self.run_until_cancelled(&AtomicBool::new(false))
    }

    /// Runs to a terminal state, checking `cancel` between generations.
    ///
    /// A cancelled run keeps every record emitted before the flag was seen.
    pub fn run_until_cancelled(mut self, cancel: &AtomicBool) -> RunOutcome {
        info!(
            "Starting run: seed={} eta={} lambda={} endowment={}",
            self.config.seed, self.config.eta, self.config.lambda, self.config.initial_endowment
        );

        let mut records = Vec::new();
        while !self.status.is_terminal() {
            if cancel.load(Ordering::Relaxed) {
                self.status = SimulationStatus::Cancelled;
                break;
            }
            if let Some(record) = self.step() {
                records.push(record);
            }
        }

        info!(
            "Run {} complete: {} after {} generations",
            self.config.seed,
            self.status,
            records.len()
        );

        RunOutcome {
            seed: self.config.seed,
            status: self.status,
            records,
        }
    }
}

impl Iterator for SimulationRunner {
    type Item = GenerationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.status.is_terminal() {
            if let Some(record) = self.step() {
                return Some(record);
            }
        }
        None
    }
}

/// Validates `config` and runs it to completion.
pub fn simulate(config: SimulationConfig) -> Result<RunOutcome, ConfigError> {
    Ok(SimulationRunner::new(config)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeterministicRule, ProductionModel};
    use crate::sequence::BitSequence;

    fn store(tech: &str, space: &str) -> SequenceStore {
        SequenceStore::from_sequences(tech.parse().unwrap(), space.parse().unwrap())
    }

    fn short_config(seed: u64) -> SimulationConfig {
        SimulationConfig::new(seed)
            .with_tech(4, None)
            .with_space(6, None)
            .with_generations(200)
            .with_limit(1_000)
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let a = simulate(short_config(42)).unwrap();
        let b = simulate(short_config(42)).unwrap();
        assert_eq!(a, b);
        assert!(!a.records.is_empty());
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = simulate(short_config(1)).unwrap();
        let b = simulate(short_config(2)).unwrap();
        assert_ne!(a.records, b.records);
    }

    #[test]
    fn test_record_bounds_and_generation_order() {
        for rule in [DeterministicRule::Greedy, DeterministicRule::Hillclimb] {
            for production in [ProductionModel::Linear, ProductionModel::NetYield] {
                let outcome = simulate(
                    short_config(7)
                        .with_deterministic_rule(rule)
                        .with_production(production)
                        .with_endowment(50.0),
                )
                .unwrap();

                for (i, record) in outcome.records.iter().enumerate() {
                    assert_eq!(record.generation, i as u64 + 1);
                    assert!((0.0..=1.0).contains(&record.effectiveness));
                    assert!(record.resource_store >= 0.0);
                    assert!(record.tech_complexity >= 1);
                    assert!(record.space_complexity >= 1);
                    assert!(record.generation <= 200);
                }
            }
        }
    }

    #[test]
    fn test_complexity_limit_terminates() {
        // T = "0" chases an all-zero S of length 30: every greedy edit is an insertion
        let config = SimulationConfig::new(3)
            .with_rates(1.0, 1.0)
            .with_tradeoff(1.0)
            .with_endowment(1_000.0)
            .with_limit(10)
            .with_generations(1_000);
        let sequences = store("0", &"0".repeat(30));
        let outcome = SimulationRunner::from_sequences(config, sequences).unwrap().run();

        assert_eq!(outcome.status, SimulationStatus::TerminatedComplexityLimit);
        let (last, earlier) = outcome.records.split_last().unwrap();
        assert!(last.tech_complexity >= 10);
        assert!(earlier.iter().all(|r| r.tech_complexity < 10));

        let lengths: Vec<usize> = outcome.records.iter().map(|r| r.tech_complexity).collect();
        assert!(lengths.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_generation_cap_terminates() {
        let config = SimulationConfig::new(5).with_generations(5).with_limit(1_000_000);
        let outcome = simulate(config).unwrap();
        assert_eq!(outcome.status, SimulationStatus::TerminatedGenerationLimit);
        assert_eq!(outcome.records.len(), 5);
        assert_eq!(outcome.final_generation(), 5);
    }

    #[test]
    fn test_zero_endowment_never_mutates() {
        let config = SimulationConfig::new(9)
            .with_tech(6, None)
            .with_space(6, None)
            .with_endowment(0.0)
            .with_generations(50);
        let mut runner = SimulationRunner::new(config).unwrap();
        let initial = runner.state().sequences().clone();

        let mut count = 0;
        while let Some(record) = runner.step() {
            assert_eq!(record.resource_store, 0.0);
            assert_eq!(runner.last_report().committed, 0);
            assert!(runner.last_report().budget_exhausted);
            count += 1;
        }

        assert_eq!(count, 50);
        assert_eq!(runner.state().sequences(), &initial);
        assert_eq!(runner.status(), SimulationStatus::TerminatedGenerationLimit);
    }

    #[test]
    fn test_halt_policy_stops_before_exhausted_generation() {
        let config = SimulationConfig::new(4)
            .with_endowment(3.0)
            .with_generations(100)
            .with_exhaustion(ExhaustionPolicy::Halt);
        let mut runner = SimulationRunner::new(config.clone()).unwrap();
        let mut records = Vec::new();
        while let Some(record) = runner.step() {
            records.push(record);
        }

        assert_eq!(runner.status(), SimulationStatus::TerminatedResourceExhausted);
        assert!(records.iter().enumerate().all(|(i, r)| r.generation == i as u64 + 1));

        // every unit of the endowment paid for an edit that was recorded
        let last = records.last().unwrap();
        assert_eq!(last.resource_store, 0.0);

        // halted on the generation right after the last record, before editing
        assert_eq!(runner.state().generation(), last.generation + 1);
        assert!(runner.last_report().budget_exhausted);
        assert_eq!(runner.last_report().committed, 0);

        let state = runner.state();
        assert_eq!(state.resource_store(), last.resource_store);
        assert_eq!(state.effectiveness(), last.effectiveness);
        assert_eq!(state.sequences().tech().len(), last.tech_complexity);
        assert_eq!(state.sequences().space().len(), last.space_complexity);

        assert_eq!(simulate(config).unwrap().records, records);
    }

    #[test]
    fn test_halt_emits_generation_that_ran_dry_midway() {
        // 10 slots a generation against a store of 3: the store runs dry
        // part way through a generation that still committed edits
        let config = SimulationConfig::new(4)
            .with_rates(1.0, 1.0)
            .with_tradeoff(1.0)
            .with_ledger(10.0, 10.0, 1.0)
            .with_endowment(3.0)
            .with_exhaustion(ExhaustionPolicy::Halt);
        let sequences = store("0", &"0".repeat(20));
        let mut runner = SimulationRunner::from_sequences(config, sequences).unwrap();

        let first = runner.step().unwrap();
        assert_eq!(runner.last_report().committed, 3);
        assert!(runner.last_report().budget_exhausted);
        assert_eq!(first.resource_store, 0.0);
        assert_eq!(first.tech_complexity, 4);
        assert_eq!(runner.status(), SimulationStatus::Running);

        assert_eq!(runner.step(), None);
        assert_eq!(runner.status(), SimulationStatus::TerminatedResourceExhausted);
        assert_eq!(runner.state().sequences().tech().len(), first.tech_complexity);
    }

    #[test]
    fn test_halt_with_zero_endowment_emits_nothing() {
        let config = SimulationConfig::new(4)
            .with_endowment(0.0)
            .with_exhaustion(ExhaustionPolicy::Halt);
        let outcome = simulate(config).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.final_generation(), 0);
    }

    #[test]
    fn test_extremes_produce_different_trajectories() {
        let base = SimulationConfig::new(21)
            .with_tech(8, None)
            .with_space(8, None)
            .with_generations(100);
        let drift = simulate(base.clone().with_rates(0.0, 0.0)).unwrap();
        let converge = simulate(base.with_rates(1.0, 1.0)).unwrap();
        assert_ne!(drift.records, converge.records);
    }

    #[test]
    fn test_pure_convergence_reaches_full_effectiveness() {
        let config = SimulationConfig::new(2)
            .with_rates(1.0, 1.0)
            .with_tech(6, None)
            .with_space(9, None)
            .with_generations(50);
        let outcome = simulate(config).unwrap();
        let last = outcome.final_record().unwrap();
        assert_eq!(last.effectiveness, 1.0);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = SimulationConfig::new(1).with_rates(2.0, 0.5);
        assert!(matches!(
            SimulationRunner::new(config),
            Err(ConfigError::OutOfRange { field: "eta", .. })
        ));
    }

    #[test]
    fn test_cancelled_run_keeps_no_partial_records() {
        let cancel = AtomicBool::new(true);
        let outcome = SimulationRunner::new(short_config(1))
            .unwrap()
            .run_until_cancelled(&cancel);
        assert_eq!(outcome.status, SimulationStatus::Cancelled);
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_iterator_matches_run() {
        let streamed: Vec<GenerationRecord> =
            SimulationRunner::new(short_config(11)).unwrap().collect();
        let batch = simulate(short_config(11)).unwrap();
        assert_eq!(streamed, batch.records);
    }

    #[test]
    fn test_store_only_decreases() {
        let outcome = simulate(short_config(13)).unwrap();
        let stores: Vec<f64> = outcome.records.iter().map(|r| r.resource_store).collect();
        assert!(stores.windows(2).all(|w| w[1] <= w[0]));
        assert!(stores[0] <= 100.0);
    }

    #[test]
    fn test_pure_drift_on_single_bits() {
        let config = SimulationConfig::new(6).with_rates(0.0, 0.0).with_generations(40);
        let outcome = SimulationRunner::from_sequences(config, store("1", "0"))
            .unwrap()
            .run();
        assert_eq!(outcome.records.len(), 40);
        assert!(outcome
            .records
            .iter()
            .all(|r| r.tech_complexity >= 1 && r.space_complexity >= 1));
    }

    #[test]
    fn test_from_sequences_keeps_given_sequences() {
        let sequences = store("0101", "0101");
        let runner =
            SimulationRunner::from_sequences(SimulationConfig::new(1), sequences).unwrap();
        assert_eq!(runner.state().effectiveness(), 1.0);
        let tech: &BitSequence = runner.state().sequences().tech();
        assert_eq!(tech.to_string(), "0101");
    }
}
