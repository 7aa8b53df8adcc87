//! Edit selection for the technological system and the search space.
//!
//! Every edit slot draws `r ~ U[0, 1)`. When `r` is below the target's
//! rate (η for T, λ for S) the edit is deterministic and moves the target
//! toward the other sequence; otherwise it is a blind random change.
//! η = 1 is pure convergence pressure, η = 0 pure drift.

use rand::Rng;
use tracing::trace;

use crate::config::{DeterministicRule, SimulationConfig};
use crate::effectiveness::{advance_row, strip_common_affixes, EffectivenessEvaluator};
use crate::ledger::ResourceLedger;
use crate::sequence::{BitSequence, Edit, SequenceStore, Target};

/// Which branch produced an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Deterministic,
    Stochastic,
}

/// Result of spending one edit slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The edit was paid for and applied
    Committed { edit: Edit, mode: EditMode },

    /// Nothing worth doing (already converged, rejected, or a deletion on a
    /// single symbol); no charge was made
    NoEdit,

    /// An edit was selected but the store could not pay for it
    Unaffordable,
}

/// Returns an edit of `target` that lowers `lev(target, other)` by one.
///
/// A single edit moves Levenshtein distance by at most one, so any step of
/// an optimal alignment is a best edit. After stripping the common prefix
/// and suffix the last cell of the table must be reached by an edit, and
/// the final two rows tell which one. Ties go to flip, then insertion,
/// then deletion. Returns `None` when the sequences are already equal.
pub fn closing_edit(target: &[u8], other: &[u8]) -> Option<Edit> {
    let (prefix, t, s) = strip_common_affixes(target, other);
    let (n, m) = (t.len(), s.len());

    if n == 0 && m == 0 {
        return None;
    }
    if n == 0 {
        return Some(Edit::Insert { position: prefix, bit: s[m - 1] });
    }
    let last_position = prefix + n - 1;
    if m == 0 {
        return (target.len() > 1).then_some(Edit::Delete(last_position));
    }

    let mut row: Vec<usize> = (0..=m).collect();
    for (i, &x) in t[..n - 1].iter().enumerate() {
        advance_row(&mut row, i, x, s);
    }
    let prev = row.clone();
    advance_row(&mut row, n - 1, t[n - 1], s);

    let distance = row[m];
    if prev[m - 1] + 1 == distance {
        // t[n-1] != s[m-1], and bits only have one complement
        Some(Edit::Flip(last_position))
    } else if row[m - 1] + 1 == distance {
        Some(Edit::Insert { position: prefix + n, bit: s[m - 1] })
    } else if prev[m] + 1 == distance && target.len() > 1 {
        Some(Edit::Delete(last_position))
    } else {
        None
    }
}

/// A uniformly random flip, insertion or deletion at a uniform position.
pub fn random_edit<R: Rng + ?Sized>(sequence: &BitSequence, rng: &mut R) -> Option<Edit> {
    let len = sequence.len();
    match rng.gen_range(0..3) {
        0 => Some(Edit::Flip(rng.gen_range(0..len))),
        1 => {
            let position = rng.gen_range(0..=len);
            let bit = u8::from(rng.gen_bool(0.5));
            Some(Edit::Insert { position, bit })
        }
        _ => (len > 1).then(|| Edit::Delete(rng.gen_range(0..len))),
    }
}

/// Decides and applies edits for one run.
#[derive(Debug, Clone)]
pub struct MutationEngine {
    eta: f64,
    lambda: f64,
    rule: DeterministicRule,
    evaluator: EffectivenessEvaluator,
}

impl MutationEngine {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            eta: config.eta,
            lambda: config.lambda,
            rule: config.deterministic_rule,
            evaluator: EffectivenessEvaluator::new(),
        }
    }

    /// Chance that an edit to `target` is deterministic.
    pub fn rate(&self, target: Target) -> f64 {
        match target {
            Target::Tech => self.eta,
            Target::Space => self.lambda,
        }
    }

    /// Picks an edit for `target` without applying it.
    pub fn propose<R: Rng + ?Sized>(
        &mut self,
        target: Target,
        store: &SequenceStore,
        rng: &mut R,
    ) -> Option<(Edit, EditMode)> {
        let r: f64 = rng.gen();
        let (sequence, other) = store.pair(target);

        if r < self.rate(target) {
            let edit = match self.rule {
                DeterministicRule::Greedy => closing_edit(sequence.as_slice(), other.as_slice()),
                DeterministicRule::Hillclimb => self.hillclimb(sequence, other, rng),
            };
            edit.map(|e| (e, EditMode::Deterministic))
        } else {
            random_edit(sequence, rng).map(|e| (e, EditMode::Stochastic))
        }
    }

    /// Spends one edit slot on `target`, charging the ledger before the
    /// edit is applied.
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        target: Target,
        store: &mut SequenceStore,
        ledger: &mut ResourceLedger,
        rng: &mut R,
    ) -> MutationOutcome {
        let Some((edit, mode)) = self.propose(target, store, rng) else {
            return MutationOutcome::NoEdit;
        };
        if !ledger.charge_edit() {
            return MutationOutcome::Unaffordable;
        }

        let applied = store.apply_edit(target, edit);
        debug_assert!(applied, "proposed edits are always in range");
        trace!(target = target.name(), ?edit, ?mode, "edit committed");
        MutationOutcome::Committed { edit, mode }
    }

    /// Random edit kept only if it strictly improves effectiveness.
    fn hillclimb<R: Rng + ?Sized>(
        &mut self,
        sequence: &BitSequence,
        other: &BitSequence,
        rng: &mut R,
    ) -> Option<Edit> {
        let edit = random_edit(sequence, rng)?;
        let mut candidate = sequence.clone();
        candidate.apply(edit);

        let before = self.evaluator.evaluate(sequence.as_slice(), other.as_slice());
        let after = self.evaluator.evaluate(candidate.as_slice(), other.as_slice());
        (after > before).then_some(edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effectiveness::levenshtein;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn seq(s: &str) -> BitSequence {
        s.parse().unwrap()
    }

    fn apply(s: &str, edit: Edit) -> BitSequence {
        let mut out = seq(s);
        assert!(out.apply(edit));
        out
    }

    #[test]
    fn test_closing_edit_grows_toward_longer_space() {
        let edit = closing_edit(seq("0").as_slice(), seq("0000").as_slice());
        assert_eq!(edit, Some(Edit::Insert { position: 1, bit: 0 }));
    }

    #[test]
    fn test_closing_edit_prefers_flip() {
        let edit = closing_edit(seq("0000").as_slice(), seq("1111").as_slice());
        assert_eq!(edit, Some(Edit::Flip(3)));
    }

    #[test]
    fn test_closing_edit_shrinks_toward_shorter_space() {
        let edit = closing_edit(seq("0110").as_slice(), seq("010").as_slice());
        let after = apply("0110", edit.unwrap());
        assert_eq!(after.to_string(), "010");
    }

    #[test]
    fn test_closing_edit_none_when_equal() {
        assert_eq!(closing_edit(seq("101").as_slice(), seq("101").as_slice()), None);
    }

    #[test]
    fn test_random_edit_never_empties() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let single = seq("1");
        for _ in 0..200 {
            if let Some(edit) = random_edit(&single, &mut rng) {
                assert!(!matches!(edit, Edit::Delete(_)));
            }
        }
    }

    #[test]
    fn test_mutate_charges_before_applying() {
        let config = SimulationConfig::new(1).with_rates(1.0, 1.0).with_endowment(1.0);
        let mut engine = MutationEngine::from_config(&config);
        let mut ledger = ResourceLedger::from_config(&config);
        let mut store = SequenceStore::from_sequences(seq("0"), seq("000"));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let first = engine.mutate(Target::Tech, &mut store, &mut ledger, &mut rng);
        assert!(matches!(first, MutationOutcome::Committed { mode: EditMode::Deterministic, .. }));
        assert_eq!(store.tech().to_string(), "00");

        let second = engine.mutate(Target::Tech, &mut store, &mut ledger, &mut rng);
        assert_eq!(second, MutationOutcome::Unaffordable);
        assert_eq!(store.tech().to_string(), "00");
        assert!(ledger.exhausted());
    }

    #[test]
    fn test_converged_greedy_makes_no_edit() {
        let config = SimulationConfig::new(1).with_rates(1.0, 1.0);
        let mut engine = MutationEngine::from_config(&config);
        let mut ledger = ResourceLedger::from_config(&config);
        let mut store = SequenceStore::from_sequences(seq("0110"), seq("0110"));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = engine.mutate(Target::Space, &mut store, &mut ledger, &mut rng);
        assert_eq!(outcome, MutationOutcome::NoEdit);
        assert_eq!(ledger.resource_store(), config.initial_endowment);
    }

    #[test]
    fn test_hillclimb_only_improves() {
        let config = SimulationConfig::new(1)
            .with_rates(1.0, 1.0)
            .with_deterministic_rule(DeterministicRule::Hillclimb);
        let mut engine = MutationEngine::from_config(&config);
        let store = SequenceStore::from_sequences(seq("0101"), seq("0011"));
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut eval = EffectivenessEvaluator::new();
        let before = eval.evaluate(store.tech().as_slice(), store.space().as_slice());

        for _ in 0..100 {
            if let Some((edit, mode)) = engine.propose(Target::Tech, &store, &mut rng) {
                assert_eq!(mode, EditMode::Deterministic);
                let mut t = store.tech().clone();
                t.apply(edit);
                assert!(eval.evaluate(t.as_slice(), store.space().as_slice()) > before);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_closing_edit_reduces_distance_by_one(
            a in prop::collection::vec(0u8..=1, 1..30),
            b in prop::collection::vec(0u8..=1, 1..30),
        ) {
            let before = levenshtein(&a, &b);
            match closing_edit(&a, &b) {
                None => prop_assert_eq!(before, 0),
                Some(edit) => {
                    let mut t = BitSequence::try_from(a.clone()).unwrap();
                    prop_assert!(t.apply(edit));
                    prop_assert_eq!(levenshtein(t.as_slice(), &b), before - 1);
                }
            }
        }
    }
}
