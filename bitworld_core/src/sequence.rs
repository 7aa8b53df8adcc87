//! Binary sequences for the technological system (T) and the search space (S).

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseSequenceError;

/// An ordered, non-empty sequence of bits stored as `0`/`1` bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>")]
pub struct BitSequence(Vec<u8>);

impl BitSequence {
    /// Draws `length` bits (at least one), each 1 with probability `prob`
    /// (0.5 when unset).
    pub fn initialize<R: Rng + ?Sized>(length: usize, prob: Option<f64>, rng: &mut R) -> Self {
        let p = prob.unwrap_or(0.5);
        Self((0..length.max(1)).map(|_| u8::from(rng.gen_bool(p))).collect())
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read-only view of the bits.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Number of set bits.
    pub fn ones(&self) -> usize {
        self.0.iter().filter(|&&b| b == 1).count()
    }

    /// Applies a single edit in place.
    ///
    /// Returns `false` and leaves the sequence untouched when the position
    /// is out of range or the edit would empty the sequence.
    pub fn apply(&mut self, edit: Edit) -> bool {
        match edit {
            Edit::Flip(position) => match self.0.get_mut(position) {
                Some(bit) => {
                    *bit ^= 1;
                    true
                }
                None => false,
            },
            Edit::Insert { position, bit } => {
                if position > self.0.len() || bit > 1 {
                    return false;
                }
                self.0.insert(position, bit);
                true
            }
            Edit::Delete(position) => {
                if position >= self.0.len() || self.0.len() <= 1 {
                    return false;
                }
                self.0.remove(position);
                true
            }
        }
    }
}

impl TryFrom<Vec<u8>> for BitSequence {
    type Error = ParseSequenceError;

    /// Accepts a non-empty vector of `0`/`1` bytes.
    fn try_from(bits: Vec<u8>) -> Result<Self, Self::Error> {
        if bits.is_empty() {
            return Err(ParseSequenceError::Empty);
        }
        if let Some(position) = bits.iter().position(|&b| b > 1) {
            return Err(ParseSequenceError::InvalidBit {
                bit: bits[position],
                position,
            });
        }
        Ok(Self(bits))
    }
}

impl fmt::Display for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            f.write_str(if *bit == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for BitSequence {
    type Err = ParseSequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseSequenceError::Empty);
        }
        s.chars()
            .enumerate()
            .map(|(position, symbol)| match symbol {
                '0' => Ok(0),
                '1' => Ok(1),
                _ => Err(ParseSequenceError::InvalidSymbol { symbol, position }),
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Self)
    }
}

/// A single-symbol edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edit {
    /// Replace the bit at `position` with its complement
    Flip(usize),

    /// Insert `bit` before `position` (`position == len` appends)
    Insert { position: usize, bit: u8 },

    /// Remove the bit at `position`
    Delete(usize),
}

/// Which sequence an edit slot is spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Tech,
    Space,
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self {
            Target::Tech => "tech",
            Target::Space => "space",
        }
    }
}

/// Owner of T and S.
///
/// Nothing else holds a mutable handle on the sequences; other components
/// see them through `&BitSequence` borrows only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceStore {
    tech: BitSequence,
    space: BitSequence,
}

impl SequenceStore {
    /// Draws both sequences from `rng`. The search space is drawn first.
    pub fn initialize<R: Rng + ?Sized>(
        t_length: usize,
        t_prob: Option<f64>,
        s_length: usize,
        s_prob: Option<f64>,
        rng: &mut R,
    ) -> Self {
        let space = BitSequence::initialize(s_length, s_prob, rng);
        let tech = BitSequence::initialize(t_length, t_prob, rng);
        Self { tech, space }
    }

    /// Wraps existing sequences.
    pub fn from_sequences(tech: BitSequence, space: BitSequence) -> Self {
        Self { tech, space }
    }

    pub fn tech(&self) -> &BitSequence {
        &self.tech
    }

    pub fn space(&self) -> &BitSequence {
        &self.space
    }

    /// Returns `(target, other)`.
    pub fn pair(&self, target: Target) -> (&BitSequence, &BitSequence) {
        match target {
            Target::Tech => (&self.tech, &self.space),
            Target::Space => (&self.space, &self.tech),
        }
    }

    /// Applies `edit` to the chosen sequence.
    pub fn apply_edit(&mut self, target: Target, edit: Edit) -> bool {
        match target {
            Target::Tech => self.tech.apply(edit),
            Target::Space => self.space.apply(edit),
        }
    }
}
