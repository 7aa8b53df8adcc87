//! Complexity of the technological system and the search space.

use serde::{Deserialize, Serialize};

use crate::sequence::BitSequence;

/// Complexity of both sequences at one point of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Complexity {
    pub tech: usize,
    pub space: usize,
}

/// Tracks tech and space complexity against the configured limit.
///
/// Complexity is sequence length: both metrics grow and shrink with the
/// number of symbols and share the `limit` ceiling on the tech side.
#[derive(Debug, Clone)]
pub struct ComplexityTracker {
    limit: usize,
    current: Complexity,
}

impl ComplexityTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            current: Complexity::default(),
        }
    }

    /// Recomputes complexity from the current sequences.
    pub fn update(&mut self, tech: &BitSequence, space: &BitSequence) -> Complexity {
        self.current = Complexity {
            tech: tech.len(),
            space: space.len(),
        };
        self.current
    }

    /// Last computed values.
    pub fn current(&self) -> Complexity {
        self.current
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// True once tech complexity has reached the limit.
    pub fn limit_reached(&self) -> bool {
        self.current.tech >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_is_length() {
        let mut tracker = ComplexityTracker::new(5);
        let c = tracker.update(&"0101".parse().unwrap(), &"11".parse().unwrap());
        assert_eq!(c, Complexity { tech: 4, space: 2 });
        assert!(!tracker.limit_reached());

        tracker.update(&"01011".parse().unwrap(), &"11".parse().unwrap());
        assert!(tracker.limit_reached());
        assert_eq!(tracker.current().tech, 5);
    }
}
