//! Effectiveness of a technological system against its search space.
//!
//! Effectiveness is one minus the Levenshtein distance between T and S,
//! normalized by the longer of the two:
//!
//! ```text
//! e = 1 − lev(T, S) / max(|T|, |S|)
//! ```
//!
//! The distance kernel is the classic Wagner–Fischer recurrence with a
//! single rolling row over the shorter input, after stripping the common
//! prefix and suffix. Sequences only grow by the number of edits a
//! generation can afford, so recomputing from scratch every generation is
//! fine.

/// Splits off the common prefix and suffix of `a` and `b`.
///
/// Returns the prefix length and the differing middles. When both middles
/// are non-empty their first symbols differ and so do their last symbols.
pub(crate) fn strip_common_affixes<'a>(a: &'a [u8], b: &'a [u8]) -> (usize, &'a [u8], &'a [u8]) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    (prefix, &a[..a.len() - suffix], &b[..b.len() - suffix])
}

/// One Wagner–Fischer step: turns `row` from `D[i][·]` into `D[i+1][·]`
/// for symbol `x` of the row input against `columns`.
pub(crate) fn advance_row(row: &mut [usize], i: usize, x: u8, columns: &[u8]) {
    let mut diag = row[0];
    row[0] = i + 1;
    for (j, &y) in columns.iter().enumerate() {
        let above = row[j + 1];
        let value = (diag + usize::from(x != y)).min(above + 1).min(row[j] + 1);
        diag = above;
        row[j + 1] = value;
    }
}

/// Levenshtein distance between two bit slices.
pub fn levenshtein(a: &[u8], b: &[u8]) -> usize {
    EffectivenessEvaluator::new().distance(a, b)
}

/// Computes distance and effectiveness, reusing one scratch row.
#[derive(Debug, Default, Clone)]
pub struct EffectivenessEvaluator {
    row: Vec<usize>,
}

impl EffectivenessEvaluator {
    pub fn new() -> Self {
        Self { row: Vec::new() }
    }

    /// Minimum number of single-symbol insertions, deletions and
    /// substitutions turning `a` into `b`.
    pub fn distance(&mut self, a: &[u8], b: &[u8]) -> usize {
        let (_, a, b) = strip_common_affixes(a, b);
        let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
        if short.is_empty() {
            return long.len();
        }

        self.row.clear();
        self.row.extend(0..=short.len());
        for (i, &x) in long.iter().enumerate() {
            advance_row(&mut self.row, i, x, short);
        }
        self.row[short.len()]
    }

    /// Normalized similarity in [0, 1]; 1 means `tech == space`.
    pub fn evaluate(&mut self, tech: &[u8], space: &[u8]) -> f64 {
        let longest = tech.len().max(space.len());
        if longest == 0 {
            return 1.0;
        }
        let distance = self.distance(tech, space);
        (1.0 - distance as f64 / longest as f64).clamp(0.0, 1.0)
    }
}
