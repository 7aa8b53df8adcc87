//! Error types for the bitworld engine.

use thiserror::Error;

/// Invalid simulation parameters, detected before any generation runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A probability-like parameter fell outside [0, 1]
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    /// A sequence length of zero was requested
    #[error("{field} must be at least 1")]
    ZeroLength { field: &'static str },

    /// The generation cap was zero
    #[error("generations must be at least 1")]
    ZeroGenerations,

    /// The complexity limit was zero
    #[error("limit must be greater than 0")]
    NonPositiveLimit,

    /// Edits must cost something, otherwise the store never binds
    #[error("edit_cost must be greater than 0, got {0}")]
    NonPositiveCost(f64),

    /// A resource parameter was negative, NaN or infinite
    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },
}

impl ConfigError {
    /// Creates an out-of-range error.
    pub fn out_of_range(field: &'static str, value: f64) -> Self {
        Self::OutOfRange { field, value }
    }

    /// Creates an invalid-amount error.
    pub fn invalid_amount(field: &'static str, value: f64) -> Self {
        Self::InvalidAmount { field, value }
    }
}

/// Failure to build a [`crate::BitSequence`] from text or raw bits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSequenceError {
    #[error("sequence must not be empty")]
    Empty,

    #[error("invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol { symbol: char, position: usize },

    #[error("invalid bit {bit} at position {position}")]
    InvalidBit { bit: u8, position: usize },
}
