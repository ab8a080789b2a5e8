//! Error types for the pricing engine.
//!
//! A budget rejection is not an error; see `quote::QuoteOutcome::Rejected`.

use thiserror::Error;

/// Precondition violations and numeric failures raised by the pricing engine.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PricingError {
    #[error("invalid liquidity: b must be positive and finite, got {0}")]
    InvalidLiquidity(f64),

    #[error("non-finite input: {field} = {value}")]
    NonFiniteInput { field: &'static str, value: f64 },

    #[error("invalid chance unit: must be positive and finite, got {0}")]
    InvalidUnit(f64),

    #[error("numeric overflow evaluating {0}")]
    Overflow(&'static str),
}

impl PricingError {
    /// Short machine-readable reason used at the API boundary.
    pub fn reason(&self) -> &'static str {
        match self {
            PricingError::InvalidLiquidity(_) => "invalid liquidity",
            PricingError::NonFiniteInput { .. } => "non-finite input",
            PricingError::InvalidUnit(_) => "invalid unit",
            PricingError::Overflow(_) => "overflow",
        }
    }
}

pub type PricingResult<T> = Result<T, PricingError>;
