//! Prema Pricing Engine Library
//!
//! LMSR pricing and quoting for binary prediction markets.

// Re-export modules for use in binaries
pub mod config;
pub mod error;
pub mod lmsr_api;
pub mod lmsr_core;
pub mod quote;
pub mod reltime;
pub mod rounding;
pub mod stress;

#[cfg(test)]
mod tests;

pub use error::{PricingError, PricingResult};
pub use lmsr_core::{MarketState, Side, TradeRequest};
pub use quote::{Budget, Quote, QuoteEngine, QuoteOutcome};
