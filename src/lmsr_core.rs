//! src/lmsr_core.rs
//! Numerically stable binary LMSR pricing primitives on f64.
//!
//! Everything here is a pure function of its arguments: no I/O, no logging,
//! no shared state. Budget and tax policy live in `quote`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, PricingResult};

/// Share size used by the two-sided chance estimate.
pub const DEFAULT_CHANCE_UNIT: f64 = 1.0;

/// Market outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Ok(Side::Yes),
            "no" => Ok(Side::No),
            _ => Err(format!("Invalid side: '{}', expected 'yes' or 'no'", s)),
        }
    }
}

/// Snapshot of outstanding shares and liquidity for one market.
///
/// The engine never mutates a snapshot; `after` returns a new one.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub yes_shares: f64,
    pub no_shares: f64,
    pub liquidity: f64,
}

impl fmt::Debug for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketState")
            .field("yes_shares", &self.yes_shares)
            .field("no_shares", &self.no_shares)
            .field("liquidity", &self.liquidity)
            .field("p_yes", &softmax_yes(self.yes_shares, self.no_shares, self.liquidity))
            .finish()
    }
}

impl MarketState {
    /// Validated constructor.
    pub fn new(liquidity: f64, yes_shares: f64, no_shares: f64) -> PricingResult<Self> {
        let state = Self {
            yes_shares,
            no_shares,
            liquidity,
        };
        state.validate()?;
        Ok(state)
    }

    /// Fresh market with no shares issued.
    pub fn empty(liquidity: f64) -> PricingResult<Self> {
        Self::new(liquidity, 0.0, 0.0)
    }

    pub fn validate(&self) -> PricingResult<()> {
        check_liquidity(self.liquidity)?;
        check_finite("yes_shares", self.yes_shares)?;
        check_finite("no_shares", self.no_shares)
    }

    /// State after `amount` shares of `side` are issued (negative = redeemed).
    pub fn after(&self, side: Side, amount: f64) -> MarketState {
        let mut next = *self;
        match side {
            Side::Yes => next.yes_shares += amount,
            Side::No => next.no_shares += amount,
        }
        next
    }

    pub fn cost(&self) -> PricingResult<f64> {
        cost_potential(self.liquidity, self.yes_shares, self.no_shares)
    }

    pub fn trade_cost(&self, side: Side, amount: f64) -> PricingResult<f64> {
        trade_cost(self.liquidity, self.yes_shares, self.no_shares, side, amount)
    }

    /// Two-sided chance estimate for `side`.
    pub fn chance(&self, side: Side) -> PricingResult<f64> {
        chance_for(self.liquidity, self.yes_shares, self.no_shares, side, DEFAULT_CHANCE_UNIT)
    }

    /// Closed-form (softmax) probability of YES.
    pub fn prob_yes(&self) -> PricingResult<f64> {
        prob_yes(self.liquidity, self.yes_shares, self.no_shares)
    }
}

/// A proposed trade: `quantity` shares of `side`, negative for a sale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub side: Side,
    pub quantity: f64,
}

impl TradeRequest {
    pub fn buy(side: Side, quantity: f64) -> Self {
        Self { side, quantity }
    }

    pub fn sell(side: Side, quantity: f64) -> Self {
        Self {
            side,
            quantity: -quantity,
        }
    }
}

// -----------------------
// Input validation
// -----------------------

#[inline]
pub(crate) fn check_liquidity(b: f64) -> PricingResult<()> {
    if b.is_finite() && b > 0.0 {
        Ok(())
    } else {
        Err(PricingError::InvalidLiquidity(b))
    }
}

#[inline]
pub(crate) fn check_finite(field: &'static str, value: f64) -> PricingResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PricingError::NonFiniteInput { field, value })
    }
}

// -----------------------
// Numerically stable math
// -----------------------

#[inline]
pub fn log_sum_exp(a: f64, b: f64) -> f64 {
    let m = a.max(b);
    // if m is -inf (when both a,b are -inf), this still returns -inf
    m + ((a - m).exp() + (b - m).exp()).ln()
}

/// Unchecked softmax; callers validate.
#[inline]
fn softmax_yes(q_yes: f64, q_no: f64, b: f64) -> f64 {
    let a = q_yes / b;
    let c = q_no / b;
    let m = a.max(c);
    let ey = (a - m).exp();
    let en = (c - m).exp();
    ey / (ey + en)
}

/// LMSR potential `C = b * ln(exp(yes/b) + exp(no/b))`, shifted by the max exponent.
pub fn cost_potential(b: f64, yes: f64, no: f64) -> PricingResult<f64> {
    check_liquidity(b)?;
    check_finite("yes_shares", yes)?;
    check_finite("no_shares", no)?;

    let a = yes / b;
    let c = no / b;
    if !a.is_finite() || !c.is_finite() {
        return Err(PricingError::Overflow("cost_potential"));
    }

    let potential = b * log_sum_exp(a, c);
    if potential.is_finite() {
        Ok(potential)
    } else {
        Err(PricingError::Overflow("cost_potential"))
    }
}

/// Cost of issuing `amount` shares of `side` from `(yes, no)`.
///
/// Negative `amount` is a sale and yields a negative cost (a payout).
pub fn trade_cost(b: f64, yes: f64, no: f64, side: Side, amount: f64) -> PricingResult<f64> {
    check_finite("amount", amount)?;
    let before = cost_potential(b, yes, no)?;

    let (yes_after, no_after) = match side {
        Side::Yes => (yes + amount, no),
        Side::No => (yes, no + amount),
    };
    if !yes_after.is_finite() || !no_after.is_finite() {
        return Err(PricingError::Overflow("trade_cost"));
    }

    let after = cost_potential(b, yes_after, no_after)?;
    Ok(after - before)
}

/// Implied chance of YES from the marginal cost of one share on each side.
pub fn implied_chance(b: f64, yes: f64, no: f64) -> PricingResult<f64> {
    implied_chance_with_unit(b, yes, no, DEFAULT_CHANCE_UNIT)
}

/// Implied chance of YES as `y / (y + n)`, where `y` and `n` are the costs of
/// buying `unit` shares of YES and of NO from the same state.
///
/// The approximation error grows with `unit / b`. When both marginal costs
/// vanish (share counts so large that `unit` is below f64 resolution) the
/// closed form is returned instead.
pub fn implied_chance_with_unit(b: f64, yes: f64, no: f64, unit: f64) -> PricingResult<f64> {
    if !(unit.is_finite() && unit > 0.0) {
        return Err(PricingError::InvalidUnit(unit));
    }
    let y = trade_cost(b, yes, no, Side::Yes, unit)?;
    let n = trade_cost(b, no, yes, Side::Yes, unit)?;

    let total = y + n;
    if total > 0.0 && total.is_finite() {
        Ok((y / total).clamp(0.0, 1.0))
    } else {
        Ok(softmax_yes(yes, no, b))
    }
}

/// Two-sided chance for either side, each side computed on its own.
pub fn chance_for(b: f64, yes: f64, no: f64, side: Side, unit: f64) -> PricingResult<f64> {
    match side {
        Side::Yes => implied_chance_with_unit(b, yes, no, unit),
        Side::No => implied_chance_with_unit(b, no, yes, unit),
    }
}

/// Closed-form instantaneous price of YES: `1 / (1 + exp((no - yes) / b))`.
pub fn prob_yes(b: f64, yes: f64, no: f64) -> PricingResult<f64> {
    check_liquidity(b)?;
    check_finite("yes_shares", yes)?;
    check_finite("no_shares", no)?;
    Ok(softmax_yes(yes, no, b))
}

/// Upper bound on the market maker's loss: `b * ln(2)`.
pub fn max_loss(b: f64) -> PricingResult<f64> {
    check_liquidity(b)?;
    Ok(b * std::f64::consts::LN_2)
}

// -----------------------
// Tests
// -----------------------
