//! Quote policy on top of `lmsr_core`: tax, budget check, chance method and
//! display rendering.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::{ChanceMethod, PricingConfig};
use crate::error::{PricingError, PricingResult};
use crate::lmsr_core::{self, MarketState, Side, TradeRequest};
use crate::rounding::{format_rounded, round_for_display, to_ledger_units};

/// Display text shown in place of a price when the budget is exceeded.
pub const TOO_MUCH: &str = "too much";

/// Funds the trader can spend on this quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub available: f64,
}

impl Budget {
    pub fn new(available: f64) -> Self {
        Self { available }
    }
}

/// A priced trade. Values are unrounded; see `QuoteEngine::render`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub side: Side,
    pub amount: f64,
    pub cost: f64,
    pub tax: f64,
    pub implied_chance_after: f64,
}

impl Quote {
    /// Cost plus tax.
    pub fn total(&self) -> f64 {
        self.cost + self.tax
    }

    /// Cost and tax in integer ledger units for settlement.
    pub fn settlement(&self) -> PricingResult<Settlement> {
        Ok(Settlement {
            cost: to_ledger_units(self.cost)?,
            tax: to_ledger_units(self.tax)?,
        })
    }
}

/// Ledger-unit amounts a settlement layer debits (negative cost = credit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub cost: i128,
    pub tax: i128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    #[serde(rename = "insufficient budget")]
    InsufficientBudget,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InsufficientBudget => f.write_str("insufficient budget"),
        }
    }
}

/// Result of a successful quote computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuoteOutcome {
    Priced(Quote),
    Rejected { reason: RejectReason },
}

impl QuoteOutcome {
    pub fn priced(&self) -> Option<&Quote> {
        match self {
            QuoteOutcome::Priced(quote) => Some(quote),
            QuoteOutcome::Rejected { .. } => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, QuoteOutcome::Rejected { .. })
    }
}

/// Rendered strings for a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDisplay {
    /// `"5.125¢ (+0.051¢ tax)"` or `"too much"`
    pub price: String,
    /// `"52%"`; absent for rejections
    pub chance: Option<String>,
}

/// Liquidity sizing for a new market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxLossQuote {
    pub liquidity: f64,
    pub max_loss: f64,
    pub display: String,
}

/// Stateless quoting service configured with a pricing policy.
#[derive(Debug, Clone, Default)]
pub struct QuoteEngine {
    config: PricingConfig,
}

impl QuoteEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Flat fee on the absolute cost, never negative.
    pub fn tax(&self, cost: f64) -> f64 {
        (cost * self.config.tax_rate).abs()
    }

    /// Implied chance of `side` at `state` using the configured estimator.
    pub fn chance(&self, state: &MarketState, side: Side) -> PricingResult<f64> {
        let MarketState {
            yes_shares,
            no_shares,
            liquidity,
        } = *state;
        match self.config.chance_method {
            ChanceMethod::TwoSided => {
                lmsr_core::chance_for(liquidity, yes_shares, no_shares, side, self.config.chance_unit)
            }
            // evaluated per side so a tiny chance never cancels against 1.0
            ChanceMethod::ClosedForm => match side {
                Side::Yes => lmsr_core::prob_yes(liquidity, yes_shares, no_shares),
                Side::No => lmsr_core::prob_yes(liquidity, no_shares, yes_shares),
            },
        }
    }

    /// Price `trade` against `state`, rejecting it if the cost exceeds `budget`.
    pub fn quote(
        &self,
        state: &MarketState,
        trade: TradeRequest,
        budget: Option<Budget>,
    ) -> PricingResult<QuoteOutcome> {
        if let Some(budget) = budget {
            if budget.available.is_nan() {
                return Err(PricingError::NonFiniteInput {
                    field: "budget",
                    value: budget.available,
                });
            }
        }

        let cost = state.trade_cost(trade.side, trade.quantity)?;

        if let Some(budget) = budget {
            if cost > budget.available {
                debug!(
                    side = %trade.side,
                    amount = trade.quantity,
                    cost,
                    available = budget.available,
                    "quote rejected"
                );
                return Ok(QuoteOutcome::Rejected {
                    reason: RejectReason::InsufficientBudget,
                });
            }
        }

        let after = state.after(trade.side, trade.quantity);
        let implied_chance_after = self.chance(&after, trade.side)?;
        let quote = Quote {
            side: trade.side,
            amount: trade.quantity,
            cost,
            tax: self.tax(cost),
            implied_chance_after,
        };
        debug!(?quote, "quote priced");
        Ok(QuoteOutcome::Priced(quote))
    }

    /// Maximum operator loss for a market created with liquidity `b`.
    pub fn market_creation_quote(&self, b: f64) -> PricingResult<MaxLossQuote> {
        let max_loss = lmsr_core::max_loss(b)?;
        Ok(MaxLossQuote {
            liquidity: b,
            max_loss,
            display: format!("{}¢", format_rounded(max_loss, self.config.cost_digits)),
        })
    }

    pub fn render(&self, outcome: &QuoteOutcome) -> QuoteDisplay {
        match outcome {
            QuoteOutcome::Priced(quote) => QuoteDisplay {
                price: format!(
                    "{}¢ (+{}¢ tax)",
                    format_rounded(quote.cost, self.config.cost_digits),
                    format_rounded(quote.tax, self.config.cost_digits)
                ),
                chance: Some(self.render_chance(quote.implied_chance_after)),
            },
            QuoteOutcome::Rejected { .. } => QuoteDisplay {
                price: TOO_MUCH.to_string(),
                chance: None,
            },
        }
    }

    /// Chance as a percentage, e.g. `0.5249` -> `"52%"`.
    pub fn render_chance(&self, chance: f64) -> String {
        let percent = round_for_display(chance * 100.0, self.config.chance_digits);
        format!("{}%", percent)
    }
}

/// Quote with the default policy from raw inputs.
pub fn quote(
    b: f64,
    yes: f64,
    no: f64,
    side: Side,
    amount: f64,
    budget: Option<f64>,
) -> PricingResult<QuoteOutcome> {
    let state = MarketState::new(b, yes, no)?;
    QuoteEngine::default().quote(&state, TradeRequest::buy(side, amount), budget.map(Budget::new))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symmetric_market() -> MarketState {
        MarketState::empty(100.0).unwrap()
    }

    #[test]
    fn prices_a_small_yes_purchase() {
        let outcome = quote(100.0, 0.0, 0.0, Side::Yes, 10.0, None).unwrap();
        let q = outcome.priced().copied().unwrap();

        let expected = 100.0 * (0.1f64.exp() + 1.0).ln() - 100.0 * 2f64.ln();
        assert!((q.cost - expected).abs() < 1e-9);
        assert!((q.cost - 5.1249).abs() < 1e-3, "cost={}", q.cost);
        assert!((q.tax - 0.01 * q.cost).abs() < 1e-12);
        assert!(q.implied_chance_after > 0.5);
        assert_eq!(q.side, Side::Yes);
    }

    #[test]
    fn rejects_when_cost_exceeds_budget() {
        let outcome = quote(100.0, 0.0, 0.0, Side::Yes, 10.0, Some(5.0)).unwrap();
        assert_eq!(
            outcome,
            QuoteOutcome::Rejected {
                reason: RejectReason::InsufficientBudget
            }
        );
        assert!(outcome.priced().is_none());
    }

    #[test]
    fn budget_equal_to_cost_is_accepted() {
        let state = symmetric_market();
        let cost = state.trade_cost(Side::No, 25.0).unwrap();
        let outcome = QuoteEngine::default()
            .quote(&state, TradeRequest::buy(Side::No, 25.0), Some(Budget::new(cost)))
            .unwrap();
        assert!(!outcome.is_rejected());
    }

    #[test]
    fn tax_is_not_counted_against_budget() {
        let state = symmetric_market();
        let cost = state.trade_cost(Side::Yes, 10.0).unwrap();
        let outcome = QuoteEngine::default()
            .quote(&state, TradeRequest::buy(Side::Yes, 10.0), Some(Budget::new(cost + 1e-9)))
            .unwrap();
        let q = outcome.priced().unwrap();
        assert!(q.total() > cost + 1e-9);
    }

    #[test]
    fn sale_has_negative_cost_and_positive_tax() {
        let state = MarketState::new(100.0, 40.0, 10.0).unwrap();
        let outcome = QuoteEngine::default()
            .quote(&state, TradeRequest::sell(Side::Yes, 20.0), Some(Budget::new(0.0)))
            .unwrap();
        let q = outcome.priced().unwrap();
        assert!(q.cost < 0.0);
        assert!(q.tax > 0.0);
        assert!((q.tax + 0.01 * q.cost).abs() < 1e-12);
    }

    #[test]
    fn no_side_chance_is_for_the_traded_side() {
        let outcome = quote(100.0, 0.0, 0.0, Side::No, 10.0, None).unwrap();
        let q = outcome.priced().unwrap();
        assert!(q.implied_chance_after > 0.5);

        let yes_chance = lmsr_core::implied_chance(100.0, 0.0, 10.0).unwrap();
        let residual = (q.implied_chance_after + yes_chance - 1.0).abs();
        assert!(residual < 1e-3, "residual={}", residual);
    }

    #[test]
    fn closed_form_method_is_exact_softmax() {
        let engine = QuoteEngine::new(PricingConfig {
            chance_method: ChanceMethod::ClosedForm,
            ..PricingConfig::default()
        });
        let outcome = engine
            .quote(&symmetric_market(), TradeRequest::buy(Side::Yes, 10.0), None)
            .unwrap();
        let q = outcome.priced().unwrap();
        let expected = 1.0 / (1.0 + (-0.1f64).exp());
        assert!((q.implied_chance_after - expected).abs() < 1e-12);
    }

    #[test]
    fn closed_form_keeps_precision_for_unlikely_side() {
        let engine = QuoteEngine::new(PricingConfig {
            chance_method: ChanceMethod::ClosedForm,
            ..PricingConfig::default()
        });
        let state = MarketState::new(1.0, 50.0, 0.0).unwrap();
        let no = engine.chance(&state, Side::No).unwrap();
        let expected = (-50f64).exp();
        assert!(no > 0.0);
        assert!(((no - expected) / expected).abs() < 1e-12);
        assert_eq!(engine.chance(&state, Side::Yes).unwrap(), 1.0);
    }

    #[test]
    fn invalid_inputs_are_errors_not_rejections() {
        assert!(matches!(
            quote(0.0, 0.0, 0.0, Side::Yes, 1.0, Some(100.0)),
            Err(PricingError::InvalidLiquidity(_))
        ));
        assert!(matches!(
            quote(100.0, 0.0, 0.0, Side::Yes, f64::NAN, Some(100.0)),
            Err(PricingError::NonFiniteInput { field: "amount", .. })
        ));
        assert!(matches!(
            quote(100.0, 0.0, 0.0, Side::Yes, 1.0, Some(f64::NAN)),
            Err(PricingError::NonFiniteInput { field: "budget", .. })
        ));
    }

    #[test]
    fn renders_price_and_chance() {
        let engine = QuoteEngine::default();
        let outcome = quote(100.0, 0.0, 0.0, Side::Yes, 10.0, None).unwrap();
        let display = engine.render(&outcome);
        assert_eq!(display.price, "5.125¢ (+0.051¢ tax)");
        assert_eq!(display.chance.as_deref(), Some("52%"));

        let rejected = QuoteOutcome::Rejected {
            reason: RejectReason::InsufficientBudget,
        };
        assert_eq!(engine.render(&rejected).price, TOO_MUCH);
    }

    #[test]
    fn settlement_rounds_to_ledger_units() {
        let q = Quote {
            side: Side::Yes,
            amount: 10.0,
            cost: 5.124_947_951_362_557,
            tax: 0.051_249_479_513_625_57,
            implied_chance_after: 0.52,
        };
        let settlement = q.settlement().unwrap();
        assert_eq!(settlement.cost, 5_124_948);
        assert_eq!(settlement.tax, 51_249);

        let credit = Quote { cost: -2.0, tax: 0.02, ..q }.settlement().unwrap();
        assert_eq!(credit.cost, -2_000_000);
        assert_eq!(credit.tax, 20_000);
    }

    #[test]
    fn market_creation_reports_max_loss() {
        let sizing = QuoteEngine::default().market_creation_quote(100.0).unwrap();
        assert!((sizing.max_loss - 69.315).abs() < 1e-3);
        assert_eq!(sizing.display, "69.315¢");
        assert!(QuoteEngine::default().market_creation_quote(-5.0).is_err());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let rejected = QuoteOutcome::Rejected {
            reason: RejectReason::InsufficientBudget,
        };
        let json = serde_json::to_value(rejected).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "insufficient budget");

        let priced = quote(100.0, 0.0, 0.0, Side::Yes, 10.0, None).unwrap();
        let json = serde_json::to_value(priced).unwrap();
        assert_eq!(json["status"], "priced");
        assert_eq!(json["side"], "yes");
        assert!(json["cost"].as_f64().unwrap() > 0.0);
    }
}
