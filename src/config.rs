//! Configuration management for the pricing engine
//! Supports environment variables and default values for pricing policy

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::warn;

/// Configuration for the pricing engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Quote policy
    pub pricing: PricingConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

/// How the implied chance of an outcome is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanceMethod {
    /// Ratio of the costs of buying one unit on each side.
    TwoSided,
    /// Exact softmax `1 / (1 + exp((no - yes) / b))`.
    ClosedForm,
}

impl FromStr for ChanceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "two_sided" | "two-sided" => Ok(ChanceMethod::TwoSided),
            "closed_form" | "closed-form" => Ok(ChanceMethod::ClosedForm),
            other => Err(format!("unknown chance method '{}'", other)),
        }
    }
}

/// Quote policy layered on top of the LMSR math
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Fee charged on the absolute trade cost (default: 0.01)
    pub tax_rate: f64,

    /// Chance estimator (default: two-sided)
    pub chance_method: ChanceMethod,

    /// Share size for the two-sided estimator (default: 1.0)
    pub chance_unit: f64,

    /// Decimal digits for rendered cost, tax and max loss (default: 3)
    pub cost_digits: i32,

    /// Decimal digits for the rendered chance percentage (default: 0)
    pub chance_digits: i32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: 0.01,
            chance_method: ChanceMethod::TwoSided,
            chance_unit: 1.0,
            cost_digits: 3,
            chance_digits: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port (default: 3001)
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3001 }
    }
}

impl Config {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(rate) = lookup("PRICING_TAX_RATE") {
            config.pricing.tax_rate = parse_or("PRICING_TAX_RATE", &rate, config.pricing.tax_rate);
        }

        if let Some(method) = lookup("PRICING_CHANCE_METHOD") {
            config.pricing.chance_method =
                parse_or("PRICING_CHANCE_METHOD", &method, config.pricing.chance_method);
        }

        if let Some(unit) = lookup("PRICING_CHANCE_UNIT") {
            config.pricing.chance_unit = parse_or("PRICING_CHANCE_UNIT", &unit, config.pricing.chance_unit);
        }

        if let Some(digits) = lookup("PRICING_COST_DIGITS") {
            config.pricing.cost_digits = parse_or("PRICING_COST_DIGITS", &digits, config.pricing.cost_digits);
        }

        if let Some(digits) = lookup("PRICING_CHANCE_DIGITS") {
            config.pricing.chance_digits =
                parse_or("PRICING_CHANCE_DIGITS", &digits, config.pricing.chance_digits);
        }

        if let Some(port) = lookup("SERVER_PORT") {
            config.server.port = parse_or("SERVER_PORT", &port, config.server.port);
        }

        // Validate configuration
        config.validate();

        config
    }

    /// Validate configuration values, resetting bad ones to defaults
    fn validate(&mut self) {
        let defaults = PricingConfig::default();

        if !self.pricing.tax_rate.is_finite() || !(0.0..1.0).contains(&self.pricing.tax_rate) {
            warn!(tax_rate = self.pricing.tax_rate, "invalid tax_rate, using default");
            self.pricing.tax_rate = defaults.tax_rate;
        }

        if !self.pricing.chance_unit.is_finite() || self.pricing.chance_unit <= 0.0 {
            warn!(chance_unit = self.pricing.chance_unit, "invalid chance_unit, using default");
            self.pricing.chance_unit = defaults.chance_unit;
        }

        if !(0..=12).contains(&self.pricing.cost_digits) {
            warn!(cost_digits = self.pricing.cost_digits, "invalid cost_digits, using default");
            self.pricing.cost_digits = defaults.cost_digits;
        }

        if !(0..=6).contains(&self.pricing.chance_digits) {
            warn!(chance_digits = self.pricing.chance_digits, "invalid chance_digits, using default");
            self.pricing.chance_digits = defaults.chance_digits;
        }
    }

    /// Log current configuration
    pub fn log_config(&self) {
        tracing::info!(
            tax_rate = self.pricing.tax_rate,
            chance_method = ?self.pricing.chance_method,
            chance_unit = self.pricing.chance_unit,
            cost_digits = self.pricing.cost_digits,
            chance_digits = self.pricing.chance_digits,
            port = self.server.port,
            "pricing engine configuration"
        );
    }
}

fn parse_or<T>(name: &str, raw: &str, fallback: T) -> T
where
    T: FromStr + Copy,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(variable = name, value = raw, "unparsable value, keeping default");
            fallback
        }
    }
}
