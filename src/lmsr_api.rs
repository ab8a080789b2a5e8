//! HTTP quote API for the display layer.
//!
//! Every handler is a synchronous computation over query parameters; the
//! server holds no market state.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::error::PricingError;
use crate::lmsr_core::{MarketState, Side, TradeRequest};
use crate::quote::{Budget, MaxLossQuote, QuoteDisplay, QuoteEngine, QuoteOutcome};
use crate::reltime::{self, RelativeTime};

type ApiError = (StatusCode, Json<Value>);

#[derive(Clone)]
pub struct AppState {
    engine: Arc<QuoteEngine>,
}

impl AppState {
    pub fn new(engine: QuoteEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub b: f64,
    pub yes: f64,
    pub no: f64,
    #[serde(deserialize_with = "side_from_str")]
    pub side: Side,
    pub amount: f64,
    pub budget: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MaxLossParams {
    pub b: f64,
}

#[derive(Debug, Deserialize)]
pub struct RelTimeParams {
    pub datetime: String,
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    outcome: QuoteOutcome,
    display: QuoteDisplay,
}

/// Accepts any casing the `FromStr` impl accepts ("yes", "YES", " No ").
fn side_from_str<'de, D>(deserializer: D) -> Result<Side, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/quote", get(get_quote))
        .route("/max_loss", get(get_max_loss))
        .route("/reltime", get(get_reltime))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn bad_request(err: PricingError) -> ApiError {
    warn!(error = %err, "rejected pricing request");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": err.reason(),
            "detail": err.to_string(),
        })),
    )
}

fn invalid_input(rejection: QueryRejection) -> ApiError {
    warn!(error = %rejection, "unparsable query");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid input",
            "detail": rejection.body_text(),
        })),
    )
}

// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "prema-engine"
    }))
}

async fn get_quote(
    State(state): State<AppState>,
    params: Result<Query<QuoteParams>, QueryRejection>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let Query(params) = params.map_err(invalid_input)?;
    let market = MarketState {
        yes_shares: params.yes,
        no_shares: params.no,
        liquidity: params.b,
    };
    let trade = TradeRequest::buy(params.side, params.amount);
    let budget = params.budget.map(Budget::new);

    let outcome = state.engine.quote(&market, trade, budget).map_err(bad_request)?;
    if let QuoteOutcome::Priced(quote) = &outcome {
        info!(side = %quote.side, amount = quote.amount, cost = quote.cost, "quote served");
    }

    let response = QuoteResponse {
        display: state.engine.render(&outcome),
        outcome,
    };
    Ok(Json(response))
}

async fn get_max_loss(
    State(state): State<AppState>,
    params: Result<Query<MaxLossParams>, QueryRejection>,
) -> Result<Json<MaxLossQuote>, ApiError> {
    let Query(params) = params.map_err(invalid_input)?;
    let sizing = state.engine.market_creation_quote(params.b).map_err(bad_request)?;
    Ok(Json(sizing))
}

async fn get_reltime(
    params: Result<Query<RelTimeParams>, QueryRejection>,
) -> Result<Json<RelativeTime>, ApiError> {
    let Query(params) = params.map_err(invalid_input)?;
    let now = params.now.unwrap_or_else(Utc::now);
    match reltime::render_time_tag(&params.datetime, now) {
        Ok(tag) => Ok(Json(tag)),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid datetime",
                "detail": e.to_string(),
            })),
        )),
    }
}
