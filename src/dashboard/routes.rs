//! Reporting API route handlers.
//!
//! All endpoints are read-only and return JSON. State is shared via
//! `Arc<DashboardState>`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::config::LeagueLists;
use crate::engine::stats::{aggregate_by_rule, StatsReport};
use crate::storage::Store;
use crate::types::{PriceIndex, RuleId, Wager};

/// Range used by `/api/stats` when no `from` is given.
const DEFAULT_STATS_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct DashboardState {
    pub store: Arc<dyn Store>,
    pub leagues: LeagueLists,
}

impl DashboardState {
    pub fn new(store: Arc<dyn Store>, leagues: LeagueLists) -> Self {
        Self { store, leagues }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RuleResponse {
    pub id: RuleId,
    pub percent: Decimal,
    pub price_index: PriceIndex,
    pub description: &'static str,
    pub excluded_leagues: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankResponse {
    pub date: NaiveDate,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Handler failure mapped to a status code.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Store(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Store(e) => {
                warn!(error = %e, "Store query failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "store unavailable".to_string())
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/rules
pub async fn get_rules(State(state): State<AppState>) -> Json<Vec<RuleResponse>> {
    Json(
        RuleId::ALL
            .iter()
            .map(|rule| {
                let spec = rule.spec();
                RuleResponse {
                    id: spec.id,
                    percent: spec.percent,
                    price_index: spec.price_index,
                    description: spec.description,
                    excluded_leagues: state.leagues.exclusion_count(*rule),
                }
            })
            .collect(),
    )
}

/// GET /api/stats?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn get_stats(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<BTreeMap<RuleId, StatsReport>>, ApiError> {
    let to = range.to.unwrap_or_else(today);
    let from = range
        .from
        .unwrap_or(to - Duration::days(DEFAULT_STATS_DAYS));
    if from > to {
        return Err(ApiError::BadRequest(format!("from {from} is after to {to}")));
    }

    let wagers = state
        .store
        .get_between(from, to)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(aggregate_by_rule(&wagers, from, to, &state.leagues.included)))
}

/// GET /api/wagers?date=YYYY-MM-DD
pub async fn get_wagers(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<BTreeMap<RuleId, Vec<Wager>>>, ApiError> {
    let date = query.date.unwrap_or_else(today);
    let mut out = BTreeMap::new();
    for rule in RuleId::ALL {
        let wagers = state
            .store
            .get_by_date(*rule, date)
            .await
            .map_err(ApiError::Store)?;
        out.insert(*rule, wagers);
    }
    Ok(Json(out))
}

/// GET /api/bank?date=YYYY-MM-DD
pub async fn get_bank(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<BankResponse>, ApiError> {
    let date = query.date.unwrap_or_else(today);
    let snapshot = state
        .store
        .bank_snapshot(date)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(BankResponse {
        date,
        amount: snapshot.map(|s| s.amount),
    }))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
