//! Reporting API: read-only Axum server over the wager store.
//!
//! Exposes rules, committed wagers, bank snapshots and result statistics
//! as JSON. Nothing here writes to the store. CORS enabled for local
//! development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use routes::{AppState, DashboardState};

/// Serve the reporting API until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind reporting port {port}"))?;
    info!(port, "Reporting API listening on http://localhost:{port}");

    axum::serve(listener, app)
        .await
        .context("Reporting API server error")
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/rules", get(routes::get_rules))
        .route("/api/stats", get(routes::get_stats))
        .route("/api/wagers", get(routes::get_wagers))
        .route("/api/bank", get(routes::get_bank))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeagueLists;
    use crate::storage::{MemoryStore, Store};
    use crate::types::{BankSnapshot, Fixture, RuleId, Wager};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let store = MemoryStore::new();
        let kick_off = NaiveDateTime::parse_from_str("2026-10-19 21:00", "%Y-%m-%d %H:%M").unwrap();
        store
            .save(&Wager::new(Fixture::sample("Sevilla", "Getafe", kick_off), RuleId::RuleOne))
            .await
            .unwrap();
        store
            .save_bank_snapshot(&BankSnapshot {
                date: kick_off.date(),
                amount: dec!(1000),
            })
            .await
            .unwrap();
        Arc::new(DashboardState::new(Arc::new(store), LeagueLists::default()))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        // Extractor rejections answer in plain text.
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, _) = get_json(build_router(test_state().await), "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rules_endpoint() {
        let (status, json) = get_json(build_router(test_state().await), "/api/rules").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["id"], "RULE_ONE");
        assert_eq!(json[0]["price_index"], "FIRST_WIN");
        assert_eq!(json[1]["id"], "RULE_TEST");
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let (status, json) = get_json(
            build_router(test_state().await),
            "/api/stats?from=2026-10-01&to=2026-10-31",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["RULE_ONE"]["period"]["total"], 1);
        assert_eq!(json["RULE_ONE"]["period"]["no_result"], 1);
    }

    #[tokio::test]
    async fn test_stats_bad_date_rejected() {
        let (status, body) = get_json(
            build_router(test_state().await),
            "/api/stats?from=yesterday&to=2026-10-31",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_string());
    }

    #[tokio::test]
    async fn test_wagers_endpoint() {
        let (status, json) = get_json(
            build_router(test_state().await),
            "/api/wagers?date=2026-10-19",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["RULE_ONE"][0]["fixture"]["first_team"], "Sevilla");
        assert_eq!(json["RULE_TEST"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_bank_endpoint() {
        let (status, json) =
            get_json(build_router(test_state().await), "/api/bank?date=2026-10-19").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["amount"], 1000.0);
    }

    #[tokio::test]
    async fn test_write_methods_not_routed() {
        let app = build_router(test_state().await);
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/rules")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
