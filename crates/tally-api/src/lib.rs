//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by any [`tally_core::store::SalesStore`].
//! Transport concerns (TLS, CORS, tracing layers) are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(store.clone()))
//! ```

pub mod analysis;
pub mod error;
pub mod export;
pub mod ingest;
pub mod insights;
pub mod meta;
pub mod reports;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use serde_json::json;
use tally_core::store::SalesStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SalesStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Ingestion
    .route("/ingest", post(ingest::handler::<S>))
    // Reference data
    .route("/meta", get(meta::handler::<S>))
    // Reports
    .route("/dashboard", get(reports::daily::<S>))
    .route("/analysis/deep", get(reports::deep::<S>))
    .route("/analysis/heatmap", get(reports::heatmap::<S>))
    .route("/analysis/pivot", get(reports::pivot::<S>))
    // Classification and drill-downs
    .route("/analysis/abc", get(analysis::abc::<S>))
    .route("/analysis/store", get(analysis::store_analysis::<S>))
    .route("/analysis/brand", get(analysis::brand_analysis::<S>))
    .route("/analysis/product/trend", get(analysis::product_trend::<S>))
    // Insights
    .route("/analysis/insights", get(insights::handler::<S>))
    // Export contract
    .route("/export/brand", get(export::handler::<S>))
    .with_state(store)
}

async fn health() -> Json<serde_json::Value> {
  Json(json!({ "status": "ok" }))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tally_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn test_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  async fn send(
    store: Arc<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
      Some(json_body) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        builder.body(Body::from(json_body.to_string())).unwrap()
      }
      None => builder.body(Body::empty()).unwrap(),
    };

    let response = api_router(store).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  fn scenario_rows() -> Value {
    json!([
      {
        "date": "2024-01-01", "store": "Gangnam", "brand": "Acme",
        "barcode": "111", "product": "Widget",
        "quantity": 5, "amount": 5000, "customers": 2, "inventory": 100
      },
      {
        "date": "2024-01-02", "store": "Gangnam", "brand": "Acme",
        "barcode": "111", "product": "Widget",
        "quantity": 3, "amount": 3000, "customers": 1, "inventory": 97
      }
    ])
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_reports_ok() {
    let (status, body) = send(test_store().await, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  // ── Ingest + dashboard ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn ingest_then_dashboard_round_trip() {
    let store = test_store().await;

    let (status, body) =
      send(store.clone(), "POST", "/ingest", Some(scenario_rows())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], 2);

    let (status, body) = send(
      store,
      "GET",
      "/dashboard?start_date=2024-01-01&end_date=2024-01-02",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // Date descending: the 2nd of January leads.
    assert_eq!(rows[0]["date"], "2024-01-02");
    assert_eq!(rows[0]["total_amount"], 3000);
    assert_eq!(rows[1]["total_amount"], 5000);
  }

  #[tokio::test]
  async fn deep_metrics_carry_derived_ratios() {
    let store = test_store().await;
    send(store.clone(), "POST", "/ingest", Some(scenario_rows())).await;

    let (status, body) = send(store, "GET", "/analysis/deep", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], 8000);
    assert_eq!(body["total_quantity"], 8);
    assert_eq!(body["total_customers"], 3);
    assert_eq!(body["atv"], 2667);
    assert_eq!(body["upt"], 2.67);
    assert_eq!(body["sell_through"], 7.6);
  }

  // ── Classification ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn abc_endpoint_grades_products() {
    let store = test_store().await;
    send(store.clone(), "POST", "/ingest", Some(scenario_rows())).await;

    let (status, body) = send(store, "GET", "/analysis/abc", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    // A single product is rank percentile 100 — grade C.
    assert_eq!(rows[0]["grade"], "C");
    assert_eq!(rows[0]["brand_name"], "Acme");
  }

  #[tokio::test]
  async fn store_and_brand_analysis_require_their_ids() {
    let store = test_store().await;

    let (status, body) =
      send(store.clone(), "GET", "/analysis/store", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("store_id"));

    let (status, body) = send(store, "GET", "/analysis/brand", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("brand_id"));
  }

  #[tokio::test]
  async fn malformed_filter_values_are_rejected() {
    let store = test_store().await;
    let (status, _body) =
      send(store, "GET", "/dashboard?brand_id=not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Insights ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn insights_empty_without_data() {
    let (status, body) =
      send(test_store().await, "GET", "/analysis/insights", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
  }

  #[tokio::test]
  async fn insights_flag_low_sell_through_brands() {
    let store = test_store().await;
    // 8 sold of 205 available (snapshot sums included) is below the 10% bar.
    send(store.clone(), "POST", "/ingest", Some(scenario_rows())).await;

    let (status, body) = send(store, "GET", "/analysis/insights", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["kind"], "warning");
    assert!(rows[0]["message"].as_str().unwrap().contains("Acme"));
  }

  // ── Export ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn export_returns_rows_and_totals() {
    let store = test_store().await;
    send(store.clone(), "POST", "/ingest", Some(scenario_rows())).await;

    let (status, body) = send(store, "GET", "/export/brand", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total_amount"], 8000);
    assert_eq!(body["summary"]["total_quantity"], 8);
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["store_name"], "Gangnam");
    assert_eq!(rows[0]["barcode"], "111");
  }
}
