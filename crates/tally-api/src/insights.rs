//! Handler for `GET /analysis/insights`.
//!
//! Assembles the automated insight list: the month-over-month growth
//! message (if revenue moved more than ±10% against the equivalent days of
//! the prior month), then up to three low-sell-through brand warnings.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use tally_core::{
  analytics::{self, Insight},
  store::SalesStore,
};

use crate::error::ApiError;

/// `GET /analysis/insights`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Insight>>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let windows = analytics::month_windows(Utc::now().date_naive());

  let (this_month, last_month, volumes) = tokio::join!(
    store.amount_in_range(windows.current.0, windows.current.1),
    store.amount_in_range(windows.previous.0, windows.previous.1),
    store.brand_volumes(),
  );

  let insights = analytics::insights(
    this_month.map_err(|e| ApiError::Store(Box::new(e)))?,
    last_month.map_err(|e| ApiError::Store(Box::new(e)))?,
    &volumes.map_err(|e| ApiError::Store(Box::new(e)))?,
  );
  Ok(Json(insights))
}
