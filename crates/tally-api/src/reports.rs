//! Handlers for the time-series and pivot report endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/dashboard` | Daily trend, most recent 30 days under the filter |
//! | `GET` | `/analysis/deep` | Grand totals plus ATV / UPT / sell-through |
//! | `GET` | `/analysis/heatmap` | Day-of-week pattern (0 = Sunday) |
//! | `GET` | `/analysis/pivot` | Sums grouped by brand or store |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::{
  analytics::{self, DeepMetrics},
  report::{DailySales, PivotRow, WeekdaySales},
  store::{PivotBy, SalesFilter, SalesStore},
};

use crate::error::ApiError;

/// `GET /dashboard[?start_date=...][&end_date=...][&brand_id=...][&store_id=...]`
pub async fn daily<S>(
  State(store): State<Arc<S>>,
  Query(filter): Query<SalesFilter>,
) -> Result<Json<Vec<DailySales>>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = store
    .daily_trend(filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}

/// `GET /analysis/deep` — same filter params as the dashboard.
pub async fn deep<S>(
  State(store): State<Arc<S>>,
  Query(filter): Query<SalesFilter>,
) -> Result<Json<DeepMetrics>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let totals = store
    .deep_totals(filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(analytics::deep_metrics(totals)))
}

/// `GET /analysis/heatmap` — same filter params as the dashboard.
pub async fn heatmap<S>(
  State(store): State<Arc<S>>,
  Query(filter): Query<SalesFilter>,
) -> Result<Json<Vec<WeekdaySales>>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = store
    .weekday_pattern(filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}

#[derive(Debug, Default, Deserialize)]
pub struct PivotParams {
  #[serde(default)]
  pub group_by:   PivotBy,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

/// `GET /analysis/pivot[?group_by=brand|store][&start_date=...][&end_date=...]`
pub async fn pivot<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<PivotParams>,
) -> Result<Json<Vec<PivotRow>>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let filter = SalesFilter {
    start_date: params.start_date,
    end_date: params.end_date,
    ..SalesFilter::default()
  };
  let rows = store
    .pivot(params.group_by, filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}
