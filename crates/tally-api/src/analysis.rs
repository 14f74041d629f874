//! Handlers for the classification and drill-down endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/analysis/abc` | ABC-graded product list under the filter |
//! | `GET` | `/analysis/store` | `?store_id` required; weekly trend + top brands |
//! | `GET` | `/analysis/brand` | `?brand_id` required; best sellers + inventory health |
//! | `GET` | `/analysis/product/trend` | `?product_id` required; optional `days` (default 30) |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{
  analytics::{self, AbcEntry, InventoryHealth},
  report::{BestSeller, ProductTrendPoint, TopBrand, WeeklySales},
  store::{SalesFilter, SalesStore},
};

use crate::error::ApiError;

/// How many best sellers / top brands the drill-down views return.
const TOP_N: u32 = 5;
/// Default trailing window for the product trend, in days.
const DEFAULT_TREND_DAYS: u64 = 30;

fn today() -> NaiveDate {
  Utc::now().date_naive()
}

// ─── ABC ─────────────────────────────────────────────────────────────────────

/// `GET /analysis/abc` — same filter params as the dashboard.
pub async fn abc<S>(
  State(store): State<Arc<S>>,
  Query(filter): Query<SalesFilter>,
) -> Result<Json<Vec<AbcEntry>>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let sales = store
    .product_sales(filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(analytics::grade_abc(sales)))
}

// ─── Store analysis ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct StoreAnalysisParams {
  pub store_id:   Option<i64>,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct StoreAnalysis {
  pub weekly:     Vec<WeeklySales>,
  pub top_brands: Vec<TopBrand>,
}

/// `GET /analysis/store?store_id=...[&start_date=...][&end_date=...]`
pub async fn store_analysis<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<StoreAnalysisParams>,
) -> Result<Json<StoreAnalysis>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let store_id = params
    .store_id
    .ok_or_else(|| ApiError::BadRequest("store_id is required".to_owned()))?;
  let filter = SalesFilter {
    start_date: params.start_date,
    end_date: params.end_date,
    ..SalesFilter::default()
  };

  // The two sub-queries are independent; run them concurrently.
  let (weekly, top_brands) = tokio::join!(
    store.weekly_trend(store_id, filter),
    store.top_brands(store_id, filter, TOP_N),
  );

  Ok(Json(StoreAnalysis {
    weekly:     weekly.map_err(|e| ApiError::Store(Box::new(e)))?,
    top_brands: top_brands.map_err(|e| ApiError::Store(Box::new(e)))?,
  }))
}

// ─── Brand analysis ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct BrandAnalysisParams {
  pub brand_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BrandAnalysis {
  pub best_monthly:     Vec<BestSeller>,
  pub best_weekly:      Vec<BestSeller>,
  pub inventory_health: Vec<InventoryHealth>,
}

/// `GET /analysis/brand?brand_id=...`
///
/// Best sellers month-to-date and over the trailing week, plus the
/// inventory-health classification of every product of the brand.
pub async fn brand_analysis<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<BrandAnalysisParams>,
) -> Result<Json<BrandAnalysis>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let brand_id = params
    .brand_id
    .ok_or_else(|| ApiError::BadRequest("brand_id is required".to_owned()))?;

  let today = today();
  let month_start = today.with_day(1).unwrap_or(today);
  let week_start = today.checked_sub_days(Days::new(7)).unwrap_or(today);

  let (monthly, weekly, levels) = tokio::join!(
    store.best_sellers(brand_id, month_start, TOP_N),
    store.best_sellers(brand_id, week_start, TOP_N),
    store.inventory_levels(brand_id, today),
  );

  Ok(Json(BrandAnalysis {
    best_monthly:     monthly.map_err(|e| ApiError::Store(Box::new(e)))?,
    best_weekly:      weekly.map_err(|e| ApiError::Store(Box::new(e)))?,
    inventory_health: analytics::inventory_health(
      levels.map_err(|e| ApiError::Store(Box::new(e)))?,
    ),
  }))
}

// ─── Product trend ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ProductTrendParams {
  pub product_id: Option<i64>,
  pub days:       Option<u64>,
}

/// `GET /analysis/product/trend?product_id=...[&days=30]`
pub async fn product_trend<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ProductTrendParams>,
) -> Result<Json<Vec<ProductTrendPoint>>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let product_id = params
    .product_id
    .ok_or_else(|| ApiError::BadRequest("product_id is required".to_owned()))?;

  let today = today();
  let days = params.days.unwrap_or(DEFAULT_TREND_DAYS);
  let since = today.checked_sub_days(Days::new(days)).unwrap_or(today);

  let points = store
    .product_trend(product_id, since)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(points))
}
