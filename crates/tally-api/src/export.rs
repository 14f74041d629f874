//! Handler for `GET /export/brand` — the export-facing contract.
//!
//! Returns raw joined rows plus precomputed totals; rendering them into a
//! downloadable file is the export collaborator's job.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tally_core::{
  report::{ExportRow, ExportSummary},
  store::SalesStore,
};

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
  pub brand_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ExportReport {
  pub summary: ExportSummary,
  pub rows:    Vec<ExportRow>,
}

/// `GET /export/brand[?brand_id=...]`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ExportParams>,
) -> Result<Json<ExportReport>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = store
    .export_rows(params.brand_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let summary = ExportSummary::of(&rows);
  Ok(Json(ExportReport { summary, rows }))
}
