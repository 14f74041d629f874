//! Handler for `POST /ingest`.
//!
//! The body is a JSON array of raw extract rows. Invalid rows are skipped;
//! a referential failure rolls the whole batch back and surfaces as one
//! batch-level error.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use tally_core::{ingest::RawRow, store::SalesStore};

use crate::error::ApiError;

/// Response body: how many facts the batch produced.
#[derive(Debug, Serialize)]
pub struct IngestReceipt {
  pub accepted: usize,
}

/// `POST /ingest` — body: `[{"date": ..., "store": ..., ...}, ...]`.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Json(rows): Json<Vec<RawRow>>,
) -> Result<Json<IngestReceipt>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let accepted = store
    .ingest(rows)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(IngestReceipt { accepted }))
}
