//! Handler for `GET /meta` — reference data for filter population.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use tally_core::{
  catalog::{Brand, Store},
  store::SalesStore,
};

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct Meta {
  pub brands: Vec<Brand>,
  pub stores: Vec<Store>,
}

/// `GET /meta`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Meta>, ApiError>
where
  S: SalesStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let (brands, stores) =
    tokio::join!(store.list_brands(), store.list_stores());

  Ok(Json(Meta {
    brands: brands.map_err(|e| ApiError::Store(Box::new(e)))?,
    stores: stores.map_err(|e| ApiError::Store(Box::new(e)))?,
  }))
}
