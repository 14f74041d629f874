//! Error types for `tally-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A product's brand name could not be resolved during ingestion.
  /// This aborts the whole batch (referential errors are never partial).
  #[error("brand not found: {0:?}")]
  BrandNotResolved(String),

  /// A fact's store name could not be resolved during ingestion.
  #[error("store not found: {0:?}")]
  StoreNotResolved(String),

  /// A fact's barcode did not resolve to a product during ingestion.
  #[error("product not found for barcode: {0:?}")]
  ProductNotResolved(String),

  #[error("invalid date: {0:?}")]
  InvalidDate(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
