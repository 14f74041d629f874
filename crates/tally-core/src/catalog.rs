//! Reference entities — brands, stores, and products.
//!
//! All three are append-only: rows are created on first sighting during
//! ingestion (insert-if-absent on their natural key) and never updated or
//! deleted afterwards.

use serde::{Deserialize, Serialize};

/// A brand, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
  pub id:   i64,
  pub name: String,
}

/// A retail store, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
  pub id:   i64,
  pub name: String,
}

/// A product, unique by barcode. Name and category are first-seen-wins:
/// later rows with the same barcode never overwrite them.
///
/// `brand_id` is an enforced foreign key resolved once at ingestion time;
/// a product whose brand cannot be resolved is never inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id:       i64,
  pub barcode:  String,
  pub name:     String,
  pub category: Option<String>,
  pub brand_id: i64,
}
