//! Sale facts — the ground truth every metric derives from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One immutable recorded sales event (date × store × product).
///
/// Multiple facts may share a (date, store, product) key when the source
/// extract contains repeated lines; no dedup happens at this level.
/// Corrections arrive as new ingestions, never as updates in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleFact {
  pub id:             i64,
  pub sale_date:      NaiveDate,
  pub store_id:       i64,
  pub product_id:     i64,
  pub quantity:       i64,
  pub amount:         i64,
  pub customer_count: i64,
  /// Snapshot of stock-on-hand as of this row, not a delta. "Current stock"
  /// for a product is the inventory of its most-recently-dated fact.
  pub inventory:      i64,
}
