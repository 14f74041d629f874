//! Typed rows returned by the aggregation engine.
//!
//! Every view returns a well-formed (possibly empty) structure — never a
//! partial shape. Derived ratios live in [`crate::analytics`]; the types
//! here carry plain grouped sums as the store computed them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Time series ─────────────────────────────────────────────────────────────

/// One day of the daily-trend view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
  pub date:            NaiveDate,
  pub total_amount:    i64,
  pub total_quantity:  i64,
  pub total_customers: i64,
}

/// One weekday bucket of the day-of-week pattern (0 = Sunday .. 6 = Saturday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdaySales {
  pub weekday:      u8,
  pub total_amount: i64,
  /// Number of facts contributing to the bucket.
  pub fact_count:   i64,
}

/// One week bucket of a store's weekly trend. The key is the zero-padded
/// week-of-year as the store's SQL engine renders it (`"00"`–`"53"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySales {
  pub week:         String,
  pub total_amount: i64,
}

/// One per-date point of a single product's sales trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTrendPoint {
  pub date:           NaiveDate,
  pub total_quantity: i64,
  pub total_amount:   i64,
}

// ─── Grouped pivots ──────────────────────────────────────────────────────────

/// One row of the pivot view, grouped by brand or store name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotRow {
  pub group_name:      String,
  pub total_amount:    i64,
  pub total_quantity:  i64,
  pub total_customers: i64,
}

/// One brand's total at a single store (top-brands view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopBrand {
  pub brand_id:     i64,
  pub name:         String,
  pub total_amount: i64,
}

/// One product's totals within a best-seller window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestSeller {
  pub product_id:     i64,
  pub name:           String,
  pub total_amount:   i64,
  pub total_quantity: i64,
}

// ─── Classification inputs ───────────────────────────────────────────────────

/// Per-product totals under the active filter — the input to ABC grading.
/// Rows arrive ordered by total amount descending, product id ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
  pub product_id:     i64,
  pub product_name:   String,
  pub barcode:        String,
  pub brand_name:     String,
  pub total_amount:   i64,
  pub total_quantity: i64,
}

/// A product's trailing 30-day sold quantity and current stock snapshot —
/// the input to inventory-health classification. `current_stock` is the
/// inventory of the most recent fact regardless of the 30-day window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
  pub product_id:    i64,
  pub product_name:  String,
  pub sold_30d:      i64,
  pub current_stock: i64,
}

/// A brand's all-time sold quantity and summed inventory snapshots — the
/// input to low-sell-through alerting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandVolume {
  pub brand_id:        i64,
  pub brand_name:      String,
  pub total_quantity:  i64,
  pub total_inventory: i64,
}

// ─── Single-row totals ───────────────────────────────────────────────────────

/// Grand totals under the active filter. Zero-row inputs sum to all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepTotals {
  pub total_amount:    i64,
  pub total_quantity:  i64,
  pub total_customers: i64,
  /// Summed current stock (latest snapshot, independent of the date
  /// filter) of the products appearing in the filtered fact set.
  pub total_inventory: i64,
}

// ─── Export contract ─────────────────────────────────────────────────────────

/// One raw joined row of the export-facing contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
  pub sale_date:    NaiveDate,
  pub store_name:   String,
  pub brand_name:   String,
  pub barcode:      String,
  pub product_name: String,
  pub quantity:     i64,
  pub amount:       i64,
}

/// Precomputed totals accompanying an export result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
  pub total_amount:   i64,
  pub total_quantity: i64,
}

impl ExportSummary {
  pub fn of(rows: &[ExportRow]) -> Self {
    Self {
      total_amount:   rows.iter().map(|r| r.amount).sum(),
      total_quantity: rows.iter().map(|r| r.quantity).sum(),
    }
  }
}
