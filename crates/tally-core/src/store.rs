//! The `SalesStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! Higher layers (`tally-api`, `tally-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  catalog::{Brand, Store},
  ingest::RawRow,
  report::{
    BestSeller, BrandVolume, DailySales, DeepTotals, ExportRow,
    InventoryLevel, PivotRow, ProductSales, ProductTrendPoint, TopBrand,
    WeekdaySales, WeeklySales,
  },
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// The shared filter set for aggregate views. Every present predicate is
/// ANDed; date bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesFilter {
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
  pub brand_id:   Option<i64>,
  pub store_id:   Option<i64>,
}

impl SalesFilter {
  /// A date-only view of this filter (for views where brand/store axes are
  /// fixed by their own parameters).
  pub fn dates_only(&self) -> Self {
    Self {
      start_date: self.start_date,
      end_date:   self.end_date,
      ..Self::default()
    }
  }
}

/// Grouping axis for the pivot view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotBy {
  #[default]
  Brand,
  Store,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a sales analytics store backend.
///
/// Reference data and facts are append-only; there are no update or delete
/// operations. Reads are pure functions of committed state.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SalesStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Ingest one batch: normalize reference entities (insert-if-absent, in
  /// the order brands, stores, products) and insert one fact per valid
  /// row, all inside a single transaction. Invalid rows are skipped; an
  /// unresolvable brand/store/product aborts and rolls back the whole
  /// batch. Returns the number of facts inserted.
  fn ingest(
    &self,
    rows: Vec<RawRow>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reference data ────────────────────────────────────────────────────

  /// All brands, ordered by name.
  fn list_brands(
    &self,
  ) -> impl Future<Output = Result<Vec<Brand>, Self::Error>> + Send + '_;

  /// All stores, ordered by name.
  fn list_stores(
    &self,
  ) -> impl Future<Output = Result<Vec<Store>, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  /// Per-day sums under the filter, date descending, most recent 30 days.
  fn daily_trend(
    &self,
    filter: SalesFilter,
  ) -> impl Future<Output = Result<Vec<DailySales>, Self::Error>> + Send + '_;

  /// Per-weekday sums under the filter (0 = Sunday), weekday ascending.
  fn weekday_pattern(
    &self,
    filter: SalesFilter,
  ) -> impl Future<Output = Result<Vec<WeekdaySales>, Self::Error>> + Send + '_;

  /// Sums grouped by brand or store name, total amount descending.
  fn pivot(
    &self,
    by: PivotBy,
    filter: SalesFilter,
  ) -> impl Future<Output = Result<Vec<PivotRow>, Self::Error>> + Send + '_;

  /// Grand totals under the filter. Zero rows sum to all zeros.
  fn deep_totals(
    &self,
    filter: SalesFilter,
  ) -> impl Future<Output = Result<DeepTotals, Self::Error>> + Send + '_;

  /// Per-product totals under the filter, ordered by total amount
  /// descending then product id ascending — the ABC grading input.
  fn product_sales(
    &self,
    filter: SalesFilter,
  ) -> impl Future<Output = Result<Vec<ProductSales>, Self::Error>> + Send + '_;

  /// Per-week amount sums for one store, week ascending.
  fn weekly_trend(
    &self,
    store_id: i64,
    filter: SalesFilter,
  ) -> impl Future<Output = Result<Vec<WeeklySales>, Self::Error>> + Send + '_;

  /// Best-performing brands at one store, amount descending.
  fn top_brands(
    &self,
    store_id: i64,
    filter: SalesFilter,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<TopBrand>, Self::Error>> + Send + '_;

  /// Best-selling products of one brand since `since` (inclusive), amount
  /// descending.
  fn best_sellers(
    &self,
    brand_id: i64,
    since: NaiveDate,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<BestSeller>, Self::Error>> + Send + '_;

  /// Per-product trailing 30-day sold quantity (window ending at `as_of`)
  /// and current stock snapshot, for every product of one brand.
  fn inventory_levels(
    &self,
    brand_id: i64,
    as_of: NaiveDate,
  ) -> impl Future<Output = Result<Vec<InventoryLevel>, Self::Error>> + Send + '_;

  /// Per-date sums for one product since `since` (inclusive), date
  /// ascending.
  fn product_trend(
    &self,
    product_id: i64,
    since: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ProductTrendPoint>, Self::Error>> + Send + '_;

  /// Total amount over an inclusive date range — the month-over-month
  /// input.
  fn amount_in_range(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// All-time per-brand sold quantity and summed inventory snapshots,
  /// brand id ascending — the low-sell-through input.
  fn brand_volumes(
    &self,
  ) -> impl Future<Output = Result<Vec<BrandVolume>, Self::Error>> + Send + '_;

  // ── Export ────────────────────────────────────────────────────────────

  /// Raw joined rows for the export collaborator, optionally restricted to
  /// one brand; date then insertion order ascending.
  fn export_rows(
    &self,
    brand_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<ExportRow>, Self::Error>> + Send + '_;
}
