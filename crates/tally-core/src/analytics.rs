//! The classification engine and insight generator.
//!
//! Everything here is a pure function over aggregation output: ABC
//! revenue-contribution grading, inventory-health scoring, derived ratio
//! metrics, and the automated textual insights. Zero denominators resolve
//! to sentinel values, never to errors.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::report::{BrandVolume, DeepTotals, InventoryLevel, ProductSales};

// ─── Thresholds ──────────────────────────────────────────────────────────────

/// Rank percentile at or below which a product grades A.
const GRADE_A_PERCENTILE: f64 = 20.0;
/// Rank percentile at or below which a product grades B.
const GRADE_B_PERCENTILE: f64 = 50.0;
/// Days of coverage the target stock level represents.
const COVERAGE_DAYS: f64 = 30.0;
/// Stock below target × this factor classifies as Low.
const STOCK_LOW_FACTOR: f64 = 0.5;
/// Stock above target × this factor classifies as High.
const STOCK_HIGH_FACTOR: f64 = 2.0;
/// Month-over-month growth (percent) beyond which an insight is emitted.
const GROWTH_ALERT_PCT: f64 = 10.0;
/// Sell-through ratio below which a brand warning is emitted.
const SELL_THROUGH_ALERT_RATIO: f64 = 0.1;
/// Cap on emitted low-sell-through warnings.
const MAX_SELL_THROUGH_WARNINGS: usize = 3;

// ─── ABC grading ─────────────────────────────────────────────────────────────

/// Revenue-contribution tier of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbcGrade {
  A,
  B,
  C,
}

/// A product's totals with its assigned grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbcEntry {
  #[serde(flatten)]
  pub sales:           ProductSales,
  pub grade:           AbcGrade,
  /// 1-based rank over total product count, as a percentage.
  pub rank_percentile: f64,
}

/// Grade products by revenue-contribution rank.
///
/// Input rows must already be ordered by total amount descending (ties:
/// product id ascending, which the aggregation query guarantees). Empty
/// input yields an empty list.
pub fn grade_abc(rows: Vec<ProductSales>) -> Vec<AbcEntry> {
  let total = rows.len();
  rows
    .into_iter()
    .enumerate()
    .map(|(index, sales)| {
      let rank_percentile = (index + 1) as f64 / total as f64 * 100.0;
      let grade = if rank_percentile <= GRADE_A_PERCENTILE {
        AbcGrade::A
      } else if rank_percentile <= GRADE_B_PERCENTILE {
        AbcGrade::B
      } else {
        AbcGrade::C
      };
      AbcEntry { sales, grade, rank_percentile }
    })
    .collect()
}

// ─── Inventory health ────────────────────────────────────────────────────────

/// Stock position relative to the 30-day coverage target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
  Low,
  Optimal,
  High,
}

/// A product's inventory-health verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryHealth {
  pub product_id: i64,
  pub product:    String,
  pub stock:      i64,
  /// 30-day coverage target, rounded for display.
  pub target:     i64,
  pub status:     StockStatus,
}

/// Classify one stock level against its 30-day coverage target.
///
/// Boundary behavior is exact: stock equal to target × 0.5 or target × 2.0
/// is Optimal (the comparisons are strict). Zero sales give a zero target,
/// so any positive stock is High and zero stock is Optimal.
pub fn classify_stock(sold_30d: i64, stock: i64) -> StockStatus {
  let ads = sold_30d as f64 / COVERAGE_DAYS;
  let target = ads * COVERAGE_DAYS;
  let stock = stock as f64;
  if stock < target * STOCK_LOW_FACTOR {
    StockStatus::Low
  } else if stock > target * STOCK_HIGH_FACTOR {
    StockStatus::High
  } else {
    StockStatus::Optimal
  }
}

/// Classify every product of an inventory-levels result set.
pub fn inventory_health(levels: Vec<InventoryLevel>) -> Vec<InventoryHealth> {
  levels
    .into_iter()
    .map(|level| {
      let status = classify_stock(level.sold_30d, level.current_stock);
      InventoryHealth {
        product_id: level.product_id,
        product:    level.product_name,
        stock:      level.current_stock,
        // Target equals the trailing 30-day sold quantity by construction.
        target:     level.sold_30d,
        status,
      }
    })
    .collect()
}

// ─── Deep metrics ────────────────────────────────────────────────────────────

/// Grand totals plus derived ratios for the deep-metrics view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeepMetrics {
  pub total_amount:    i64,
  pub total_quantity:  i64,
  pub total_customers: i64,
  /// Average transaction value, rounded to a whole amount. 0 when there
  /// are no customers.
  pub atv:             i64,
  /// Units per transaction, 2 decimal places. 0 when there are no customers.
  pub upt:             f64,
  /// Sold fraction of available quantity, as a percentage with 1 decimal
  /// place. 0 when nothing was sold and nothing is on hand.
  pub sell_through:    f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  (value * factor).round() / factor
}

/// Derive the ratio metrics from grand totals.
pub fn deep_metrics(totals: DeepTotals) -> DeepMetrics {
  let customers = totals.total_customers;
  let available = totals.total_quantity + totals.total_inventory;

  let atv = if customers > 0 {
    (totals.total_amount as f64 / customers as f64).round() as i64
  } else {
    0
  };
  let upt = if customers > 0 {
    round_to(totals.total_quantity as f64 / customers as f64, 2)
  } else {
    0.0
  };
  let sell_through = if available > 0 {
    round_to(totals.total_quantity as f64 / available as f64 * 100.0, 1)
  } else {
    0.0
  };

  DeepMetrics {
    total_amount: totals.total_amount,
    total_quantity: totals.total_quantity,
    total_customers: totals.total_customers,
    atv,
    upt,
    sell_through,
  }
}

// ─── Insights ────────────────────────────────────────────────────────────────

/// Sentiment of an automated insight message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
  Positive,
  Negative,
  Warning,
}

/// One automated insight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
  pub kind:    InsightKind,
  pub message: String,
}

/// The two date spans compared by the month-over-month insight, both ends
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindows {
  pub current:  (NaiveDate, NaiveDate),
  pub previous: (NaiveDate, NaiveDate),
}

/// Month-to-date window for `today`, and the equivalent day span of the
/// prior calendar month. The prior span's end clamps to the prior month's
/// last day (Mar 30 compares against Feb 1..=28/29).
pub fn month_windows(today: NaiveDate) -> MonthWindows {
  let month_start = today.with_day(1).unwrap_or(today);
  let prev_last = month_start.pred_opt().unwrap_or(month_start);
  let prev_start = prev_last.with_day(1).unwrap_or(prev_last);
  let prev_end = prev_start
    .with_day(today.day().min(prev_last.day()))
    .unwrap_or(prev_last);

  MonthWindows {
    current:  (month_start, today),
    previous: (prev_start, prev_end),
  }
}

/// Month-over-month growth insight. Only computed when the prior window had
/// revenue; emits nothing for growth within ±10%.
pub fn month_over_month_insight(
  this_month: i64,
  last_month: i64,
) -> Option<Insight> {
  if last_month <= 0 {
    return None;
  }
  let growth =
    (this_month - last_month) as f64 / last_month as f64 * 100.0;
  if growth > GROWTH_ALERT_PCT {
    Some(Insight {
      kind:    InsightKind::Positive,
      message: format!(
        "Sales are up {growth:.1}% on the same days last month."
      ),
    })
  } else if growth < -GROWTH_ALERT_PCT {
    Some(Insight {
      kind:    InsightKind::Negative,
      message: format!(
        "Sales are down {:.1}% on the same days last month; worth a closer look.",
        growth.abs()
      ),
    })
  } else {
    None
  }
}

/// Low-sell-through warnings, at most three, brands visited in the order
/// given (the store returns them brand-id ascending). A brand with zero
/// sold and zero inventory has an undefined ratio and is skipped.
pub fn low_sell_through_warnings(volumes: &[BrandVolume]) -> Vec<Insight> {
  volumes
    .iter()
    .filter_map(|volume| {
      let available = volume.total_quantity + volume.total_inventory;
      if available <= 0 {
        return None;
      }
      let ratio = volume.total_quantity as f64 / available as f64;
      (ratio < SELL_THROUGH_ALERT_RATIO).then(|| Insight {
        kind:    InsightKind::Warning,
        message: format!(
          "[{}] sell-through is below 10% of available stock; consider a promotion.",
          volume.brand_name
        ),
      })
    })
    .take(MAX_SELL_THROUGH_WARNINGS)
    .collect()
}

/// Assemble the full insight list: the MoM message first (if any), then the
/// low-sell-through warnings.
pub fn insights(
  this_month: i64,
  last_month: i64,
  volumes: &[BrandVolume],
) -> Vec<Insight> {
  let mut out = Vec::new();
  out.extend(month_over_month_insight(this_month, last_month));
  out.extend(low_sell_through_warnings(volumes));
  out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn product(id: i64, amount: i64) -> ProductSales {
    ProductSales {
      product_id:     id,
      product_name:   format!("Product {id}"),
      barcode:        format!("{id:03}"),
      brand_name:     "Acme".to_owned(),
      total_amount:   amount,
      total_quantity: 1,
    }
  }

  fn volume(id: i64, qty: i64, inv: i64) -> BrandVolume {
    BrandVolume {
      brand_id:        id,
      brand_name:      format!("Brand {id}"),
      total_quantity:  qty,
      total_inventory: inv,
    }
  }

  // ── ABC grading ───────────────────────────────────────────────────────────

  #[test]
  fn abc_partitions_ten_products_two_three_five() {
    let rows: Vec<_> = (1..=10).map(|i| product(i, 1000 - i * 10)).collect();
    let graded = grade_abc(rows);

    let count = |g: AbcGrade| graded.iter().filter(|e| e.grade == g).count();
    assert_eq!(count(AbcGrade::A), 2);
    assert_eq!(count(AbcGrade::B), 3);
    assert_eq!(count(AbcGrade::C), 5);
    assert_eq!(graded.len(), 10);

    let max_a = graded
      .iter()
      .filter(|e| e.grade == AbcGrade::A)
      .map(|e| e.rank_percentile)
      .fold(0.0, f64::max);
    assert!(max_a <= 20.0);
  }

  #[test]
  fn abc_empty_input_is_empty_output() {
    assert!(grade_abc(Vec::new()).is_empty());
  }

  #[test]
  fn abc_single_product_grades_c() {
    // One product is 100% of the rank distribution.
    let graded = grade_abc(vec![product(1, 500)]);
    assert_eq!(graded[0].grade, AbcGrade::C);
    assert_eq!(graded[0].rank_percentile, 100.0);
  }

  // ── Inventory health ──────────────────────────────────────────────────────

  #[test]
  fn stock_at_half_target_is_optimal() {
    // target = sold_30d = 10; 5 is not strictly below 5.0.
    assert_eq!(classify_stock(10, 5), StockStatus::Optimal);
    assert_eq!(classify_stock(10, 4), StockStatus::Low);
  }

  #[test]
  fn stock_at_double_target_is_optimal() {
    assert_eq!(classify_stock(10, 20), StockStatus::Optimal);
    assert_eq!(classify_stock(10, 21), StockStatus::High);
  }

  #[test]
  fn zero_sales_positive_stock_is_high() {
    assert_eq!(classify_stock(0, 1), StockStatus::High);
    assert_eq!(classify_stock(0, 0), StockStatus::Optimal);
  }

  #[test]
  fn inventory_health_carries_sold_quantity_as_target() {
    let verdicts = inventory_health(vec![InventoryLevel {
      product_id:    7,
      product_name:  "Widget".to_owned(),
      sold_30d:      30,
      current_stock: 12,
    }]);
    assert_eq!(verdicts[0].target, 30);
    assert_eq!(verdicts[0].status, StockStatus::Low);
  }

  // ── Deep metrics ──────────────────────────────────────────────────────────

  #[test]
  fn deep_metrics_scenario_numbers() {
    let metrics = deep_metrics(DeepTotals {
      total_amount:    8000,
      total_quantity:  8,
      total_customers: 3,
      total_inventory: 97,
    });
    assert_eq!(metrics.atv, 2667);
    assert_eq!(metrics.upt, 2.67);
    assert_eq!(metrics.sell_through, 7.6);
  }

  #[test]
  fn deep_metrics_zero_denominators_are_zero() {
    let metrics = deep_metrics(DeepTotals::default());
    assert_eq!(metrics.atv, 0);
    assert_eq!(metrics.upt, 0.0);
    assert_eq!(metrics.sell_through, 0.0);
  }

  // ── Month-over-month ──────────────────────────────────────────────────────

  #[test]
  fn month_windows_clamp_to_prior_month_length() {
    let windows =
      month_windows(NaiveDate::from_ymd_opt(2024, 3, 30).unwrap());
    assert_eq!(
      windows.current,
      (
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 30).unwrap()
      )
    );
    // February 2024 has 29 days; the span end clamps.
    assert_eq!(
      windows.previous,
      (
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
      )
    );
  }

  #[test]
  fn mom_suppressed_without_prior_revenue() {
    assert!(month_over_month_insight(123_456, 0).is_none());
  }

  #[test]
  fn mom_quiet_inside_ten_percent_band() {
    assert!(month_over_month_insight(110, 100).is_none());
    assert!(month_over_month_insight(90, 100).is_none());
  }

  #[test]
  fn mom_messages_fire_beyond_band() {
    let up = month_over_month_insight(115, 100).unwrap();
    assert_eq!(up.kind, InsightKind::Positive);
    assert!(up.message.contains("15.0%"), "{}", up.message);

    let down = month_over_month_insight(85, 100).unwrap();
    assert_eq!(down.kind, InsightKind::Negative);
    assert!(down.message.contains("15.0%"), "{}", down.message);
  }

  // ── Low sell-through ──────────────────────────────────────────────────────

  #[test]
  fn low_sell_through_caps_at_three_warnings() {
    let volumes: Vec<_> = (1..=5).map(|i| volume(i, 1, 100)).collect();
    let warnings = low_sell_through_warnings(&volumes);
    assert_eq!(warnings.len(), 3);
    assert!(warnings[0].message.contains("Brand 1"));
  }

  #[test]
  fn sell_through_boundary_and_empty_brands() {
    // Exactly 10% is not below the threshold.
    assert!(low_sell_through_warnings(&[volume(1, 10, 90)]).is_empty());
    // Undefined ratio (nothing sold, nothing on hand) is skipped.
    assert!(low_sell_through_warnings(&[volume(1, 0, 0)]).is_empty());
    // Zero sold with stock on hand is 0% and fires.
    assert_eq!(low_sell_through_warnings(&[volume(1, 0, 50)]).len(), 1);
  }

  #[test]
  fn insight_order_is_mom_then_warnings() {
    let all = insights(200, 100, &[volume(1, 1, 100)]);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].kind, InsightKind::Positive);
    assert_eq!(all[1].kind, InsightKind::Warning);
  }
}
