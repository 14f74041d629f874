//! Encoding helpers between domain types and the plain-text representations
//! stored in SQLite columns, plus raw row structs for query results that
//! need decoding after they leave the connection thread.
//!
//! Dates are the only encoded type: ISO `YYYY-MM-DD` strings, which keeps
//! every date comparison in SQL lexicographic-safe.

use chrono::NaiveDate;
use tally_core::report::{DailySales, ExportRow, ProductTrendPoint};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a daily-trend group row.
pub struct RawDailySales {
  pub date:            String,
  pub total_amount:    i64,
  pub total_quantity:  i64,
  pub total_customers: i64,
}

impl RawDailySales {
  pub fn into_daily(self) -> Result<DailySales> {
    Ok(DailySales {
      date:            decode_date(&self.date)?,
      total_amount:    self.total_amount,
      total_quantity:  self.total_quantity,
      total_customers: self.total_customers,
    })
  }
}

/// Raw strings read directly from a product-trend group row.
pub struct RawTrendPoint {
  pub date:           String,
  pub total_quantity: i64,
  pub total_amount:   i64,
}

impl RawTrendPoint {
  pub fn into_point(self) -> Result<ProductTrendPoint> {
    Ok(ProductTrendPoint {
      date:           decode_date(&self.date)?,
      total_quantity: self.total_quantity,
      total_amount:   self.total_amount,
    })
  }
}

/// Raw strings read directly from an export join row.
pub struct RawExportRow {
  pub sale_date:    String,
  pub store_name:   String,
  pub brand_name:   String,
  pub barcode:      String,
  pub product_name: String,
  pub quantity:     i64,
  pub amount:       i64,
}

impl RawExportRow {
  pub fn into_row(self) -> Result<ExportRow> {
    Ok(ExportRow {
      sale_date:    decode_date(&self.sale_date)?,
      store_name:   self.store_name,
      brand_name:   self.brand_name,
      barcode:      self.barcode,
      product_name: self.product_name,
      quantity:     self.quantity,
      amount:       self.amount,
    })
  }
}
