//! Ingestion row model, validity rules, and batch normalization.
//!
//! A raw row is one line of a periodic sales extract, already lifted out of
//! whatever transport delivered it (file upload and spreadsheet parsing are
//! collaborators, not part of this crate). This module decides which rows
//! are worth keeping, converts spreadsheet date serials to calendar dates,
//! and reduces a batch to the distinct reference entities it mentions.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer};

// ─── Date handling ───────────────────────────────────────────────────────────

/// Day 0 of the spreadsheet date-serial scheme.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Accepted string layouts for date fields. The first is canonical; the
/// others show up in hand-edited extracts.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// A date cell as it arrives from the source: either a numeric spreadsheet
/// serial or a date string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DateField {
  Serial(f64),
  Text(String),
}

/// Convert a spreadsheet date serial to a calendar date.
///
/// Fractional serials carry a time-of-day component; only the date part is
/// kept. Returns `None` for serials outside the representable range.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
  let days = serial.floor();
  if !days.is_finite() || days < 0.0 {
    return None;
  }
  let (y, m, d) = SERIAL_EPOCH;
  NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(days as u64))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
  let trimmed = text.trim();
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

impl DateField {
  /// Resolve to a calendar date, or `None` when the cell is not a date at
  /// all. Header rows carry a column label here and fail this check — that
  /// is the whole header-detection mechanism, no sentinel strings involved.
  pub fn resolve(&self) -> Option<NaiveDate> {
    match self {
      Self::Serial(serial) => date_from_serial(*serial),
      Self::Text(text) => parse_date_text(text),
    }
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Accept numbers that arrive as JSON numbers, numeric strings, or nothing
/// at all. Unparseable or missing values become 0 — source extracts leave
/// numeric cells blank routinely and a blank cell is not an error.
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
  }

  Ok(match Option::<Cell>::deserialize(deserializer)? {
    Some(Cell::Int(n)) => n,
    Some(Cell::Float(f)) if f.is_finite() => f.round() as i64,
    Some(Cell::Float(_)) => 0,
    Some(Cell::Text(s)) => {
      let t = s.trim();
      t.parse::<i64>()
        .ok()
        .or_else(|| t.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        .unwrap_or(0)
    }
    None => 0,
  })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// One line of a sales extract, exactly as the transport hands it over.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
  #[serde(default)]
  pub date:      Option<DateField>,
  #[serde(default)]
  pub store:     Option<String>,
  #[serde(default)]
  pub brand:     Option<String>,
  #[serde(default)]
  pub barcode:   Option<String>,
  #[serde(default)]
  pub product:   Option<String>,
  #[serde(default, deserialize_with = "lenient_i64")]
  pub quantity:  i64,
  #[serde(default, deserialize_with = "lenient_i64")]
  pub amount:    i64,
  #[serde(default, deserialize_with = "lenient_i64")]
  pub customers: i64,
  #[serde(default, deserialize_with = "lenient_i64")]
  pub inventory: i64,
  #[serde(default)]
  pub category:  Option<String>,
}

impl RawRow {
  /// The row's calendar date, if its date cell resolves to one.
  pub fn sale_date(&self) -> Option<NaiveDate> {
    self.date.as_ref().and_then(DateField::resolve)
  }

  /// A row is ingestible iff it has a resolvable date, a store name, and a
  /// barcode. Anything else (header rows, ruler lines, trailing blanks) is
  /// skipped without failing the batch.
  pub fn is_valid(&self) -> bool {
    self.sale_date().is_some()
      && non_empty(&self.store).is_some()
      && non_empty(&self.barcode).is_some()
  }
}

// ─── Batch normalization ─────────────────────────────────────────────────────

/// A product as first sighted within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSeed {
  pub barcode:  String,
  pub name:     String,
  pub category: Option<String>,
  /// Brand name to resolve at insert time. May be empty when the source row
  /// had no brand — the insert then fails closed and aborts the batch.
  pub brand:    String,
}

/// A fact ready for insertion, still keyed by natural names. Store and
/// product ids are resolved inside the ingestion transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactSeed {
  pub sale_date: NaiveDate,
  pub store:     String,
  pub barcode:   String,
  pub quantity:  i64,
  pub amount:    i64,
  pub customers: i64,
  pub inventory: i64,
}

/// The distinct reference entities and the fact rows of one batch, in the
/// order they must be inserted: brands, stores, products, facts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
  pub brands:   Vec<String>,
  pub stores:   Vec<String>,
  pub products: Vec<ProductSeed>,
  pub facts:    Vec<FactSeed>,
}

impl NormalizedBatch {
  /// Reduce a batch to its distinct entities. First sighting wins for
  /// product attributes; invalid rows contribute nothing.
  pub fn from_rows(rows: &[RawRow]) -> Self {
    let mut batch = NormalizedBatch::default();

    for row in rows {
      let Some(sale_date) = row.sale_date() else { continue };
      let (Some(store), Some(barcode)) =
        (non_empty(&row.store), non_empty(&row.barcode))
      else {
        continue;
      };

      if let Some(brand) = non_empty(&row.brand)
        && !batch.brands.iter().any(|b| b == brand)
      {
        batch.brands.push(brand.to_owned());
      }
      if !batch.stores.iter().any(|s| s == store) {
        batch.stores.push(store.to_owned());
      }
      if !batch.products.iter().any(|p| p.barcode == barcode) {
        batch.products.push(ProductSeed {
          barcode:  barcode.to_owned(),
          name:     non_empty(&row.product).unwrap_or_default().to_owned(),
          category: non_empty(&row.category).map(str::to_owned),
          brand:    non_empty(&row.brand).unwrap_or_default().to_owned(),
        });
      }

      batch.facts.push(FactSeed {
        sale_date,
        store: store.to_owned(),
        barcode: barcode.to_owned(),
        quantity: row.quantity,
        amount: row.amount,
        customers: row.customers,
        inventory: row.inventory,
      });
    }

    batch
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn text_row(date: &str, store: &str, brand: &str, barcode: &str) -> RawRow {
    RawRow {
      date: Some(DateField::Text(date.to_owned())),
      store: Some(store.to_owned()),
      brand: Some(brand.to_owned()),
      barcode: Some(barcode.to_owned()),
      product: Some("Widget".to_owned()),
      ..RawRow::default()
    }
  }

  #[test]
  fn serial_44927_is_last_day_of_2022() {
    assert_eq!(
      date_from_serial(44927.0),
      NaiveDate::from_ymd_opt(2022, 12, 31)
    );
  }

  #[test]
  fn fractional_serial_keeps_date_part() {
    // 18:00 on the same day.
    assert_eq!(
      date_from_serial(44927.75),
      NaiveDate::from_ymd_opt(2022, 12, 31)
    );
  }

  #[test]
  fn negative_serial_is_rejected() {
    assert_eq!(date_from_serial(-1.0), None);
  }

  #[test]
  fn header_row_fails_date_validation() {
    // A header row carries the column label where the date should be.
    // Localized labels fail identically — no sentinel comparison anywhere.
    for label in ["Date", "날짜", "fecha"] {
      let row = text_row(label, "Gangnam", "Acme", "111");
      assert!(!row.is_valid(), "label {label:?} must not validate");
    }
  }

  #[test]
  fn missing_store_or_barcode_invalidates_row() {
    let mut row = text_row("2024-01-01", "Gangnam", "Acme", "111");
    assert!(row.is_valid());

    row.store = Some("  ".to_owned());
    assert!(!row.is_valid());

    row.store = Some("Gangnam".to_owned());
    row.barcode = None;
    assert!(!row.is_valid());
  }

  #[test]
  fn alternate_date_separators_parse() {
    for text in ["2024-01-02", "2024/01/02", "2024.01.02"] {
      let row = text_row(text, "Gangnam", "Acme", "111");
      assert_eq!(row.sale_date(), NaiveDate::from_ymd_opt(2024, 1, 2));
    }
  }

  #[test]
  fn lenient_numbers_default_to_zero() {
    let row: RawRow = serde_json::from_str(
      r#"{
        "date": "2024-01-01", "store": "Gangnam", "brand": "Acme",
        "barcode": "111", "product": "Widget",
        "quantity": "5", "amount": "not a number", "inventory": 12.6
      }"#,
    )
    .unwrap();

    assert_eq!(row.quantity, 5);
    assert_eq!(row.amount, 0);
    assert_eq!(row.customers, 0);
    assert_eq!(row.inventory, 13);
  }

  #[test]
  fn batch_dedupes_entities_first_seen_wins() {
    let mut second = text_row("2024-01-02", "Gangnam", "Acme", "111");
    second.product = Some("Widget v2".to_owned());

    let rows = vec![
      text_row("2024-01-01", "Gangnam", "Acme", "111"),
      second,
      text_row("2024-01-02", "Mapo", "Acme", "222"),
    ];
    let batch = NormalizedBatch::from_rows(&rows);

    assert_eq!(batch.brands, ["Acme"]);
    assert_eq!(batch.stores, ["Gangnam", "Mapo"]);
    assert_eq!(batch.products.len(), 2);
    // First sighting of barcode 111 fixed the name.
    assert_eq!(batch.products[0].name, "Widget");
    assert_eq!(batch.facts.len(), 3);
  }

  #[test]
  fn invalid_rows_contribute_nothing() {
    let rows = vec![
      text_row("Date", "Gangnam", "Acme", "111"),
      RawRow::default(),
      text_row("2024-01-01", "Gangnam", "Acme", "111"),
    ];
    let batch = NormalizedBatch::from_rows(&rows);

    assert_eq!(batch.facts.len(), 1);
    assert_eq!(batch.brands.len(), 1);
  }
}
