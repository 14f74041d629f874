//! [`SqliteStore`] — the SQLite implementation of [`SalesStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value};

use tally_core::{
  catalog::{Brand, Store},
  ingest::{FactSeed, NormalizedBatch, RawRow},
  report::{
    BestSeller, BrandVolume, DailySales, DeepTotals, ExportRow,
    InventoryLevel, PivotRow, ProductSales, ProductTrendPoint, TopBrand,
    WeekdaySales, WeeklySales,
  },
  store::{PivotBy, SalesFilter, SalesStore},
};

use crate::{
  Error, Result,
  encode::{RawDailySales, RawExportRow, RawTrendPoint, encode_date},
  error::lift,
  schema::SCHEMA,
};

// ─── Filter compilation ──────────────────────────────────────────────────────

/// Compile a [`SalesFilter`] to a `WHERE` clause and its bind values.
///
/// `joined` selects column spellings: queries joined to products/brands
/// filter `p.brand_id` directly, bare `sales` queries go through a barcode
/// subselect, exactly like the grouped views expect.
fn filter_sql(filter: &SalesFilter, joined: bool) -> (String, Vec<Value>) {
  let mut conds: Vec<String> = Vec::new();
  let mut binds: Vec<Value> = Vec::new();
  let date_col = if joined { "s.sale_date" } else { "sale_date" };

  if let Some(start) = filter.start_date {
    conds.push(format!("{date_col} >= ?"));
    binds.push(Value::Text(encode_date(start)));
  }
  if let Some(end) = filter.end_date {
    conds.push(format!("{date_col} <= ?"));
    binds.push(Value::Text(encode_date(end)));
  }
  if let Some(brand_id) = filter.brand_id {
    if joined {
      conds.push("p.brand_id = ?".to_owned());
    } else {
      conds.push(
        "product_id IN (SELECT id FROM products WHERE brand_id = ?)"
          .to_owned(),
      );
    }
    binds.push(Value::Integer(brand_id));
  }
  if let Some(store_id) = filter.store_id {
    conds.push(if joined { "s.store_id = ?" } else { "store_id = ?" }.to_owned());
    binds.push(Value::Integer(store_id));
  }

  let clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (clause, binds)
}

// ─── Ingestion helpers ───────────────────────────────────────────────────────

/// Wrap a domain error so it can cross the connection-thread boundary.
fn referential(err: tally_core::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(err))
}

/// Insert-if-absent reference rows in dependency order: brands first, then
/// stores, then products (whose brand linkage resolves by name lookup in
/// the same transaction — brands inserted a moment ago are visible).
fn insert_reference_rows(
  tx: &rusqlite::Transaction<'_>,
  batch: &NormalizedBatch,
) -> std::result::Result<(), tokio_rusqlite::Error> {
  let mut insert_brand =
    tx.prepare("INSERT OR IGNORE INTO brands (name) VALUES (?1)")?;
  for name in &batch.brands {
    insert_brand.execute(params![name])?;
  }

  let mut insert_store =
    tx.prepare("INSERT OR IGNORE INTO stores (name) VALUES (?1)")?;
  for name in &batch.stores {
    insert_store.execute(params![name])?;
  }

  let mut find_brand = tx.prepare("SELECT id FROM brands WHERE name = ?1")?;
  let mut insert_product = tx.prepare(
    "INSERT OR IGNORE INTO products (barcode, name, category, brand_id)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for seed in &batch.products {
    let brand_id: i64 = find_brand
      .query_row(params![seed.brand], |row| row.get(0))
      .optional()?
      .ok_or_else(|| {
        referential(tally_core::Error::BrandNotResolved(seed.brand.clone()))
      })?;
    insert_product.execute(params![
      seed.barcode,
      seed.name,
      seed.category,
      brand_id
    ])?;
  }

  Ok(())
}

/// Insert one fact per seed, resolving store and product ids. A failed
/// resolution aborts the batch (the caller's transaction rolls back).
fn insert_facts(
  tx: &rusqlite::Transaction<'_>,
  facts: &[FactSeed],
) -> std::result::Result<usize, tokio_rusqlite::Error> {
  let mut find_store = tx.prepare("SELECT id FROM stores WHERE name = ?1")?;
  let mut find_product =
    tx.prepare("SELECT id FROM products WHERE barcode = ?1")?;
  let mut insert_fact = tx.prepare(
    "INSERT INTO sales
       (sale_date, store_id, product_id, quantity, amount, customer_count, inventory)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
  )?;

  for seed in facts {
    let store_id: i64 = find_store
      .query_row(params![seed.store], |row| row.get(0))
      .optional()?
      .ok_or_else(|| {
        referential(tally_core::Error::StoreNotResolved(seed.store.clone()))
      })?;
    let product_id: i64 = find_product
      .query_row(params![seed.barcode], |row| row.get(0))
      .optional()?
      .ok_or_else(|| {
        referential(tally_core::Error::ProductNotResolved(
          seed.barcode.clone(),
        ))
      })?;

    insert_fact.execute(params![
      encode_date(seed.sale_date),
      store_id,
      product_id,
      seed.quantity,
      seed.amount,
      seed.customers,
      seed.inventory,
    ])?;
  }

  Ok(facts.len())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally sales store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SalesStore impl ─────────────────────────────────────────────────────────

impl SalesStore for SqliteStore {
  type Error = Error;

  // ── Ingestion ─────────────────────────────────────────────────────────────

  async fn ingest(&self, rows: Vec<RawRow>) -> Result<usize> {
    let batch = NormalizedBatch::from_rows(&rows);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_reference_rows(&tx, &batch)?;
        let inserted = insert_facts(&tx, &batch.facts)?;
        tx.commit()?;
        Ok(inserted)
      })
      .await
      .map_err(lift)
  }

  // ── Reference data ────────────────────────────────────────────────────────

  async fn list_brands(&self) -> Result<Vec<Brand>> {
    let brands = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, name FROM brands ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Brand { id: row.get(0)?, name: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(brands)
  }

  async fn list_stores(&self) -> Result<Vec<Store>> {
    let stores = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, name FROM stores ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Store { id: row.get(0)?, name: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(stores)
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn daily_trend(&self, filter: SalesFilter) -> Result<Vec<DailySales>> {
    let (clause, binds) = filter_sql(&filter, false);

    let raws: Vec<RawDailySales> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT sale_date,
                  SUM(amount), SUM(quantity), SUM(customer_count)
           FROM sales
           {clause}
           GROUP BY sale_date
           ORDER BY sale_date DESC
           LIMIT 30"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), |row| {
            Ok(RawDailySales {
              date:            row.get(0)?,
              total_amount:    row.get(1)?,
              total_quantity:  row.get(2)?,
              total_customers: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDailySales::into_daily).collect()
  }

  async fn weekday_pattern(
    &self,
    filter: SalesFilter,
  ) -> Result<Vec<WeekdaySales>> {
    let (clause, binds) = filter_sql(&filter, false);

    let rows = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT CAST(strftime('%w', sale_date) AS INTEGER) AS weekday,
                  SUM(amount),
                  COUNT(DISTINCT id)
           FROM sales
           {clause}
           GROUP BY weekday
           ORDER BY weekday ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), |row| {
            Ok(WeekdaySales {
              weekday:      row.get::<_, i64>(0)? as u8,
              total_amount: row.get(1)?,
              fact_count:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn pivot(
    &self,
    by: PivotBy,
    filter: SalesFilter,
  ) -> Result<Vec<PivotRow>> {
    let (clause, binds) = filter_sql(&filter, true);
    let group_col = match by {
      PivotBy::Brand => "b.name",
      PivotBy::Store => "st.name",
    };

    let rows = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {group_col} AS group_name,
                  SUM(s.amount)         AS total_amount,
                  SUM(s.quantity),
                  SUM(s.customer_count)
           FROM sales s
           JOIN stores st  ON s.store_id = st.id
           JOIN products p ON s.product_id = p.id
           JOIN brands b   ON p.brand_id = b.id
           {clause}
           GROUP BY group_name
           ORDER BY total_amount DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), |row| {
            Ok(PivotRow {
              group_name:      row.get(0)?,
              total_amount:    row.get(1)?,
              total_quantity:  row.get(2)?,
              total_customers: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn deep_totals(&self, filter: SalesFilter) -> Result<DeepTotals> {
    let (clause, binds) = filter_sql(&filter, false);

    let totals = self
      .conn
      .call(move |conn| {
        let sums_sql = format!(
          "SELECT COALESCE(SUM(amount), 0),
                  COALESCE(SUM(quantity), 0),
                  COALESCE(SUM(customer_count), 0)
           FROM sales
           {clause}"
        );
        let (total_amount, total_quantity, total_customers) = conn
          .query_row(&sums_sql, params_from_iter(binds.clone()), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?;

        // Stock is a per-product snapshot: sum the latest inventory of
        // each product in scope, regardless of the date bounds.
        let stock_sql = format!(
          "SELECT COALESCE(SUM(
                    (SELECT s2.inventory FROM sales s2
                     WHERE s2.product_id = scoped.product_id
                     ORDER BY s2.sale_date DESC, s2.id DESC
                     LIMIT 1)
                  ), 0)
           FROM (SELECT DISTINCT product_id FROM sales {clause}) scoped"
        );
        let total_inventory = conn
          .query_row(&stock_sql, params_from_iter(binds), |row| row.get(0))?;

        Ok(DeepTotals {
          total_amount,
          total_quantity,
          total_customers,
          total_inventory,
        })
      })
      .await?;
    Ok(totals)
  }

  async fn product_sales(
    &self,
    filter: SalesFilter,
  ) -> Result<Vec<ProductSales>> {
    let (clause, binds) = filter_sql(&filter, true);

    let rows = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT p.id, p.name, p.barcode, b.name,
                  COALESCE(SUM(s.amount), 0)   AS total_amount,
                  COALESCE(SUM(s.quantity), 0)
           FROM sales s
           JOIN products p ON s.product_id = p.id
           JOIN brands b   ON p.brand_id = b.id
           {clause}
           GROUP BY p.id
           ORDER BY total_amount DESC, p.id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), |row| {
            Ok(ProductSales {
              product_id:     row.get(0)?,
              product_name:   row.get(1)?,
              barcode:        row.get(2)?,
              brand_name:     row.get(3)?,
              total_amount:   row.get(4)?,
              total_quantity: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn weekly_trend(
    &self,
    store_id: i64,
    filter: SalesFilter,
  ) -> Result<Vec<WeeklySales>> {
    let scoped = SalesFilter { store_id: Some(store_id), ..filter.dates_only() };
    let (clause, binds) = filter_sql(&scoped, false);

    let rows = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT strftime('%W', sale_date) AS week, SUM(amount)
           FROM sales
           {clause}
           GROUP BY week
           ORDER BY week ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), |row| {
            Ok(WeeklySales { week: row.get(0)?, total_amount: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn top_brands(
    &self,
    store_id: i64,
    filter: SalesFilter,
    limit: u32,
  ) -> Result<Vec<TopBrand>> {
    let scoped = SalesFilter { store_id: Some(store_id), ..filter.dates_only() };
    let (clause, mut binds) = filter_sql(&scoped, true);
    binds.push(Value::Integer(i64::from(limit)));

    let rows = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT b.id, b.name, COALESCE(SUM(s.amount), 0) AS total_amount
           FROM sales s
           JOIN products p ON s.product_id = p.id
           JOIN brands b   ON p.brand_id = b.id
           {clause}
           GROUP BY b.id
           ORDER BY total_amount DESC, b.id ASC
           LIMIT ?"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), |row| {
            Ok(TopBrand {
              brand_id:     row.get(0)?,
              name:         row.get(1)?,
              total_amount: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn best_sellers(
    &self,
    brand_id: i64,
    since: NaiveDate,
    limit: u32,
  ) -> Result<Vec<BestSeller>> {
    let since_str = encode_date(since);

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT p.id, p.name,
                  COALESCE(SUM(s.amount), 0)   AS total_amount,
                  COALESCE(SUM(s.quantity), 0)
           FROM sales s
           JOIN products p ON s.product_id = p.id
           WHERE p.brand_id = ?1 AND s.sale_date >= ?2
           GROUP BY p.id
           ORDER BY total_amount DESC, p.id ASC
           LIMIT ?3",
        )?;
        let rows = stmt
          .query_map(params![brand_id, since_str, limit], |row| {
            Ok(BestSeller {
              product_id:     row.get(0)?,
              name:           row.get(1)?,
              total_amount:   row.get(2)?,
              total_quantity: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn inventory_levels(
    &self,
    brand_id: i64,
    as_of: NaiveDate,
  ) -> Result<Vec<InventoryLevel>> {
    let since = as_of.checked_sub_days(chrono::Days::new(30)).unwrap_or(as_of);
    let since_str = encode_date(since);

    let rows = self
      .conn
      .call(move |conn| {
        // The trailing window constrains sold quantity only; current stock
        // is always the latest snapshot, however old.
        let mut stmt = conn.prepare(
          "SELECT p.id, p.name,
                  COALESCE(SUM(s.quantity), 0) AS sold_30d,
                  COALESCE((SELECT s2.inventory FROM sales s2
                            WHERE s2.product_id = p.id
                            ORDER BY s2.sale_date DESC, s2.id DESC
                            LIMIT 1), 0)       AS current_stock
           FROM products p
           LEFT JOIN sales s
             ON s.product_id = p.id AND s.sale_date >= ?2
           WHERE p.brand_id = ?1
           GROUP BY p.id
           ORDER BY p.id ASC",
        )?;
        let rows = stmt
          .query_map(params![brand_id, since_str], |row| {
            Ok(InventoryLevel {
              product_id:    row.get(0)?,
              product_name:  row.get(1)?,
              sold_30d:      row.get(2)?,
              current_stock: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn product_trend(
    &self,
    product_id: i64,
    since: NaiveDate,
  ) -> Result<Vec<ProductTrendPoint>> {
    let since_str = encode_date(since);

    let raws: Vec<RawTrendPoint> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT sale_date, SUM(quantity), SUM(amount)
           FROM sales
           WHERE product_id = ?1 AND sale_date >= ?2
           GROUP BY sale_date
           ORDER BY sale_date ASC",
        )?;
        let rows = stmt
          .query_map(params![product_id, since_str], |row| {
            Ok(RawTrendPoint {
              date:           row.get(0)?,
              total_quantity: row.get(1)?,
              total_amount:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTrendPoint::into_point).collect()
  }

  async fn amount_in_range(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<i64> {
    let start_str = encode_date(start);
    let end_str = encode_date(end);

    let total = self
      .conn
      .call(move |conn| {
        let total = conn.query_row(
          "SELECT COALESCE(SUM(amount), 0) FROM sales
           WHERE sale_date >= ?1 AND sale_date <= ?2",
          params![start_str, end_str],
          |row| row.get(0),
        )?;
        Ok(total)
      })
      .await?;
    Ok(total)
  }

  async fn brand_volumes(&self) -> Result<Vec<BrandVolume>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT b.id, b.name,
                  COALESCE(SUM(s.quantity), 0),
                  COALESCE(SUM(s.inventory), 0)
           FROM brands b
           LEFT JOIN products p ON p.brand_id = b.id
           LEFT JOIN sales s    ON s.product_id = p.id
           GROUP BY b.id
           ORDER BY b.id ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(BrandVolume {
              brand_id:        row.get(0)?,
              brand_name:      row.get(1)?,
              total_quantity:  row.get(2)?,
              total_inventory: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  // ── Export ────────────────────────────────────────────────────────────────

  async fn export_rows(&self, brand_id: Option<i64>) -> Result<Vec<ExportRow>> {
    let raws: Vec<RawExportRow> = self
      .conn
      .call(move |conn| {
        let mut sql = "SELECT s.sale_date, st.name, b.name, p.barcode, p.name,
                  s.quantity, s.amount
           FROM sales s
           JOIN stores st  ON s.store_id = st.id
           JOIN products p ON s.product_id = p.id
           JOIN brands b   ON p.brand_id = b.id"
          .to_owned();
        let mut binds: Vec<Value> = Vec::new();
        if let Some(id) = brand_id {
          sql.push_str(" WHERE b.id = ?");
          binds.push(Value::Integer(id));
        }
        sql.push_str(" ORDER BY s.sale_date ASC, s.id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), |row| {
            Ok(RawExportRow {
              sale_date:    row.get(0)?,
              store_name:   row.get(1)?,
              brand_name:   row.get(2)?,
              barcode:      row.get(3)?,
              product_name: row.get(4)?,
              quantity:     row.get(5)?,
              amount:       row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawExportRow::into_row).collect()
  }
}
