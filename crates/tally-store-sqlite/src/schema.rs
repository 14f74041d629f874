//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Reference data is append-only: rows are created on first sighting
-- (INSERT OR IGNORE on the natural key) and never updated or deleted.
CREATE TABLE IF NOT EXISTS brands (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS stores (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS products (
    id       INTEGER PRIMARY KEY,
    barcode  TEXT NOT NULL UNIQUE,
    name     TEXT NOT NULL,
    category TEXT,
    brand_id INTEGER NOT NULL REFERENCES brands(id)
);

-- One row per ingested line; duplicates by (date, store, product) are
-- legitimate. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS sales (
    id             INTEGER PRIMARY KEY,
    sale_date      TEXT NOT NULL,     -- ISO YYYY-MM-DD
    store_id       INTEGER NOT NULL REFERENCES stores(id),
    product_id     INTEGER NOT NULL REFERENCES products(id),
    quantity       INTEGER NOT NULL DEFAULT 0,
    amount         INTEGER NOT NULL DEFAULT 0,
    customer_count INTEGER NOT NULL DEFAULT 0,
    inventory      INTEGER NOT NULL DEFAULT 0   -- stock snapshot, not a delta
);

CREATE INDEX IF NOT EXISTS sales_date_idx    ON sales(sale_date);
CREATE INDEX IF NOT EXISTS sales_store_idx   ON sales(store_id);
CREATE INDEX IF NOT EXISTS sales_product_idx ON sales(product_id);

PRAGMA user_version = 1;
";
