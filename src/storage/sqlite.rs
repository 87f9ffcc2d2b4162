use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::domain::{CanonicalOrder, CleanOrder, ErrorOrder, RoutedOrder};
use crate::error::Result;
use crate::storage::{CleanRow, ErrorRow, OrderStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id      TEXT NOT NULL UNIQUE,
    source        TEXT,
    order_date    TEXT,
    customer_id   TEXT,
    customer_name TEXT,
    total_amount  TEXT,
    status        TEXT,
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE TABLE IF NOT EXISTS orders_clean (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id      TEXT NOT NULL UNIQUE,
    source        TEXT,
    order_date    TEXT NOT NULL,
    customer_id   TEXT,
    customer_name TEXT NOT NULL,
    total_amount  REAL NOT NULL,
    status        TEXT,
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE TABLE IF NOT EXISTS orders_error (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id      TEXT NOT NULL UNIQUE,
    source        TEXT,
    order_date    TEXT,
    customer_id   TEXT,
    customer_name TEXT,
    total_amount  TEXT,
    status        TEXT,
    error_reason  TEXT,
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQLite-backed order store. One connection, WAL mode; each delivery's
/// writes share a transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Ensure the three sink tables exist. Idempotent.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        debug!("order sink tables ensured");
        Ok(())
    }
}

fn upsert_raw(conn: &Connection, record: &CanonicalOrder) -> Result<()> {
    conn.execute(
        "INSERT INTO orders (order_id, source, order_date, customer_id, customer_name, total_amount, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(order_id) DO UPDATE SET
             source=excluded.source,
             order_date=excluded.order_date,
             customer_id=excluded.customer_id,
             customer_name=excluded.customer_name,
             total_amount=excluded.total_amount,
             status=excluded.status",
        params![
            record.order_id,
            record.source,
            record.order_date,
            record.customer_id,
            record.customer_name,
            record.total_amount,
            record.status,
        ],
    )?;
    Ok(())
}

fn upsert_clean(conn: &Connection, record: &CleanOrder) -> Result<()> {
    conn.execute(
        "INSERT INTO orders_clean (order_id, source, order_date, customer_id, customer_name, total_amount, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(order_id) DO UPDATE SET
             source=excluded.source,
             order_date=excluded.order_date,
             customer_id=excluded.customer_id,
             customer_name=excluded.customer_name,
             total_amount=excluded.total_amount,
             status=excluded.status",
        params![
            record.order_id,
            record.source,
            record.order_date.format("%Y-%m-%d").to_string(),
            record.customer_id,
            record.customer_name,
            record.total_amount,
            record.status,
        ],
    )?;
    Ok(())
}

fn upsert_error(conn: &Connection, record: &ErrorOrder) -> Result<()> {
    conn.execute(
        "INSERT INTO orders_error (order_id, source, order_date, customer_id, customer_name, total_amount, status, error_reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(order_id) DO UPDATE SET
             source=excluded.source,
             order_date=excluded.order_date,
             customer_id=excluded.customer_id,
             customer_name=excluded.customer_name,
             total_amount=excluded.total_amount,
             status=excluded.status,
             error_reason=excluded.error_reason",
        params![
            record.order_id,
            record.source,
            record.order_date,
            record.customer_id,
            record.customer_name,
            record.total_amount,
            record.status,
            record.error_reason,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn persist(&self, raw: &CanonicalOrder, routed: &RoutedOrder) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        upsert_raw(&tx, raw)?;
        match routed {
            RoutedOrder::Clean(record) => upsert_clean(&tx, record)?,
            RoutedOrder::Error(record) => upsert_error(&tx, record)?,
        }
        tx.commit()?;
        Ok(())
    }

    async fn list_clean(&self, limit: usize) -> Result<Vec<CleanRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT order_id, source, order_date, customer_id, customer_name, total_amount, status, created_at
             FROM orders_clean ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(CleanRow {
                order_id: row.get(0)?,
                source: row.get(1)?,
                order_date: row.get(2)?,
                customer_id: row.get(3)?,
                customer_name: row.get(4)?,
                total_amount: row.get(5)?,
                status: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn list_error(&self, limit: usize) -> Result<Vec<ErrorRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT order_id, source, order_date, customer_id, customer_name, total_amount, status, error_reason, created_at
             FROM orders_error ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(ErrorRow {
                order_id: row.get(0)?,
                source: row.get(1)?,
                order_date: row.get(2)?,
                customer_id: row.get(3)?,
                customer_name: row.get(4)?,
                total_amount: row.get(5)?,
                status: row.get(6)?,
                error_reason: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                created_at: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
