use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{CanonicalOrder, CleanOrder, ErrorOrder, RoutedOrder};
use crate::error::Result;
use crate::storage::{CleanRow, ErrorRow, OrderStore};

#[derive(Default)]
struct Inner {
    seq: u64,
    raw: HashMap<String, CanonicalOrder>,
    clean: HashMap<String, (u64, CleanRow)>,
    error: HashMap<String, (u64, ErrorRow)>,
}

/// In-memory store implementation for development/testing.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit-sink lookup, handy in tests.
    pub fn raw(&self, order_id: &str) -> Option<CanonicalOrder> {
        self.inner.lock().unwrap().raw.get(order_id).cloned()
    }
}

fn now_stamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn clean_row(record: &CleanOrder, created_at: String) -> CleanRow {
    CleanRow {
        order_id: record.order_id.clone(),
        source: record.source.clone(),
        order_date: record.order_date.format("%Y-%m-%d").to_string(),
        customer_id: record.customer_id.clone(),
        customer_name: record.customer_name.clone(),
        total_amount: record.total_amount,
        status: record.status.clone(),
        created_at,
    }
}

fn error_row(record: &ErrorOrder, created_at: String) -> ErrorRow {
    ErrorRow {
        order_id: record.order_id.clone(),
        source: record.source.clone(),
        order_date: record.order_date.clone(),
        customer_id: record.customer_id.clone(),
        customer_name: record.customer_name.clone(),
        total_amount: record.total_amount.clone(),
        status: record.status.clone(),
        error_reason: record.error_reason.clone(),
        created_at,
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn persist(&self, raw: &CanonicalOrder, routed: &RoutedOrder) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.raw.insert(raw.order_id.clone(), raw.clone());

        inner.seq += 1;
        let seq = inner.seq;
        match routed {
            RoutedOrder::Clean(record) => {
                // An update keeps the original insertion order and timestamp,
                // matching the SQLite non-key-column upsert.
                let (seq, created_at) = match inner.clean.get(&record.order_id) {
                    Some((existing_seq, existing)) => (*existing_seq, existing.created_at.clone()),
                    None => (seq, now_stamp()),
                };
                inner
                    .clean
                    .insert(record.order_id.clone(), (seq, clean_row(record, created_at)));
            }
            RoutedOrder::Error(record) => {
                let (seq, created_at) = match inner.error.get(&record.order_id) {
                    Some((existing_seq, existing)) => (*existing_seq, existing.created_at.clone()),
                    None => (seq, now_stamp()),
                };
                inner
                    .error
                    .insert(record.order_id.clone(), (seq, error_row(record, created_at)));
            }
        }
        Ok(())
    }

    async fn list_clean(&self, limit: usize) -> Result<Vec<CleanRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<(u64, CleanRow)> = inner.clean.values().cloned().collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(rows.into_iter().take(limit).map(|(_, row)| row).collect())
    }

    async fn list_error(&self, limit: usize) -> Result<Vec<ErrorRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<(u64, ErrorRow)> = inner.error.values().cloned().collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(rows.into_iter().take(limit).map(|(_, row)| row).collect())
    }
}
