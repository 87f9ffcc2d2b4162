use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{CanonicalOrder, RoutedOrder};
use crate::error::Result;

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// A row read back from the clean sink.
#[derive(Debug, Clone, Serialize)]
pub struct CleanRow {
    pub order_id: String,
    pub source: String,
    pub order_date: String,
    pub customer_id: String,
    pub customer_name: String,
    pub total_amount: f64,
    pub status: String,
    pub created_at: String,
}

/// A row read back from the error sink.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRow {
    pub order_id: String,
    pub source: String,
    pub order_date: String,
    pub customer_id: String,
    pub customer_name: String,
    pub total_amount: String,
    pub status: String,
    pub error_reason: String,
    pub created_at: String,
}

/// Dual-sink order persistence, keyed by order_id in every sink.
///
/// `persist` writes the pre-fix record into the audit sink and the routed
/// record into exactly one of clean/error, committing both together. Upserts
/// overwrite all non-key columns; last write wins by delivery order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn persist(&self, raw: &CanonicalOrder, routed: &RoutedOrder) -> Result<()>;
    async fn list_clean(&self, limit: usize) -> Result<Vec<CleanRow>>;
    async fn list_error(&self, limit: usize) -> Result<Vec<ErrorRow>>;
}
