use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EtlError;

/// Canonical column order for the orders schema. Every normalized record
/// carries exactly these seven fields.
pub const CANONICAL_COLUMNS: [&str; 7] = [
    "order_id",
    "source",
    "order_date",
    "customer_id",
    "customer_name",
    "total_amount",
    "status",
];

/// The pipeline's working record. All fields stay textual until a record has
/// been validated; the clean sink is where types get strict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalOrder {
    pub order_id: String,
    pub source: String,
    pub order_date: String,
    pub customer_id: String,
    pub customer_name: String,
    pub total_amount: String,
    pub status: String,
}

impl CanonicalOrder {
    /// Field values in canonical column order.
    pub fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("order_id", &self.order_id),
            ("source", &self.source),
            ("order_date", &self.order_date),
            ("customer_id", &self.customer_id),
            ("customer_name", &self.customer_name),
            ("total_amount", &self.total_amount),
            ("status", &self.status),
        ]
    }
}

/// A validated order bound for the clean sink, with typed date and amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanOrder {
    pub order_id: String,
    pub source: String,
    pub order_date: NaiveDate,
    pub customer_id: String,
    pub customer_name: String,
    pub total_amount: f64,
    pub status: String,
}

impl TryFrom<&CanonicalOrder> for CleanOrder {
    type Error = EtlError;

    fn try_from(order: &CanonicalOrder) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: order.order_id.clone(),
            source: order.source.clone(),
            order_date: NaiveDate::parse_from_str(&order.order_date, "%Y-%m-%d")?,
            customer_id: order.customer_id.clone(),
            customer_name: order.customer_name.clone(),
            total_amount: order.total_amount.trim().parse::<f64>()?,
            status: order.status.clone(),
        })
    }
}

/// A rejected order bound for the error sink, all text plus the reasons it
/// was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorOrder {
    pub order_id: String,
    pub source: String,
    pub order_date: String,
    pub customer_id: String,
    pub customer_name: String,
    pub total_amount: String,
    pub status: String,
    pub error_reason: String,
}

impl ErrorOrder {
    pub fn from_rejected(order: &CanonicalOrder, errors: &[String]) -> Self {
        Self {
            order_id: order.order_id.clone(),
            source: order.source.clone(),
            order_date: order.order_date.clone(),
            customer_id: order.customer_id.clone(),
            customer_name: order.customer_name.clone(),
            total_amount: order.total_amount.clone(),
            status: order.status.clone(),
            error_reason: errors.join("; "),
        }
    }
}

/// Routing decision for one delivery: exactly one destination sink.
#[derive(Debug, Clone)]
pub enum RoutedOrder {
    Clean(CleanOrder),
    Error(ErrorOrder),
}

impl RoutedOrder {
    pub fn order_id(&self) -> &str {
        match self {
            RoutedOrder::Clean(order) => &order.order_id,
            RoutedOrder::Error(order) => &order.order_id,
        }
    }
}
