use std::collections::HashMap;

use crate::domain::CanonicalOrder;

/// Map source-specific column names into the canonical schema.
///
/// Total over any input: a field missing under every known synonym falls back
/// to its default, so the output always carries all seven canonical fields.
pub fn normalize(source: &str, row: &HashMap<String, String>) -> CanonicalOrder {
    CanonicalOrder {
        order_id: pick(row, &["order_id", "id", "orderId"], ""),
        source: source.to_string(),
        order_date: pick(row, &["order_date", "date"], ""),
        customer_id: pick(row, &["customer_id", "cust_id"], ""),
        customer_name: pick(row, &["customer_name", "name"], ""),
        total_amount: pick(row, &["total_amount", "amount", "total"], "0"),
        status: pick(row, &["status", "order_status"], "PENDING"),
    }
}

/// First non-empty value among the synonym keys, else the default.
fn pick(row: &HashMap<String, String>, keys: &[&str], default: &str) -> String {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_empty())
        .cloned()
        .unwrap_or_else(|| default.to_string())
}
