use chrono::NaiveDate;

use crate::domain::CanonicalOrder;

/// Calendar formats accepted for order_date, tried in order.
pub const ACCEPTED_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Result of validating one record: overall verdict plus every violation
/// found, one entry per failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// A validation rule: reads the record, returns its violations. The date rule
/// also rewrites the field to ISO form when a format matches, which is why
/// rules take the record mutably.
pub type Rule = fn(&mut CanonicalOrder) -> Vec<String>;

/// Validates orders with a fixed, named rule list. Every rule runs on every
/// record; violations are concatenated in rule order.
pub struct OrderValidator {
    rules: Vec<(&'static str, Rule)>,
}

impl OrderValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                ("order_id", order_id_rule),
                ("customer_name", customer_name_rule),
                ("total_amount", total_amount_rule),
                ("order_date", order_date_rule),
                ("status", status_rule),
            ],
        }
    }

    pub fn validate(&self, order: &mut CanonicalOrder) -> ValidationOutcome {
        let mut errors = Vec::new();
        for (name, rule) in &self.rules {
            let violations = rule(order);
            if !violations.is_empty() {
                tracing::debug!(rule = *name, count = violations.len(), "validation rule failed");
            }
            errors.extend(violations);
        }
        ValidationOutcome {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

impl Default for OrderValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn order_id_rule(order: &mut CanonicalOrder) -> Vec<String> {
    if order.order_id.is_empty() {
        return vec!["order_id missing".to_string()];
    }
    Vec::new()
}

fn customer_name_rule(order: &mut CanonicalOrder) -> Vec<String> {
    let name = order.customer_name.trim();
    if name.is_empty() {
        vec!["customer_name missing".to_string()]
    } else if name.chars().any(|c| c.is_ascii_digit()) {
        vec!["customer_name has digits".to_string()]
    } else if name.chars().count() > 50 {
        vec!["customer_name too long".to_string()]
    } else {
        Vec::new()
    }
}

fn total_amount_rule(order: &mut CanonicalOrder) -> Vec<String> {
    match order.total_amount.trim().parse::<f64>() {
        Ok(amount) => {
            if amount <= 0.0 {
                vec!["total_amount must be > 0".to_string()]
            } else {
                Vec::new()
            }
        }
        Err(_) => vec!["total_amount not numeric".to_string()],
    }
}

/// Checks order_date against the accepted formats, first match wins. A match
/// rewrites the field to ISO form even when other rules reject the record.
fn order_date_rule(order: &mut CanonicalOrder) -> Vec<String> {
    let raw = order.order_date.trim().to_string();
    for format in ACCEPTED_DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(&raw, format) {
            order.order_date = parsed.format("%Y-%m-%d").to_string();
            return Vec::new();
        }
    }
    vec!["order_date invalid format".to_string()]
}

fn status_rule(order: &mut CanonicalOrder) -> Vec<String> {
    if order.status.trim().is_empty() {
        return vec!["status missing".to_string()];
    }
    Vec::new()
}
