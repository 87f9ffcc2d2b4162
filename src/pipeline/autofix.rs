use crate::domain::CanonicalOrder;

/// Maximum customer name length after cleaning.
const MAX_NAME_CHARS: usize = 50;

/// Result of the auto-fix pass: the possibly-repaired record, and whether any
/// field actually changed.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    pub order: CanonicalOrder,
    pub was_fixed: bool,
}

/// Best-effort repair of common data-quality defects, applied per field and
/// independently of validation. Never fails: a field that cannot be repaired
/// keeps its pre-fix value so that validation stays the final arbiter.
pub fn auto_fix(order: &CanonicalOrder) -> FixOutcome {
    let mut fixed = order.clone();

    fixed.order_id = order.order_id.trim().to_string();
    fixed.order_date = order.order_date.trim().to_string();
    fixed.status = order.status.trim().to_uppercase();

    if let Some(name) = fix_customer_name(&order.customer_name) {
        fixed.customer_name = name;
    }
    if let Some(amount) = fix_total_amount(&order.total_amount) {
        fixed.total_amount = amount;
    }

    let was_fixed = fixed != *order;
    FixOutcome { order: fixed, was_fixed }
}

/// Clean a customer name: keep letters, whitespace and hyphens, collapse
/// whitespace runs, title-case each token, cap the length. Returns None when
/// nothing usable is left, leaving rejection to validation.
fn fix_customer_name(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace() || *c == '-')
        .collect();

    let cleaned = kept
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    let capped: String = cleaned.chars().take(MAX_NAME_CHARS).collect();
    let capped = capped.trim_end().to_string();

    if capped.is_empty() {
        None
    } else {
        Some(capped)
    }
}

/// Strip currency noise from an amount and re-render the parsed value.
/// The sign is kept so a negative amount stays negative and unfixable.
fn fix_total_amount(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let value: f64 = cleaned.parse().ok()?;
    if value <= 0.0 {
        return None;
    }
    Some(value.to_string())
}

/// Upper-case the first character of a token, lower-case the rest.
fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> CanonicalOrder {
        CanonicalOrder {
            order_id: "ON-1".to_string(),
            source: "online".to_string(),
            order_date: "2025-11-01".to_string(),
            customer_id: "C1".to_string(),
            customer_name: "Le Thi Nga".to_string(),
            total_amount: "120.5".to_string(),
            status: "PAID".to_string(),
        }
    }

    #[test]
    fn clean_record_is_untouched() {
        let outcome = auto_fix(&order());
        assert!(!outcome.was_fixed);
        assert_eq!(outcome.order, order());
    }

    #[test]
    fn strips_digits_from_name() {
        let mut dirty = order();
        dirty.customer_name = "John123".to_string();
        let outcome = auto_fix(&dirty);
        assert!(outcome.was_fixed);
        assert_eq!(outcome.order.customer_name, "John");
    }

    #[test]
    fn title_cases_and_collapses_whitespace() {
        let mut dirty = order();
        dirty.customer_name = "  nguyen   van  a ".to_string();
        let outcome = auto_fix(&dirty);
        assert_eq!(outcome.order.customer_name, "Nguyen Van A");
    }

    #[test]
    fn keeps_diacritics_and_hyphens() {
        let mut dirty = order();
        dirty.customer_name = "nguyễn thị ánh-hồng".to_string();
        let outcome = auto_fix(&dirty);
        assert_eq!(outcome.order.customer_name, "Nguyễn Thị Ánh-hồng");
    }

    #[test]
    fn truncates_long_names_to_fifty_chars() {
        let mut dirty = order();
        dirty.customer_name = "a".repeat(80);
        let outcome = auto_fix(&dirty);
        assert_eq!(outcome.order.customer_name.chars().count(), 50);
    }

    #[test]
    fn unfixable_name_keeps_prefix_value() {
        let mut dirty = order();
        dirty.customer_name = "12345".to_string();
        let outcome = auto_fix(&dirty);
        // Nothing usable left after cleaning: the original survives so that
        // validation rejects it.
        assert_eq!(outcome.order.customer_name, "12345");
    }

    #[test]
    fn strips_currency_noise_from_amount() {
        let mut dirty = order();
        dirty.total_amount = "$1,234.50 VND".to_string();
        let outcome = auto_fix(&dirty);
        assert!(outcome.was_fixed);
        assert_eq!(outcome.order.total_amount, "1234.5");
    }

    #[test]
    fn negative_amount_stays_unfixable() {
        let mut dirty = order();
        dirty.total_amount = "-50".to_string();
        let outcome = auto_fix(&dirty);
        assert_eq!(outcome.order.total_amount, "-50");
    }

    #[test]
    fn non_numeric_amount_stays_unfixable() {
        let mut dirty = order();
        dirty.total_amount = "abc".to_string();
        let outcome = auto_fix(&dirty);
        assert_eq!(outcome.order.total_amount, "abc");
    }

    #[test]
    fn uppercases_status_and_trims_ids() {
        let mut dirty = order();
        dirty.status = " done ".to_string();
        dirty.order_id = " ON-7 ".to_string();
        dirty.order_date = " 2025-11-01 ".to_string();
        let outcome = auto_fix(&dirty);
        assert_eq!(outcome.order.status, "DONE");
        assert_eq!(outcome.order.order_id, "ON-7");
        assert_eq!(outcome.order.order_date, "2025-11-01");
    }

    #[test]
    fn fixing_twice_is_a_fixed_point() {
        let mut dirty = order();
        dirty.customer_name = " john123   SMITH ".to_string();
        dirty.total_amount = " $200 ".to_string();
        dirty.status = "pending ".to_string();

        let once = auto_fix(&dirty);
        let twice = auto_fix(&once.order);
        assert_eq!(once.order, twice.order);
        assert!(!twice.was_fixed);
    }
}
