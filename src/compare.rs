//! Sort comparators for the three list views.
//!
//! Each view (entries, models, IMEIs) exposes a comparator table keyed by
//! the field name its sort drawer offers. Unknown field names fall back
//! to the `date` comparator so a stale persisted sort selection can never
//! break a screen.

use std::cmp::Ordering;

use serde_json::Value;

use crate::dates;

/// Two-row comparison function, negative/zero/positive via [`Ordering`].
pub type Comparator = fn(&Value, &Value) -> Ordering;

fn str_field(doc: &Value, key: &str) -> String {
    doc.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

fn cmp_str_field(a: &Value, b: &Value, key: &str) -> Ordering {
    str_field(a, key).cmp(&str_field(b, key))
}

fn date_ms(doc: &Value) -> Option<i64> {
    doc.get("date").and_then(dates::parse_value_ms)
}

/// Sum of `codes` lengths across an entry's products.
fn total_scans(doc: &Value) -> usize {
    doc.get("products")
        .and_then(Value::as_array)
        .map(|products| {
            products
                .iter()
                .map(|p| {
                    p.get("codes")
                        .and_then(Value::as_array)
                        .map(Vec::len)
                        .unwrap_or(0)
                })
                .sum()
        })
        .unwrap_or(0)
}

pub fn cmp_date(a: &Value, b: &Value) -> Ordering {
    date_ms(a).cmp(&date_ms(b))
}

fn cmp_price(a: &Value, b: &Value) -> Ordering {
    let price = |doc: &Value| doc.get("price").and_then(Value::as_f64).unwrap_or(0.0);
    price(a).total_cmp(&price(b))
}

fn cmp_total_scans(a: &Value, b: &Value) -> Ordering {
    total_scans(a).cmp(&total_scans(b))
}

fn cmp_name(a: &Value, b: &Value) -> Ordering {
    cmp_str_field(a, b, "name")
}

fn cmp_order_name(a: &Value, b: &Value) -> Ordering {
    cmp_str_field(a, b, "orderName")
}

fn cmp_category(a: &Value, b: &Value) -> Ordering {
    cmp_str_field(a, b, "category")
}

fn cmp_code(a: &Value, b: &Value) -> Ordering {
    cmp_str_field(a, b, "codes")
}

/// Comparator table for the entries list.
pub fn entry_comparator(field: &str) -> Comparator {
    match field {
        "name" => cmp_name,
        "total_scans" => cmp_total_scans,
        _ => cmp_date,
    }
}

/// Comparator table for the flattened model rows.
pub fn model_comparator(field: &str) -> Comparator {
    match field {
        "name" => cmp_name,
        "price" => cmp_price,
        "orderName" => cmp_order_name,
        "category" => cmp_category,
        _ => cmp_date,
    }
}

/// Comparator table for the flattened IMEI rows.
pub fn imei_comparator(field: &str) -> Comparator {
    match field {
        "name" => cmp_name,
        "imei" | "codes" => cmp_code,
        "orderName" => cmp_order_name,
        _ => cmp_date,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
