//! Flatteners for the model and IMEI list views.
//!
//! Entries come back from the API as nested order -> product -> code
//! documents. The model screen wants one row per product and the IMEI
//! screen one row per individual code, each row annotated with the parent
//! entry's id, customer name, and date. Rows are recomputed on every
//! render; nothing here mutates or aliases the source documents.

use serde_json::{Map, Value};

fn annotate(row: &mut Map<String, Value>, entry: &Value) {
    row.insert(
        "date".to_string(),
        entry.get("date").cloned().unwrap_or(Value::Null),
    );
    row.insert(
        "orderName".to_string(),
        entry.get("name").cloned().unwrap_or(Value::Null),
    );
}

/// One row per product: the product's own fields plus `parentId`,
/// `orderName`, and `date` from the parent entry. Emission follows entry
/// order then product order; no sorting happens here.
pub fn flatten_model_data(entries: &[Value]) -> Vec<Value> {
    let mut flattened = Vec::new();

    for entry in entries {
        let products = entry.get("products").and_then(Value::as_array);
        let Some(products) = products else { continue };

        for product in products {
            let mut row = product.as_object().cloned().unwrap_or_default();
            annotate(&mut row, entry);
            row.insert(
                "parentId".to_string(),
                entry.get("_id").cloned().unwrap_or(Value::Null),
            );
            flattened.push(Value::Object(row));
        }
    }

    flattened
}

/// One row per individual code: the product's fields with `codes`
/// replaced by the single code string, plus `orderId`, `orderName`, and
/// `date`. A product with no codes emits nothing — there is nothing to
/// scan-print for it.
pub fn flatten_imei_data(entries: &[Value]) -> Vec<Value> {
    let mut flattened = Vec::new();

    for entry in entries {
        let products = entry.get("products").and_then(Value::as_array);
        let Some(products) = products else { continue };

        for product in products {
            let codes = product.get("codes").and_then(Value::as_array);
            let Some(codes) = codes else { continue };

            for code in codes {
                let mut row = product.as_object().cloned().unwrap_or_default();
                row.insert("codes".to_string(), code.clone());
                annotate(&mut row, entry);
                row.insert(
                    "orderId".to_string(),
                    entry.get("_id").cloned().unwrap_or(Value::Null),
                );
                flattened.push(Value::Object(row));
            }
        }
    }

    flattened
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_entries() -> Vec<Value> {
        vec![json!({
            "_id": "E1",
            "name": "Amit",
            "date": "2024-01-01",
            "products": [{
                "_id": "P1",
                "name": "iPhone",
                "category": "iphones",
                "details": "512 GB",
                "price": 42000,
                "codes": ["C1", "C2"]
            }]
        })]
    }

    #[test]
    fn test_model_row_field_set() {
        let rows = flatten_model_data(&sample_entries());
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row["parentId"], "E1");
        assert_eq!(row["orderName"], "Amit");
        assert_eq!(row["date"], "2024-01-01");
        // Product fields are carried raw, not remapped.
        assert_eq!(row["name"], "iPhone");
        assert!(row.get("productName").is_none());
        assert_eq!(row["codes"], json!(["C1", "C2"]));
        assert_eq!(row["price"], 42000);
    }

    #[test]
    fn test_model_rows_follow_entry_then_product_order() {
        let entries = vec![
            json!({"_id": "E1", "name": "A", "date": "2024-01-01", "products": [
                {"_id": "P1", "name": "first"},
                {"_id": "P2", "name": "second"}
            ]}),
            json!({"_id": "E2", "name": "B", "date": "2024-01-02", "products": [
                {"_id": "P3", "name": "third"}
            ]}),
        ];
        let names: Vec<_> = flatten_model_data(&entries)
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_imei_row_per_code() {
        let rows = flatten_imei_data(&sample_entries());
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0]["codes"], "C1");
        assert_eq!(rows[1]["codes"], "C2");
        for row in &rows {
            assert_eq!(row["orderId"], "E1");
            assert_eq!(row["orderName"], "Amit");
            assert_eq!(row["name"], "iPhone");
            assert_eq!(row["details"], "512 GB");
        }
    }

    #[test]
    fn test_codeless_product_emits_nothing() {
        let entries = vec![json!({
            "_id": "E1",
            "name": "Amit",
            "date": "2024-01-01",
            "products": [
                {"_id": "P1", "name": "iPhone", "codes": []},
                {"_id": "P2", "name": "iPad"}
            ]
        })];
        assert!(flatten_imei_data(&entries).is_empty());
    }

    #[test]
    fn test_entry_without_products() {
        let entries = vec![json!({"_id": "E1", "name": "Amit"})];
        assert!(flatten_model_data(&entries).is_empty());
        assert!(flatten_imei_data(&entries).is_empty());
    }

    #[test]
    fn test_sources_not_mutated() {
        let entries = sample_entries();
        let snapshot = entries.clone();
        let _ = flatten_model_data(&entries);
        let _ = flatten_imei_data(&entries);
        assert_eq!(entries, snapshot);
    }
}
