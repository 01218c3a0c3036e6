//! Dotted-path value accessor for JSON documents.
//!
//! Every list screen and the export mapper address document fields with
//! path strings like `"name"`, `"category.name"`, or
//! `"products.[].codes"`. A literal `[]` segment means "map over the
//! array here": mid-path it resolves the rest of the path for each
//! element and returns the flattened, null-filtered results; as the last
//! segment it returns the array itself.
//!
//! Missing intermediate keys never raise an error; resolution
//! short-circuits to `None`.

use serde_json::Value;

/// Resolve `path` inside `doc`.
///
/// Returns `None` for a null document, an empty path, or any missing or
/// null field along the way.
pub fn get_value(doc: &Value, path: &str) -> Option<Value> {
    if doc.is_null() || path.is_empty() {
        return None;
    }
    let parts: Vec<&str> = path.split('.').collect();
    resolve(doc, &parts)
}

fn resolve(start: &Value, parts: &[&str]) -> Option<Value> {
    let mut current = start;

    for (i, key) in parts.iter().enumerate() {
        if current.is_null() {
            return None;
        }

        if *key == "[]" {
            let items = current.as_array()?;

            // Trailing wildcard: the array itself.
            if i == parts.len() - 1 {
                return Some(Value::Array(items.clone()));
            }

            // Mid-path wildcard: resolve the rest for each element, then
            // flatten one level and drop nulls.
            let rest = &parts[i + 1..];
            let mut collected = Vec::new();
            for item in items {
                match resolve(item, rest) {
                    Some(Value::Array(values)) => {
                        collected.extend(values.into_iter().filter(|v| !v.is_null()));
                    }
                    Some(value) => collected.push(value),
                    None => {}
                }
            }
            return Some(Value::Array(collected));
        }

        current = current.get(*key)?;
    }

    if current.is_null() {
        None
    } else {
        Some(current.clone())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_path() {
        let doc = json!({"a": {"b": 1}});
        assert_eq!(get_value(&doc, "a.b"), Some(json!(1)));
    }

    #[test]
    fn test_null_doc() {
        assert_eq!(get_value(&Value::Null, "a.b"), None);
    }

    #[test]
    fn test_empty_path() {
        let doc = json!({"a": 1});
        assert_eq!(get_value(&doc, ""), None);
    }

    #[test]
    fn test_missing_intermediate_key() {
        let doc = json!({"a": {"b": 1}});
        assert_eq!(get_value(&doc, "a.x.y"), None);
        assert_eq!(get_value(&doc, "z"), None);
    }

    #[test]
    fn test_null_leaf() {
        let doc = json!({"a": null});
        assert_eq!(get_value(&doc, "a"), None);
    }

    #[test]
    fn test_trailing_wildcard_returns_array() {
        let doc = json!({"tags": ["x", "y"]});
        assert_eq!(get_value(&doc, "tags.[]"), Some(json!(["x", "y"])));
    }

    #[test]
    fn test_wildcard_on_non_array() {
        let doc = json!({"tags": "x"});
        assert_eq!(get_value(&doc, "tags.[]"), None);
    }

    #[test]
    fn test_mid_path_wildcard_maps_over_elements() {
        let doc = json!({"products": [
            {"name": "iPhone"},
            {"name": "iPod"},
            {"price": 20}
        ]});
        assert_eq!(
            get_value(&doc, "products.[].name"),
            Some(json!(["iPhone", "iPod"]))
        );
    }

    #[test]
    fn test_nested_wildcard_flattens_one_level() {
        let doc = json!({"products": [
            {"codes": ["C1", "C2"]},
            {"codes": []},
            {"codes": ["C3"]}
        ]});
        assert_eq!(
            get_value(&doc, "products.[].codes"),
            Some(json!(["C1", "C2", "C3"]))
        );
    }

    #[test]
    fn test_wildcard_filters_nulls() {
        let doc = json!({"products": [
            {"name": null},
            {"name": "iPad"}
        ]});
        assert_eq!(get_value(&doc, "products.[].name"), Some(json!(["iPad"])));
    }
}
