//! Free-text search for the entry, model, and IMEI list views.
//!
//! The model and IMEI screens use a phrase-aware tokenizer: date-like
//! phrases ("3 jan", "12 feb 2024") and storage sizes ("512 gb",
//! "128gb") are kept as single tokens before the rest of the query is
//! split on whitespace. A row matches when EVERY token appears somewhere
//! in its searchable text (AND across tokens, OR across fields per
//! token).
//!
//! Storage tokens get one extra chance against a fully
//! whitespace-stripped copy of the text, so "512gb" finds a variant
//! stored as "512 GB" and vice versa. That double-check is a deliberate
//! UX accommodation; keep it.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::compare::{entry_comparator, imei_comparator, model_comparator};
use crate::dates;
use crate::flatten::{flatten_imei_data, flatten_model_data};

/// Sort selection coming from a sort drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

fn date_phrase_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)(?:\s+\d{4})?")
            .expect("date phrase pattern")
    })
}

fn storage_phrase_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\d+\s*gb").expect("storage phrase pattern"))
}

fn storage_token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+gb$").expect("storage token pattern"))
}

/// Split a query into search tokens, extracting date and storage phrases
/// first so they survive as single tokens.
pub fn parse_search_query(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    let lower = lower.trim();
    if lower.is_empty() {
        return Vec::new();
    }

    let mut terms = Vec::new();

    for m in date_phrase_pattern().find_iter(lower) {
        // Collapse internal whitespace to a single space.
        terms.push(m.as_str().split_whitespace().collect::<Vec<_>>().join(" "));
    }
    let without_dates = date_phrase_pattern().replace_all(lower, " ");

    for m in storage_phrase_pattern().find_iter(&without_dates) {
        // Strip whitespace entirely: "512 gb" -> "512gb".
        terms.push(m.as_str().split_whitespace().collect::<String>());
    }
    let remainder = storage_phrase_pattern().replace_all(&without_dates, " ");

    terms.extend(remainder.split_whitespace().map(str::to_string));
    terms
}

/// Token test against a row's collected searchable texts.
///
/// `texts` entries are already lowercased. Storage tokens also check a
/// whitespace-stripped copy of the combined text.
fn matches_all_terms(texts: &[String], terms: &[String]) -> bool {
    let combined = texts.join(" ");
    let normalized = combined.split_whitespace().collect::<Vec<_>>().join(" ");

    terms.iter().all(|term| {
        if storage_token_pattern().is_match(term) {
            let stripped: String = combined.split_whitespace().collect();
            normalized.contains(term.as_str()) || stripped.contains(term.as_str())
        } else {
            normalized.contains(term.as_str())
        }
    })
}

fn push_str_field(texts: &mut Vec<String>, row: &Value, key: &str) {
    if let Some(s) = row.get(key).and_then(Value::as_str) {
        texts.push(s.to_lowercase());
    }
}

fn push_details(texts: &mut Vec<String>, row: &Value) {
    if let Some(details) = row.get("details").and_then(Value::as_str) {
        let details = details.to_lowercase();
        // Whitespace-stripped duplicate tolerates "512GB" vs "512 GB".
        texts.push(details.split_whitespace().collect());
        texts.push(details);
    }
}

fn push_display_date(texts: &mut Vec<String>, row: &Value) {
    if let Some(date) = row.get("date") {
        if let Some(formatted) = dates::format_display(date) {
            texts.push(formatted.to_lowercase());
        }
    }
}

// ---------------------------------------------------------------------------
// Entries view (nested documents, plain substring search)
// ---------------------------------------------------------------------------

/// Filter nested entries by a raw substring query: entry name, formatted
/// date, product names, and codes.
pub fn filter_entries_by_search(data: &[Value], query: &str) -> Vec<Value> {
    if query.is_empty() {
        return data.to_vec();
    }
    let lower = query.to_lowercase();

    data.iter()
        .filter(|entry| {
            if let Some(name) = entry.get("name").and_then(Value::as_str) {
                if name.to_lowercase().contains(&lower) {
                    return true;
                }
            }

            if let Some(date) = entry.get("date") {
                if let Some(formatted) = dates::format_display(date) {
                    if formatted.to_lowercase().contains(&lower) {
                        return true;
                    }
                }
            }

            let products = entry.get("products").and_then(Value::as_array);
            products.is_some_and(|products| {
                products.iter().any(|product| {
                    if let Some(name) = product.get("name").and_then(Value::as_str) {
                        if name.to_lowercase().contains(&lower) {
                            return true;
                        }
                    }
                    product
                        .get("codes")
                        .and_then(Value::as_array)
                        .is_some_and(|codes| {
                            codes.iter().any(|code| {
                                code.as_str()
                                    .is_some_and(|c| c.to_lowercase().contains(&lower))
                            })
                        })
                })
            })
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Model view (flattened product rows, phrase-aware search)
// ---------------------------------------------------------------------------

/// Filter flattened model rows with the phrase-aware tokenizer.
pub fn filter_models_by_search(data: &[Value], query: &str) -> Vec<Value> {
    let terms = parse_search_query(query);
    if terms.is_empty() {
        return data.to_vec();
    }

    data.iter()
        .filter(|row| {
            let mut texts = Vec::new();
            push_str_field(&mut texts, row, "name");
            push_details(&mut texts, row);
            push_str_field(&mut texts, row, "orderName");
            push_str_field(&mut texts, row, "category");
            push_display_date(&mut texts, row);
            if let Some(codes) = row.get("codes").and_then(Value::as_array) {
                for code in codes {
                    if let Some(c) = code.as_str() {
                        texts.push(c.to_lowercase());
                    }
                }
            }
            matches_all_terms(&texts, &terms)
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// IMEI view (flattened per-code rows, phrase-aware search)
// ---------------------------------------------------------------------------

/// Filter flattened IMEI rows with the phrase-aware tokenizer.
pub fn filter_imeis_by_search(data: &[Value], query: &str) -> Vec<Value> {
    let terms = parse_search_query(query);
    if terms.is_empty() {
        return data.to_vec();
    }

    data.iter()
        .filter(|row| {
            let mut texts = Vec::new();
            push_str_field(&mut texts, row, "codes");
            push_str_field(&mut texts, row, "name");
            push_str_field(&mut texts, row, "orderName");
            push_details(&mut texts, row);
            push_display_date(&mut texts, row);
            matches_all_terms(&texts, &terms)
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Per-view pipelines: (flatten) + filter + sort
// ---------------------------------------------------------------------------

fn sorted_by(mut rows: Vec<Value>, cmp: crate::compare::Comparator, spec: &SortSpec) -> Vec<Value> {
    rows.sort_by(|a, b| cmp(a, b));
    if spec.direction == SortDirection::Desc {
        rows.reverse();
    }
    rows
}

/// Entries screen: filter then sort nested entry documents.
pub fn process_entries(data: &[Value], search: &str, sort: &SortSpec) -> Vec<Value> {
    let filtered = filter_entries_by_search(data, search.trim());
    sorted_by(filtered, entry_comparator(&sort.field), sort)
}

/// Models screen: flatten, filter, sort.
pub fn process_model_entries(data: &[Value], search: &str, sort: &SortSpec) -> Vec<Value> {
    let flattened = flatten_model_data(data);
    let filtered = filter_models_by_search(&flattened, search);
    sorted_by(filtered, model_comparator(&sort.field), sort)
}

/// IMEI screen: flatten, filter, sort.
pub fn process_imei_entries(data: &[Value], search: &str, sort: &SortSpec) -> Vec<Value> {
    let flattened = flatten_imei_data(data);
    let filtered = filter_imeis_by_search(&flattened, search);
    sorted_by(filtered, imei_comparator(&sort.field), sort)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_words() {
        assert_eq!(parse_search_query("iphone amit"), ["iphone", "amit"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_search_query("").is_empty());
        assert!(parse_search_query("   ").is_empty());
    }

    #[test]
    fn test_parse_date_phrase_kept_whole() {
        let terms = parse_search_query("iphone 3 jan 2024");
        assert!(terms.contains(&"3 jan 2024".to_string()));
        assert!(terms.contains(&"iphone".to_string()));
    }

    #[test]
    fn test_parse_date_phrase_without_year() {
        let terms = parse_search_query("12  feb");
        assert_eq!(terms, ["12 feb"]);
    }

    #[test]
    fn test_parse_storage_phrase_stripped() {
        assert_eq!(parse_search_query("512 gb"), ["512gb"]);
        assert_eq!(parse_search_query("128gb"), ["128gb"]);
    }

    #[test]
    fn test_parse_mixed_query() {
        let terms = parse_search_query("iPhone 512 GB 3 Jan");
        assert!(terms.contains(&"512gb".to_string()));
        assert!(terms.contains(&"3 jan".to_string()));
        assert!(terms.contains(&"iphone".to_string()));
    }

    fn model_row(details: &str) -> Value {
        json!({
            "name": "iPhone 13",
            "details": details,
            "category": "iphones",
            "orderName": "Amit",
            "date": "2024-01-03T00:00:00Z",
            "codes": ["350000000000001"]
        })
    }

    #[test]
    fn test_storage_token_matches_spaced_variant() {
        let rows = vec![model_row("512 GB")];
        assert_eq!(filter_models_by_search(&rows, "512gb").len(), 1);
        assert_eq!(filter_models_by_search(&rows, "512 gb").len(), 1);
    }

    #[test]
    fn test_storage_token_matches_unspaced_variant() {
        let rows = vec![model_row("512gb")];
        assert_eq!(filter_models_by_search(&rows, "512 GB").len(), 1);
    }

    #[test]
    fn test_and_semantics_across_tokens() {
        let rows = vec![model_row("512 GB")];
        assert_eq!(filter_models_by_search(&rows, "iphone amit").len(), 1);
        assert_eq!(filter_models_by_search(&rows, "iphone nokia").len(), 0);
    }

    #[test]
    fn test_model_search_hits_formatted_date() {
        let rows = vec![model_row("64 GB")];
        assert_eq!(filter_models_by_search(&rows, "3 jan 2024").len(), 1);
    }

    #[test]
    fn test_model_search_hits_code() {
        let rows = vec![model_row("64 GB")];
        assert_eq!(filter_models_by_search(&rows, "350000000000001").len(), 1);
    }

    #[test]
    fn test_imei_search_on_single_code() {
        let rows = vec![json!({
            "name": "iPhone 13",
            "codes": "350000000000007",
            "orderName": "Amit",
            "details": "128 GB",
            "date": "2024-01-03T00:00:00Z"
        })];
        assert_eq!(filter_imeis_by_search(&rows, "0007").len(), 1);
        assert_eq!(filter_imeis_by_search(&rows, "128gb amit").len(), 1);
        assert_eq!(filter_imeis_by_search(&rows, "0009").len(), 0);
    }

    fn entries_fixture() -> Vec<Value> {
        vec![
            json!({
                "_id": "E1", "name": "Amit", "date": "2024-01-03T00:00:00Z",
                "products": [{"name": "iPhone 13", "codes": ["C111"]}]
            }),
            json!({
                "_id": "E2", "name": "Bhavin", "date": "2024-02-10T00:00:00Z",
                "products": [{"name": "iPod", "codes": ["C222", "C333"]}]
            }),
        ]
    }

    #[test]
    fn test_entry_search_fields() {
        let entries = entries_fixture();
        assert_eq!(filter_entries_by_search(&entries, "amit").len(), 1);
        assert_eq!(filter_entries_by_search(&entries, "c222").len(), 1);
        assert_eq!(filter_entries_by_search(&entries, "ipod").len(), 1);
        assert_eq!(filter_entries_by_search(&entries, "feb 2024").len(), 1);
        assert_eq!(filter_entries_by_search(&entries, "zzz").len(), 0);
    }

    #[test]
    fn test_process_entries_sort_desc() {
        let entries = entries_fixture();
        let sorted = process_entries(&entries, "", &SortSpec::new("date", SortDirection::Desc));
        assert_eq!(sorted[0]["_id"], "E2");
        assert_eq!(sorted[1]["_id"], "E1");
    }

    #[test]
    fn test_process_entries_total_scans() {
        let entries = entries_fixture();
        let sorted = process_entries(
            &entries,
            "",
            &SortSpec::new("total_scans", SortDirection::Asc),
        );
        assert_eq!(sorted[0]["_id"], "E1");
    }

    #[test]
    fn test_process_model_entries_end_to_end() {
        let entries = entries_fixture();
        let rows = process_model_entries(&entries, "", &SortSpec::new("name", SortDirection::Asc));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "iPhone 13");
        assert_eq!(rows[0]["parentId"], "E1");
    }

    #[test]
    fn test_process_imei_entries_end_to_end() {
        let entries = entries_fixture();
        let rows = process_imei_entries(&entries, "ipod", &SortSpec::new("imei", SortDirection::Asc));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["codes"], "C222");
        assert_eq!(rows[1]["codes"], "C333");
    }
}
