//! Generic sort + search engine shared by the list screens.
//!
//! One reusable function combines three concerns in a fixed order:
//! global free-text search over configured keys, per-key declarative
//! filters, and single-field sort. `params` is the screen's current
//! control state as a JSON object: `sortBy` and `asc` drive the sort,
//! every other key is treated as a filter.
//!
//! Filter-skip convention: `""`, `null`, `"all"`, and boolean `false`
//! all mean "no filter". Only a `true` boolean constrains — that
//! asymmetry matches the switch UI ("show active only") and must stay.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use crate::accessor::get_value;
use crate::dates;

/// How a configured filter interprets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Match against the formatted date rendering.
    Date,
    /// Enum-style select, always exact.
    Select,
}

/// Per-key filter configuration.
#[derive(Debug, Clone, Default)]
pub struct FilterDef {
    pub kind: Option<FilterKind>,
    /// Force exact (whole-value) matching.
    pub exact: bool,
    /// Remap the filter key to a different document path,
    /// e.g. filter `category` against `category.name`.
    pub key: Option<String>,
}

/// Engine configuration for one screen.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Paths checked by the global free-text search.
    pub search_keys: Vec<String>,
    pub filter_config: HashMap<String, FilterDef>,
    /// strftime format used when matching date values as text.
    pub date_format: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_keys: vec!["name".to_string()],
            filter_config: HashMap::new(),
            date_format: dates::DISPLAY_FORMAT.to_string(),
        }
    }
}

fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substring / exact match of a resolved value against a criterion.
/// Arrays match if any element matches.
fn check_match(
    item_value: Option<&Value>,
    criteria: &Value,
    is_date: bool,
    date_format: &str,
    strict: bool,
) -> bool {
    let lower_criteria = display_string(criteria).to_lowercase();

    let Some(item_value) = item_value else {
        return false;
    };

    if let Value::Array(items) = item_value {
        return items
            .iter()
            .any(|v| check_match(Some(v), criteria, is_date, date_format, strict));
    }

    if item_value.is_null() {
        return false;
    }

    if is_date {
        return match dates::format_with(item_value, date_format) {
            Some(rendered) => rendered.to_lowercase().contains(&lower_criteria),
            None => false,
        };
    }

    let value_text = display_string(item_value).to_lowercase();
    if strict {
        value_text == lower_criteria
    } else {
        value_text.contains(&lower_criteria)
    }
}

/// Does this string value parse with the configured display format?
/// Used to auto-detect date-shaped filter values like "03 Jan 2024".
fn parses_with_format(raw: &str, format: &str) -> bool {
    chrono::NaiveDate::parse_from_str(raw.trim(), format).is_ok()
}

// ---------------------------------------------------------------------------
// Sort normalization
// ---------------------------------------------------------------------------

enum SortKey {
    Missing,
    Num(f64),
    Text(String),
}

/// Normalize a resolved value for comparison: ISO date strings become
/// epoch milliseconds, numeric strings become numbers, everything else a
/// lowercased string. Arrays have already been reduced to their first
/// element by the caller.
fn normalize(value: Option<&Value>) -> SortKey {
    let Some(value) = value else {
        return SortKey::Missing;
    };
    match value {
        Value::Null => SortKey::Missing,
        Value::Number(n) => SortKey::Num(n.as_f64().unwrap_or(0.0)),
        Value::Bool(b) => SortKey::Text(b.to_string()),
        Value::String(s) => {
            if let Some(ms) = dates::parse_str_ms(s) {
                return SortKey::Num(ms as f64);
            }
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                if let Ok(n) = trimmed.parse::<f64>() {
                    return SortKey::Num(n);
                }
            }
            SortKey::Text(s.to_lowercase())
        }
        other => SortKey::Text(display_string(other).to_lowercase()),
    }
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
        (SortKey::Num(x), SortKey::Num(y)) => x.total_cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        // Mixed number/text never orders; keep the incoming order.
        _ => Ordering::Equal,
    }
}

fn is_ascending(asc: Option<&Value>) -> bool {
    match asc {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "yes" || s == "asc",
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Apply global search, declarative filters, and sort to `rows`.
///
/// Processing order is fixed: search first, then filters, then sort.
pub fn sort_and_search(
    rows: &[Value],
    params: &Value,
    search: &str,
    config: &SearchConfig,
) -> Vec<Value> {
    let mut result: Vec<Value> = rows.to_vec();

    // 1. Global search.
    if !search.is_empty() {
        let lower_search = search.to_lowercase();
        result.retain(|row| {
            config.search_keys.iter().any(|key| {
                let value = get_value(row, key);

                // Date-valued fields also match their formatted rendering.
                if let Some(v) = &value {
                    if v.as_str().and_then(dates::parse_str_ms).is_some() {
                        if let Some(rendered) = dates::format_with(v, &config.date_format) {
                            if rendered.to_lowercase().contains(&lower_search) {
                                return true;
                            }
                        }
                    }
                }

                check_match(
                    value.as_ref(),
                    &Value::String(search.to_string()),
                    false,
                    &config.date_format,
                    false,
                )
            })
        });
    }

    // 2. Declarative filters (everything in params except sortBy/asc).
    if let Some(params_map) = params.as_object() {
        for (key, filter_val) in params_map {
            if key == "sortBy" || key == "asc" {
                continue;
            }

            // "" / null / "all" mean no filter.
            match filter_val {
                Value::Null => continue,
                Value::String(s) if s.is_empty() || s == "all" => continue,
                // Switch UI convention: false means "don't filter",
                // only true constrains.
                Value::Bool(false) => continue,
                _ => {}
            }

            let default_def = FilterDef::default();
            let def = config.filter_config.get(key).unwrap_or(&default_def);
            let target_key = def.key.as_deref().unwrap_or(key);

            let is_date = def.kind == Some(FilterKind::Date)
                || matches!(filter_val, Value::String(s)
                    if parses_with_format(s, &config.date_format));
            let is_strict = def.kind == Some(FilterKind::Select)
                || def.exact
                || filter_val.is_boolean();

            result.retain(|row| {
                let item_val = get_value(row, target_key);
                check_match(
                    item_val.as_ref(),
                    filter_val,
                    is_date,
                    &config.date_format,
                    is_strict,
                )
            });
        }
    }

    // 3. Sort.
    let sort_by = params
        .get("sortBy")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    if let Some(sort_by) = sort_by {
        let asc = is_ascending(params.get("asc"));

        result.sort_by(|a, b| {
            let first = |v: Option<Value>| match v {
                Some(Value::Array(items)) => items.into_iter().next(),
                other => other,
            };
            let val_a = first(get_value(a, sort_by));
            let val_b = first(get_value(b, sort_by));

            let norm_a = normalize(val_a.as_ref());
            let norm_b = normalize(val_b.as_ref());

            // Nulls always sort last, regardless of direction.
            match (&norm_a, &norm_b) {
                (SortKey::Missing, SortKey::Missing) => return Ordering::Equal,
                (SortKey::Missing, _) => return Ordering::Greater,
                (_, SortKey::Missing) => return Ordering::Less,
                _ => {}
            }

            let ord = compare_keys(&norm_a, &norm_b);
            if asc {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    result
}

// ===========================================================================
// Tests
// ===========================================================================
