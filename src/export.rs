//! Declarative column mapping for spreadsheet and PDF exports.
//!
//! Export screens describe their columns as data: a list of headers plus
//! a parallel list of field specs. A spec is one of six kinds, parsed
//! from the authored forms the screens already use:
//!
//! - `"price"` plain field copy
//! - `"products|name"` join an array field with `", "` (subfield optional)
//! - `"date_F"` date field rendered as DD/MM/YYYY
//! - `"category.name"` dot path into a nested object
//! - `"codes_L"` length of an array field
//! - conditional object / array of `{field, condition, value, valueField,
//!   default}` rules
//!
//! The same parsed specs feed both outputs: a named map per row for
//! spreadsheet writers and a positional value row for PDF tables.
//!
//! Condition codes are a closed set; an unknown code is a programmer
//! error in a static spec and fails loudly at parse time instead of
//! degrading.

use std::cmp::Ordering;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::accessor::get_value;
use crate::dates;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported condition: {0}")]
    UnsupportedCondition(String),
    #[error("conditional mapping needs at least one rule")]
    EmptyConditional,
    #[error("invalid field spec: {0}")]
    InvalidSpec(String),
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Condition {
    pub fn parse(code: &str) -> Result<Self, ExportError> {
        match code {
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            other => Err(ExportError::UnsupportedCondition(other.to_string())),
        }
    }

    fn eval(self, field_value: Option<&Value>, target: &Value) -> bool {
        match self {
            Self::Eq => field_value.is_some_and(|v| v == target),
            // A missing field is "not equal" to anything, like the
            // original strict inequality.
            Self::Ne => field_value.map_or(true, |v| v != target),
            Self::Lt => ordered(field_value, target).is_some_and(|o| o == Ordering::Less),
            Self::Lte => ordered(field_value, target).is_some_and(|o| o != Ordering::Greater),
            Self::Gt => ordered(field_value, target).is_some_and(|o| o == Ordering::Greater),
            Self::Gte => ordered(field_value, target).is_some_and(|o| o != Ordering::Less),
        }
    }
}

/// Relational comparison: numbers (including numeric strings) compare
/// numerically, strings lexicographically; anything else never orders.
fn ordered(field_value: Option<&Value>, target: &Value) -> Option<Ordering> {
    let field_value = field_value?;

    let as_num = |v: &Value| -> Option<f64> {
        v.as_f64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    };
    if let (Some(a), Some(b)) = (as_num(field_value), as_num(target)) {
        return Some(a.total_cmp(&b));
    }
    if let (Some(a), Some(b)) = (field_value.as_str(), target.as_str()) {
        return Some(a.cmp(b));
    }
    None
}

/// One conditional mapping rule.
#[derive(Debug, Clone)]
pub struct CondRule {
    pub field: String,
    pub condition: Condition,
    pub value: Value,
    pub value_field: String,
    pub default: Value,
}

impl CondRule {
    fn parse(raw: &Value) -> Result<Self, ExportError> {
        let str_key = |key: &str| {
            raw.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let code = str_key("condition");
        Ok(Self {
            field: str_key("field"),
            condition: Condition::parse(&code)?,
            value: raw.get("value").cloned().unwrap_or(Value::Null),
            value_field: str_key("valueField"),
            default: raw.get("default").cloned().unwrap_or(Value::Null),
        })
    }
}

// ---------------------------------------------------------------------------
// Field specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum FieldSpec {
    /// Copy `doc[field]` as-is.
    Field(String),
    /// Join an array field with `", "`, optionally projecting a subfield
    /// of each element first.
    Join {
        field: String,
        subfield: Option<String>,
    },
    /// Render a date field as DD/MM/YYYY; empty string when absent.
    DateFmt(String),
    /// `doc[field][subfield]`.
    Path { field: String, subfield: String },
    /// Length of an array field; 0 for anything else.
    Len(String),
    /// First matching rule wins; an unmatched list falls back to the
    /// last rule's default.
    Cond(Vec<CondRule>),
}

impl FieldSpec {
    /// Parse one authored spec entry (string, object, or array form).
    ///
    /// String sniffing order matches the authored conventions: `|`
    /// before `_F` before `.` before `_L`.
    pub fn parse(raw: &Value) -> Result<Self, ExportError> {
        match raw {
            Value::String(s) => Ok(Self::parse_str(s)),
            Value::Object(_) => Ok(Self::Cond(vec![CondRule::parse(raw)?])),
            Value::Array(rules) => {
                if rules.is_empty() {
                    return Err(ExportError::EmptyConditional);
                }
                let rules = rules
                    .iter()
                    .map(CondRule::parse)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Cond(rules))
            }
            other => Err(ExportError::InvalidSpec(other.to_string())),
        }
    }

    fn parse_str(s: &str) -> Self {
        if let Some((field, subfield)) = s.split_once('|') {
            return Self::Join {
                field: field.to_string(),
                subfield: (!subfield.is_empty()).then(|| subfield.to_string()),
            };
        }
        if let Some((field, _)) = s.split_once("_F") {
            return Self::DateFmt(field.to_string());
        }
        if let Some((field, subfield)) = s.split_once('.') {
            return Self::Path {
                field: field.to_string(),
                subfield: subfield.to_string(),
            };
        }
        if let Some((field, _)) = s.split_once("_L") {
            return Self::Len(field.to_string());
        }
        Self::Field(s.to_string())
    }

    /// Parse a whole authored spec list.
    pub fn parse_all(raw: &[Value]) -> Result<Vec<Self>, ExportError> {
        raw.iter().map(Self::parse).collect()
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

fn join_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty(value: Value) -> Option<Value> {
    match &value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        _ => Some(value),
    }
}

fn apply_cond(doc: &Value, rules: &[CondRule]) -> Value {
    for rule in rules {
        if !rule.condition.eval(doc.get(&rule.field), &rule.value) {
            continue;
        }
        let resolved = if rule.value_field.contains('.') {
            get_value(doc, &rule.value_field)
        } else {
            doc.get(&rule.value_field).cloned()
        };
        return resolved
            .and_then(non_empty)
            .unwrap_or_else(|| rule.default.clone());
    }
    rules
        .last()
        .map(|rule| rule.default.clone())
        .unwrap_or(Value::Null)
}

/// Resolve one spec against a row document.
pub fn apply_spec(doc: &Value, spec: &FieldSpec) -> Value {
    match spec {
        FieldSpec::Field(field) => doc.get(field).cloned().unwrap_or(Value::Null),
        FieldSpec::Join { field, subfield } => {
            let joined = doc
                .get(field)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(|item| match subfield {
                            Some(sub) => item.get(sub).map(join_text).unwrap_or_default(),
                            None => join_text(item),
                        })
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            Value::String(joined)
        }
        FieldSpec::DateFmt(field) => {
            let rendered = doc
                .get(field)
                .and_then(dates::format_export)
                .unwrap_or_default();
            Value::String(rendered)
        }
        FieldSpec::Path { field, subfield } => doc
            .get(field)
            .and_then(|v| v.get(subfield))
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
        FieldSpec::Len(field) => {
            let len = doc
                .get(field)
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0);
            Value::from(len)
        }
        FieldSpec::Cond(rules) => apply_cond(doc, rules),
    }
}

/// Named row for spreadsheet writers: `headers[i] -> specs[i]` applied
/// to `doc`, in one pass.
pub fn map_object_keys(doc: &Value, headers: &[String], specs: &[FieldSpec]) -> Map<String, Value> {
    headers
        .iter()
        .zip(specs)
        .map(|(header, spec)| (header.clone(), apply_spec(doc, spec)))
        .collect()
}

/// Positional row for PDF table writers.
pub fn values_from_doc(doc: &Value, specs: &[FieldSpec]) -> Vec<Value> {
    specs.iter().map(|spec| apply_spec(doc, spec)).collect()
}

// ===========================================================================
// Tests
// ===========================================================================
