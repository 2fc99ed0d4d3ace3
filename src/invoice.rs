//! Best-effort interpretation of model output.
//!
//! The model is asked for a JSON object, but nothing guarantees it returns
//! one. Output is parsed when it can be and passed through as a string when
//! it can't. [`InvoiceFields`] is a lenient typed view used for display only.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?\s*```\s*$").unwrap()
});

/// Remove a surrounding Markdown code fence, if there is one.
pub fn strip_code_fences(output: &str) -> &str {
    match CODE_FENCE.captures(output).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => output.trim(),
    }
}

/// Parse model output as a JSON object or array, falling back to the raw string.
pub fn interpret_model_output(output: &str) -> Value {
    match serde_json::from_str::<Value>(strip_code_fences(output)) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => Value::String(output.to_string()),
    }
}

/// Lenient view over a structured invoice. Every field is optional and
/// fields of the wrong type are dropped rather than rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub vendor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub tax: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub line_items: Vec<LineItem>,
    /// Anything else the model chose to return.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: Option<f64>,
}

impl InvoiceFields {
    /// Typed view of interpreted output. `None` unless it is a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }

    /// Whether none of the named fields were found.
    pub fn is_empty(&self) -> bool {
        self.vendor_name.is_none()
            && self.invoice_number.is_none()
            && self.date.is_none()
            && self.due_date.is_none()
            && self.subtotal.is_none()
            && self.tax.is_none()
            && self.total.is_none()
            && self.currency.is_none()
            && self.line_items.is_empty()
    }
}

/// Accept strings and numbers; anything else becomes `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept numbers and numeric strings such as "$1,350.00".
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(&s),
        _ => None,
    })
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<LineItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Parse a money-ish string, ignoring currency symbols and thousands separators.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}
