//! Validation and coercion of model output.
//!
//! Nothing the model returns is trusted until it has been through
//! [`parse_response`]: the envelope is unwrapped, every record is checked
//! against the event fields, dates are coerced to timestamps and prices are
//! normalized.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::error::ExtractionError;
use crate::event::Event;

const FIELDS: [&str; 6] = [
    "name",
    "starting_date",
    "ending_date",
    "description",
    "price",
    "type",
];

const ENVELOPE_KEYS: [&str; 2] = ["Events", "events"];

const FREE_PRICES: [&str; 6] = [
    "free",
    "gratis",
    "gratuito",
    "gratuita",
    "entrada libre",
    "entrada gratuita",
];

const DATE_TIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// Group 2 is a Spanish-grouped amount ("1.000", "1.250,50"), group 3 a plain one.
static PRICE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:€\s*)?(-)?\s*(?:(\d{1,3}(?:\.\d{3})+(?:,\d+)?)|(\d+(?:[.,]\d+)?))\s*(?:€|eur|euros?)?$",
    )
    .expect("price pattern is valid")
});

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)```").expect("fence pattern is valid"));

/// Extract the JSON from a Markdown code fence anywhere in the model's answer.
///
/// Text without a complete fence is returned trimmed, minus any dangling
/// opening or closing fence.
pub fn strip_code_fences(text: &str) -> &str {
    if let Some(block) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        return block.as_str().trim();
    }

    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse raw model text into validated events.
///
/// Accepts the `{"Events": [...]}` envelope or a bare array of records.
pub fn parse_response(text: &str) -> Result<Vec<Event>, ExtractionError> {
    let json = strip_code_fences(text);
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ExtractionError::Parse(format!("output is not valid JSON: {}", e)))?;

    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut envelope) => {
            let key = ENVELOPE_KEYS
                .iter()
                .find(|key| envelope.contains_key(**key))
                .ok_or_else(|| {
                    ExtractionError::Parse("expected an object with an 'Events' list".to_string())
                })?;
            let records = envelope.remove(*key).unwrap_or(Value::Null);

            if let Some(extra) = envelope.keys().next() {
                return Err(ExtractionError::Parse(format!(
                    "unexpected top-level field '{}'",
                    extra
                )));
            }

            match records {
                Value::Array(records) => records,
                other => {
                    return Err(ExtractionError::Parse(format!(
                        "'Events' must be a list, got {}",
                        type_name(&other)
                    )));
                }
            }
        }
        other => {
            return Err(ExtractionError::Parse(format!(
                "expected a JSON object or list, got {}",
                type_name(&other)
            )));
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| validate_record(index, record))
        .collect()
}

/// Check one record against the event fields and coerce it into an [`Event`]
pub fn validate_record(index: usize, record: Value) -> Result<Event, ExtractionError> {
    let invalid = |field: &str, reason: String| ExtractionError::Validation {
        index,
        field: field.to_string(),
        reason,
    };

    let mut fields = match record {
        Value::Object(fields) => fields,
        other => {
            return Err(invalid(
                "record",
                format!("expected an object, got {}", type_name(&other)),
            ));
        }
    };

    if let Some(unknown) = fields.keys().find(|key| !FIELDS.contains(&key.as_str())) {
        return Err(invalid(unknown, "unexpected field".to_string()));
    }

    let name = required_string(&mut fields, "name").map_err(|r| invalid("name", r))?;
    if name.trim().is_empty() {
        return Err(invalid("name", "must not be empty".to_string()));
    }
    let description =
        required_string(&mut fields, "description").map_err(|r| invalid("description", r))?;
    let kind = required_string(&mut fields, "type").map_err(|r| invalid("type", r))?;

    let starting_date =
        coerce_date(fields.remove("starting_date")).map_err(|r| invalid("starting_date", r))?;
    let ending_date =
        coerce_date(fields.remove("ending_date")).map_err(|r| invalid("ending_date", r))?;
    let price = coerce_price(fields.remove("price")).map_err(|r| invalid("price", r))?;

    Ok(Event {
        name: name.trim().to_string(),
        starting_date,
        ending_date,
        description,
        price,
        kind,
    })
}

fn required_string(fields: &mut Map<String, Value>, field: &str) -> Result<String, String> {
    match fields.remove(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(format!("expected a string, got {}", type_name(&other))),
        None => Err("missing required field".to_string()),
    }
}

/// Coerce a date-like value into a timestamp.
///
/// Missing, `null` and empty values are absent. Date-only values map to
/// midnight; offsets are dropped keeping the wall-clock time.
pub fn coerce_date(value: Option<Value>) -> Result<Option<NaiveDateTime>, String> {
    let text = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(format!("expected a date string, got {}", type_name(&other)));
        }
    };

    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(dt.naive_local()));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Some(dt));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0));
    }

    Err(format!("'{}' is not a recognized date", text))
}

/// Normalize a price value.
///
/// Missing, `null` and "free" prices are 0. Negative numbers and text that is
/// not a price are rejected rather than clamped.
pub fn coerce_price(value: Option<Value>) -> Result<f64, String> {
    let price = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("'{}' is not representable", n))?,
        Some(Value::String(s)) => parse_price_text(&s)?,
        Some(other) => {
            return Err(format!("expected a number, got {}", type_name(&other)));
        }
    };

    if !price.is_finite() {
        return Err(format!("'{}' is not a finite price", price));
    }
    if price < 0.0 {
        return Err(format!("negative price {}", price));
    }
    // -0.0 is free too
    if price == 0.0 {
        return Ok(0.0);
    }
    Ok(price)
}

fn parse_price_text(text: &str) -> Result<f64, String> {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return Err("empty price text".to_string());
    }
    if FREE_PRICES.contains(&normalized.as_str()) {
        return Ok(0.0);
    }

    let captures = PRICE_TEXT
        .captures(&normalized)
        .ok_or_else(|| format!("'{}' is not a price", text))?;
    if captures.get(1).is_some() {
        return Err(format!("negative price '{}'", text));
    }

    let amount = match (captures.get(2), captures.get(3)) {
        (Some(grouped), _) => grouped.as_str().replace('.', "").replace(',', "."),
        (None, Some(plain)) => plain.as_str().replace(',', "."),
        (None, None) => return Err(format!("'{}' is not a price", text)),
    };

    amount
        .parse::<f64>()
        .map_err(|e| format!("'{}' is not a price: {}", text, e))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
