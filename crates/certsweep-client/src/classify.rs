//! Pure classification of raw lookup replies into outcomes.
//!
//! The remote service's replies are duck-typed and shape-varying, so every
//! field access checks presence before type. First matching rule wins:
//!
//! 1. Transport error or non-200 status ⇒ failure.
//! 2. Body has an `error` indicator but no `response` indicator, and the
//!    indicator is null or empty ⇒ `invalid response` failure.
//! 3. Body has both indicators and `error` is not zero ⇒ `error=<value>`
//!    failure.
//! 4. Anything else is a successful query; records are extracted when the
//!    indicators are both zero and the payload reports a positive total.
//!
//! A body that matches no failure shape (including non-object JSON) is a
//! bare success with no data, so unanticipated reply shapes are kept rather
//! than discarded.

use crate::client::{RawBody, RawResponse};
use crate::error::ProbeError;
use certsweep_core::{DiscoveredRecord, Outcome};
use serde_json::{Map, Value as JsonValue};

/// Classify one probe reply into a cacheable outcome.
#[must_use]
pub fn classify(reply: Result<RawResponse, ProbeError>) -> Outcome {
    let raw = match reply {
        Ok(raw) => raw,
        Err(err) => return Outcome::Failure(err.to_string()),
    };

    if raw.status != 200 {
        return Outcome::Failure(format!("HTTP {}", raw.status));
    }

    let value = match raw.body {
        RawBody::Json(value) => value,
        RawBody::Undecodable {
            content_type,
            snippet,
            error,
        } => {
            return Outcome::Failure(format!(
                "JSON parse failed: {error}; content-type: {content_type}; body: {snippet}"
            ));
        }
    };

    let Some(map) = value.as_object() else {
        // Non-object JSON matches no failure shape: bare success, no data
        return Outcome::NoData;
    };

    let response_indicator = map.get("response");
    let error_indicator = map.get("error");

    if response_indicator.is_none() {
        if let Some(error_value) = error_indicator {
            if error_value.is_null() || error_value.as_str() == Some("") {
                return Outcome::Failure("invalid response".to_string());
            }
        }
    }

    if response_indicator.is_some() {
        if let Some(error_value) = error_indicator {
            if !is_zero(error_value) {
                return Outcome::Failure(format!("error={}", render(error_value)));
            }
        }
    }

    if is_exact_zero(response_indicator) && is_exact_zero(error_indicator) && total_count(map) > 0 {
        Outcome::Success(extract_records(map))
    } else {
        Outcome::NoData
    }
}

/// Canonical "ok" check for the error indicator: numeric or string zero.
fn is_zero(value: &JsonValue) -> bool {
    match value {
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s == "0",
        _ => false,
    }
}

/// Strictly numeric zero, the canonical success value of both indicators.
fn is_exact_zero(value: Option<&JsonValue>) -> bool {
    value
        .and_then(JsonValue::as_i64)
        .is_some_and(|n| n == 0)
}

fn total_count(map: &Map<String, JsonValue>) -> u64 {
    map.get("data")
        .and_then(|data| data.get("total"))
        .and_then(JsonValue::as_u64)
        .unwrap_or(0)
}

fn extract_records(map: &Map<String, JsonValue>) -> Vec<DiscoveredRecord> {
    map.get("data")
        .and_then(|data| data.get("list"))
        .and_then(JsonValue::as_array)
        .map(|list| list.iter().filter_map(record_from_value).collect())
        .unwrap_or_default()
}

fn record_from_value(value: &JsonValue) -> Option<DiscoveredRecord> {
    let fields = value.as_object()?;
    Some(DiscoveredRecord {
        certificate_no: field_string(fields, "certificateNo").unwrap_or_default(),
        athlete_name: field_string(fields, "athleteRealName"),
        rank_title: field_string(fields, "rankTitle"),
        item: field_string(fields, "item"),
    })
}

/// Read a record field as text, tolerating numeric values.
fn field_string(fields: &Map<String, JsonValue>, key: &str) -> Option<String> {
    match fields.get(key)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

/// Render an error indicator value for the failure reason string.
fn render(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
