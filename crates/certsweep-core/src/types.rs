//! Shared domain types for the certsweep engine.
//!
//! This module defines the cache key/entry pair persisted by the history
//! cache, the classified `Outcome` of a single probe, and the discovered
//! certificate record extracted from successful lookups.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Placeholder rendered for record fields the remote service omitted.
pub const UNKNOWN_FIELD: &str = "未知";

/// Composite cache key of (subject name, certificate number).
///
/// At most one cached outcome exists per key at any time; a later write for
/// the same key overwrites the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for a (name, certificate number) pair.
    #[must_use]
    pub fn new(name: &str, cert_no: &str) -> Self {
        Self(format!("{name}_{cert_no}"))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single certificate record extracted from a successful lookup.
///
/// Field names follow the remote service's wire format. All fields are
/// optional on the wire; unknown extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredRecord {
    /// Certificate number, the record's identity
    #[serde(rename = "certificateNo", default)]
    pub certificate_no: String,
    /// Athlete display name
    #[serde(rename = "athleteRealName", default, skip_serializing_if = "Option::is_none")]
    pub athlete_name: Option<String>,
    /// Awarded rank title
    #[serde(rename = "rankTitle", default, skip_serializing_if = "Option::is_none")]
    pub rank_title: Option<String>,
    /// Sport item the rank was awarded for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

impl DiscoveredRecord {
    /// Athlete name, or the unknown-field placeholder.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.athlete_name.as_deref().unwrap_or(UNKNOWN_FIELD)
    }

    /// Rank title, or the unknown-field placeholder.
    #[must_use]
    pub fn display_rank(&self) -> &str {
        self.rank_title.as_deref().unwrap_or(UNKNOWN_FIELD)
    }

    /// Sport item, or the unknown-field placeholder.
    #[must_use]
    pub fn display_item(&self) -> &str {
        self.item.as_deref().unwrap_or(UNKNOWN_FIELD)
    }
}

/// Record collection carried by a successful lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    /// Total number of matching records reported by the service
    #[serde(default)]
    pub total: u64,
    /// The matching records themselves
    #[serde(default)]
    pub list: Vec<DiscoveredRecord>,
}

/// Classified outcome of probing a single certificate number.
///
/// Serialized through [`OutcomeRepr`] so the on-disk form carries the
/// redundant `query_success`/`has_data` projections next to the tag, and so
/// raw responses cached by earlier tool versions still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "OutcomeRepr", into = "OutcomeRepr")]
pub enum Outcome {
    /// Lookup succeeded and returned at least one record
    Success(Vec<DiscoveredRecord>),
    /// Lookup succeeded but matched nothing
    NoData,
    /// Transport, parse, or logical failure; carries the reason
    Failure(String),
}

impl Outcome {
    /// Whether the network call and response decoding succeeded.
    #[must_use]
    pub fn query_succeeded(&self) -> bool {
        !matches!(self, Self::Failure(_))
    }

    /// Whether at least one record was present.
    #[must_use]
    pub fn has_data(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The discovered records, if any.
    #[must_use]
    pub fn records(&self) -> &[DiscoveredRecord] {
        match self {
            Self::Success(records) => records,
            _ => &[],
        }
    }

    /// The failure reason, if this outcome is a failure.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failure(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Wire/disk projection of [`Outcome`].
///
/// `error` is a raw JSON value because history files written by earlier tool
/// versions cached the service's numeric error indicator alongside the flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRepr {
    /// Whether the network call and response decoding succeeded
    #[serde(default)]
    pub query_success: bool,
    /// Whether at least one record was present
    #[serde(default)]
    pub has_data: bool,
    /// Failure reason (string) or legacy raw error indicator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonValue>,
    /// Record collection for successful lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResultPayload>,
}

impl From<OutcomeRepr> for Outcome {
    fn from(repr: OutcomeRepr) -> Self {
        if !repr.query_success {
            let reason = repr.error.map_or_else(
                || "unknown error".to_string(),
                |value| match value {
                    JsonValue::String(s) => s,
                    other => other.to_string(),
                },
            );
            return Self::Failure(reason);
        }

        if repr.has_data {
            Self::Success(repr.data.map(|payload| payload.list).unwrap_or_default())
        } else {
            Self::NoData
        }
    }
}

impl From<Outcome> for OutcomeRepr {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(records) => Self {
                query_success: true,
                has_data: true,
                error: None,
                data: Some(ResultPayload {
                    total: records.len() as u64,
                    list: records,
                }),
            },
            Outcome::NoData => Self {
                query_success: true,
                has_data: false,
                error: None,
                data: None,
            },
            Outcome::Failure(reason) => Self {
                query_success: false,
                has_data: false,
                error: Some(JsonValue::String(reason)),
                data: None,
            },
        }
    }
}

/// One cached probe outcome, keyed by (subject name, certificate number).
///
/// Field names match the on-disk history format, so the pretty-printed entry
/// array is readable both as the native form and as the legacy flat sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the outcome was observed (RFC 3339)
    pub time: String,
    /// Certificate number that was probed
    pub cert_no: String,
    /// Subject name that was probed
    pub name: String,
    /// The classified outcome
    pub response: Outcome,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, cert_no: impl Into<String>, response: Outcome) -> Self {
        Self {
            time: Utc::now().to_rfc3339(),
            cert_no: cert_no.into(),
            name: name.into(),
            response,
        }
    }

    /// The cache key this entry is stored under.
    #[must_use]
    pub fn key(&self) -> CacheKey {
        CacheKey::new(&self.name, &self.cert_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> DiscoveredRecord {
        DiscoveredRecord {
            certificate_no: "20210001".to_string(),
            athlete_name: Some("张三".to_string()),
            rank_title: Some("一级运动员".to_string()),
            item: Some("田径".to_string()),
        }
    }

    #[test]
    fn test_cache_key_format() {
        let key = CacheKey::new("张三", "20210001");
        assert_eq!(key.as_str(), "张三_20210001");
        assert_eq!(key.to_string(), "张三_20210001");
    }

    #[test]
    fn test_cache_entry_key_matches_fields() {
        let entry = CacheEntry::new("张三", "20210001", Outcome::NoData);
        assert_eq!(entry.key(), CacheKey::new("张三", "20210001"));
    }

    #[test]
    fn test_outcome_projections() {
        assert!(Outcome::Success(vec![sample_record()]).query_succeeded());
        assert!(Outcome::Success(vec![sample_record()]).has_data());
        assert!(Outcome::NoData.query_succeeded());
        assert!(!Outcome::NoData.has_data());
        assert!(!Outcome::Failure("HTTP 500".to_string()).query_succeeded());
        assert!(!Outcome::Failure("HTTP 500".to_string()).has_data());
    }

    #[test]
    fn test_outcome_serde_round_trip() {
        let outcomes = vec![
            Outcome::Success(vec![sample_record()]),
            Outcome::NoData,
            Outcome::Failure("error=1".to_string()),
        ];

        for outcome in outcomes {
            let json = serde_json::to_string(&outcome).expect("serialize outcome");
            let back: Outcome = serde_json::from_str(&json).expect("deserialize outcome");
            assert_eq!(back, outcome);
        }
    }

    #[test]
    fn test_outcome_serialized_flags_consistent() {
        let json =
            serde_json::to_value(Outcome::Success(vec![sample_record()])).expect("to value");
        assert_eq!(json["query_success"], json!(true));
        assert_eq!(json["has_data"], json!(true));
        assert_eq!(json["data"]["total"], json!(1));

        let json = serde_json::to_value(Outcome::Failure("HTTP 500".to_string())).expect("to value");
        assert_eq!(json["query_success"], json!(false));
        assert_eq!(json["has_data"], json!(false));
        assert_eq!(json["error"], json!("HTTP 500"));
    }

    #[test]
    fn test_outcome_accepts_legacy_raw_response() {
        // Earlier tool versions cached the raw service response with the
        // flags injected next to the numeric indicators.
        let legacy = json!({
            "response": 0,
            "error": 0,
            "message": "成功",
            "query_success": true,
            "has_data": true,
            "data": {
                "total": 1,
                "pageNo": 1,
                "pageSize": 10,
                "list": [{
                    "certificateNo": "20210001",
                    "athleteRealName": "张三",
                    "rankTitle": "一级运动员",
                    "item": "田径",
                    "region": "北京"
                }]
            }
        });

        let outcome: Outcome = serde_json::from_value(legacy).expect("deserialize legacy");
        assert_eq!(outcome, Outcome::Success(vec![sample_record()]));
    }

    #[test]
    fn test_outcome_accepts_legacy_failure_with_numeric_error() {
        let legacy = json!({
            "query_success": false,
            "has_data": false,
            "error": 500
        });

        let outcome: Outcome = serde_json::from_value(legacy).expect("deserialize legacy");
        assert_eq!(outcome, Outcome::Failure("500".to_string()));
    }

    #[test]
    fn test_discovered_record_lenient_deserialization() {
        let record: DiscoveredRecord =
            serde_json::from_value(json!({ "certificateNo": "x1" })).expect("deserialize record");
        assert_eq!(record.certificate_no, "x1");
        assert_eq!(record.display_name(), UNKNOWN_FIELD);
        assert_eq!(record.display_rank(), UNKNOWN_FIELD);
        assert_eq!(record.display_item(), UNKNOWN_FIELD);
    }

    #[test]
    fn test_cache_entry_serde_field_names() {
        let entry = CacheEntry::new("张三", "20210001", Outcome::NoData);
        let json = serde_json::to_value(&entry).expect("to value");
        assert!(json.get("time").is_some());
        assert!(json.get("cert_no").is_some());
        assert!(json.get("name").is_some());
        assert!(json.get("response").is_some());
    }
}
