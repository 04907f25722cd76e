//! Raw job records as stored in Redis.
//!
//! Bull and BullMQ both keep a job in a hash at `{prefix}:{queue}:{id}`, but
//! the field set differs between library versions. BullMQ 5 tracks attempts
//! in `atm`, older BullMQ and legacy Bull use `attemptsMade`. Neither field is
//! written until a job has been picked up, so a fresh record carries neither.
//! Every field is optional here; defaults are applied when a
//! [`Job`](crate::Job) is built.

use serde_json::Value;
use std::collections::HashMap;

/// A job hash decoded into typed, optional fields.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: String,
    pub name: Option<String>,
    /// Payload as stored (JSON text).
    pub data: Option<String>,
    /// Job options as stored (JSON text).
    pub opts: Option<String>,
    /// Progress as stored (JSON text, a number or an object).
    pub progress: Option<String>,
    pub attempts_made: Option<u32>,
    /// Enqueue time, ms since epoch.
    pub timestamp: Option<i64>,
    pub processed_on: Option<i64>,
    pub finished_on: Option<i64>,
    pub failed_reason: Option<String>,
    /// Top-level delay field, written by BullMQ alongside `opts.delay`.
    pub delay: Option<i64>,
}

impl JobRecord {
    /// Creates an empty record with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            data: None,
            opts: None,
            progress: None,
            attempts_made: None,
            timestamp: None,
            processed_on: None,
            finished_on: None,
            failed_reason: None,
            delay: None,
        }
    }

    /// Decodes a job hash. Returns `None` for an empty hash, which is what
    /// Redis returns once the job has been removed.
    pub fn from_hash(id: impl Into<String>, hash: HashMap<String, String>) -> Option<Self> {
        if hash.is_empty() {
            return None;
        }

        let field = |name: &str| hash.get(name).filter(|v| !v.is_empty()).cloned();

        let attempts_made = field("atm")
            .or_else(|| field("attemptsMade"))
            .and_then(|v| parse_u32(&v));

        Some(Self {
            id: id.into(),
            name: field("name"),
            data: field("data"),
            opts: field("opts"),
            progress: field("progress"),
            attempts_made,
            timestamp: field("timestamp").and_then(|v| parse_millis(&v)),
            processed_on: field("processedOn").and_then(|v| parse_millis(&v)),
            finished_on: field("finishedOn").and_then(|v| parse_millis(&v)),
            failed_reason: field("failedReason"),
            delay: field("delay").and_then(|v| parse_millis(&v)),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_data(mut self, data: &Value) -> Self {
        self.data = Some(data.to_string());
        self
    }

    pub fn with_opts(mut self, opts: &Value) -> Self {
        self.opts = Some(opts.to_string());
        self
    }

    pub fn with_progress(mut self, progress: &Value) -> Self {
        self.progress = Some(progress.to_string());
        self
    }

    pub fn with_attempts_made(mut self, attempts: u32) -> Self {
        self.attempts_made = Some(attempts);
        self
    }

    pub fn created_at(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    pub fn processed_on(mut self, millis: i64) -> Self {
        self.processed_on = Some(millis);
        self
    }

    pub fn finished_on(mut self, millis: i64) -> Self {
        self.finished_on = Some(millis);
        self
    }

    pub fn failed_with(mut self, reason: impl Into<String>) -> Self {
        self.failed_reason = Some(reason.into());
        self
    }

    /// Configured retry ceiling from `opts.attempts`.
    pub(crate) fn opts_attempts(&self) -> Option<u64> {
        self.opts_value()?.get("attempts")?.as_u64()
    }

    /// Configured delay in ms, from `opts.delay` or the top-level field.
    pub(crate) fn configured_delay(&self) -> Option<i64> {
        self.opts_value()
            .and_then(|opts| opts.get("delay").and_then(Value::as_i64))
            .or(self.delay)
    }

    fn opts_value(&self) -> Option<Value> {
        self.opts
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

fn parse_u32(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

// Timestamps are integral ms, but some writers serialize them as floats.
fn parse_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hash(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_empty_hash_is_absent() {
        assert!(JobRecord::from_hash("1", HashMap::new()).is_none());
    }

    #[test]
    fn test_bullmq_hash_decodes() {
        let record = JobRecord::from_hash(
            "42",
            hash(&[
                ("name", "send-welcome"),
                ("data", r#"{"to":"a@b.c"}"#),
                ("opts", r#"{"attempts":3,"delay":0}"#),
                ("progress", "40"),
                ("atm", "2"),
                ("ats", "2"),
                ("timestamp", "1700000000000"),
                ("processedOn", "1700000001000"),
                ("finishedOn", "1700000001500"),
            ]),
        )
        .unwrap();

        assert_eq!(record.id, "42");
        assert_eq!(record.name.as_deref(), Some("send-welcome"));
        assert_eq!(record.attempts_made, Some(2));
        assert_eq!(record.timestamp, Some(1_700_000_000_000));
        assert_eq!(record.processed_on, Some(1_700_000_001_000));
        assert_eq!(record.finished_on, Some(1_700_000_001_500));
        assert_eq!(record.opts_attempts(), Some(3));
    }

    #[test]
    fn test_legacy_hash_decodes() {
        let record = JobRecord::from_hash(
            "7",
            hash(&[
                ("name", "resize"),
                ("attemptsMade", "1"),
                ("timestamp", "1700000000000.0"),
                ("failedReason", "boom"),
            ]),
        )
        .unwrap();

        assert_eq!(record.attempts_made, Some(1));
        assert_eq!(record.timestamp, Some(1_700_000_000_000));
        assert_eq!(record.failed_reason.as_deref(), Some("boom"));
    }

    #[test]
    fn test_unstarted_job_has_no_attempts() {
        // BullMQ 5 writes `atm` only once a worker has taken the job.
        let record = JobRecord::from_hash(
            "9",
            hash(&[
                ("name", "queued"),
                ("data", "{}"),
                ("opts", r#"{"attempts":3}"#),
                ("timestamp", "1700000000000"),
                ("delay", "0"),
            ]),
        )
        .unwrap();
        assert!(record.attempts_made.is_none());
        assert_eq!(record.opts_attempts(), Some(3));
    }

    #[test]
    fn test_atm_wins_over_attempts_made() {
        let record =
            JobRecord::from_hash("3", hash(&[("atm", "4"), ("attemptsMade", "1")])).unwrap();
        assert_eq!(record.attempts_made, Some(4));
    }

    #[test]
    fn test_empty_fields_are_absent() {
        let record = JobRecord::from_hash(
            "1",
            hash(&[("name", "x"), ("processedOn", ""), ("failedReason", "")]),
        )
        .unwrap();
        assert!(record.processed_on.is_none());
        assert!(record.failed_reason.is_none());
    }

    #[test]
    fn test_garbage_numbers_are_absent() {
        let record = JobRecord::from_hash(
            "1",
            hash(&[("timestamp", "soon"), ("attemptsMade", "-1")]),
        )
        .unwrap();
        assert!(record.timestamp.is_none());
        assert!(record.attempts_made.is_none());
    }

    #[test]
    fn test_configured_delay_prefers_opts() {
        let record = JobRecord::new("1").with_opts(&json!({"delay": 5000}));
        assert_eq!(record.configured_delay(), Some(5000));

        let mut record = JobRecord::new("2");
        record.delay = Some(750);
        assert_eq!(record.configured_delay(), Some(750));
    }

    #[test]
    fn test_malformed_opts_ignored() {
        let mut record = JobRecord::new("1");
        record.opts = Some("{not json".to_string());
        assert!(record.opts_attempts().is_none());
        assert!(record.configured_delay().is_none());
    }
}
