use crate::{CaseOutcome, RunRecord};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Reasons a single upstream record is rejected
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Missing required field `{0}`")]
    MissingField(&'static str),
    #[error("Field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("Field `{field}` must not be negative, got {value}")]
    NegativeValue { field: &'static str, value: i64 },
    #[error("Passed count {passed} exceeds total {total}")]
    PassedExceedsTotal { passed: u64, total: u64 },
    #[error("Invalid timestamp `{value}`: {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },
    #[error("Malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A run record as it arrives from upstream, before validation
///
/// Both the camelCase names used by the reporting API and the snake_case names written by the
/// result store are accepted. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRunRecord {
    pub id: Option<String>,
    #[serde(alias = "suite_id")]
    pub suite_id: Option<String>,
    pub model: Option<String>,
    pub timestamp: Option<String>,
    pub revision: Option<i64>,
    pub passed: Option<i64>,
    pub total: Option<i64>,
    #[serde(alias = "system_prompt_name")]
    pub system_prompt_name: Option<String>,
    #[serde(alias = "system_prompt_version")]
    pub system_prompt_version: Option<String>,
    #[serde(alias = "git_commit_hash")]
    pub git_commit_hash: Option<String>,
    #[serde(default, alias = "results")]
    pub cases: Vec<CaseOutcome>,
}

impl TryFrom<RawRunRecord> for RunRecord {
    type Error = RecordError;

    fn try_from(raw: RawRunRecord) -> Result<Self, Self::Error> {
        let id = raw.id.ok_or(RecordError::MissingField("id"))?;
        let suite_id = raw.suite_id.ok_or(RecordError::MissingField("suiteId"))?;
        let model = raw.model.ok_or(RecordError::MissingField("model"))?;
        let timestamp = parse_timestamp(
            &raw
                .timestamp
                .ok_or(RecordError::MissingField("timestamp"))?,
        )?;

        let (passed, total) = match (raw.passed, raw.total) {
            (Some(passed), Some(total)) => (
                non_negative("passed", passed)?,
                non_negative("total", total)?,
            ),
            // Older store entries only carry the per-case results
            (None, None) if !raw.cases.is_empty() => (
                raw.cases.iter().filter(|case| case.passed).count() as u64,
                raw.cases.len() as u64,
            ),
            (None, _) => return Err(RecordError::MissingField("passed")),
            (_, None) => return Err(RecordError::MissingField("total")),
        };

        let mut record = RunRecord::new(id, suite_id, model, timestamp, passed, total)?;
        if let Some(revision) = raw.revision {
            record = record.with_revision(non_negative("revision", revision)?);
        }
        if let Some(name) = raw.system_prompt_name {
            record = record.with_system_prompt(name, raw.system_prompt_version);
        }
        if let Some(hash) = raw.git_commit_hash {
            record = record.with_git_commit_hash(hash);
        }

        Ok(record.with_cases(raw.cases))
    }
}

impl RunRecord {
    /// Validate a single upstream JSON value into a run record
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        let raw: RawRunRecord = serde_json::from_value(value)?;
        RunRecord::try_from(raw)
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, RecordError> {
    u64::try_from(value).map_err(|_| RecordError::NegativeValue { field, value })
}

/// Parse an RFC 3339 timestamp, reading a timestamp without an offset as UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RecordError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(timestamp) => Ok(timestamp.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|source| RecordError::InvalidTimestamp {
                value: value.to_string(),
                source,
            }),
    }
}
