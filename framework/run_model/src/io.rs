use crate::RunRecord;
use anyhow::Context;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A record that failed validation and was skipped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RejectedRecord {
    /// 1-based line number for JSON lines input, 1-based element index for a JSON array
    pub position: usize,
    /// The record id, when the record had one
    pub id: Option<String>,
    pub reason: String,
}

/// The result of loading a batch of run records
///
/// Invalid records are rejected one by one, they never fail the whole batch.
#[derive(Debug, Clone, Default)]
pub struct LoadedRuns {
    pub records: Vec<RunRecord>,
    pub rejected: Vec<RejectedRecord>,
}

/// Validate a batch of upstream JSON values
///
/// Each value that does not form a valid [RunRecord] is recorded in [LoadedRuns::rejected] and
/// logged.
pub fn validate_records<I>(values: I) -> LoadedRuns
where
    I: IntoIterator<Item = (usize, serde_json::Value)>,
{
    let mut loaded = LoadedRuns::default();
    for (position, value) in values {
        let id = value
            .get("id")
            .and_then(|id| id.as_str())
            .map(|id| id.to_string());

        match RunRecord::from_value(value) {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                log::warn!("Skipping run record at position {position} ({id:?}): {e}");
                loaded.rejected.push(RejectedRecord {
                    position,
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }

    for id in loaded.records.iter().map(|r| r.id()).duplicates() {
        log::warn!("Run id {id} appears more than once");
    }

    loaded
}

/// Parse run records from either a JSON array document or JSON lines
///
/// JSON lines hold one record per line. A line that is not valid JSON is rejected like any other
/// malformed record. A JSON array document must be valid JSON as a whole.
pub fn parse_run_records(content: &str) -> anyhow::Result<LoadedRuns> {
    if content.trim_start().starts_with('[') {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(content).context("Run records are not a valid JSON array")?;
        return Ok(validate_records(
            values.into_iter().enumerate().map(|(i, v)| (i + 1, v)),
        ));
    }

    let mut values = Vec::new();
    let mut unparsed = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => values.push((i + 1, value)),
            Err(e) => {
                log::warn!("Skipping unparseable run record on line {}: {e}", i + 1);
                unparsed.push(RejectedRecord {
                    position: i + 1,
                    id: None,
                    reason: format!("Malformed record: {e}"),
                });
            }
        }
    }

    let mut loaded = validate_records(values);
    loaded.rejected.extend(unparsed);
    loaded.rejected.sort_by_key(|r| r.position);
    Ok(loaded)
}

/// Load run records from a file
///
/// See [parse_run_records] for the accepted formats.
pub fn load_run_records(path: &Path) -> anyhow::Result<LoadedRuns> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run records from {}", path.display()))?;
    parse_run_records(&content)
}
