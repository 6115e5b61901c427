use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha3::Digest;

mod io;
mod raw;

pub use io::{load_run_records, parse_run_records, validate_records, LoadedRuns, RejectedRecord};
pub use raw::{RawRunRecord, RecordError};

/// The outcome of a single test case within a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaseOutcome {
    /// The id of the test case, unique within its suite
    #[serde(alias = "case_id")]
    pub case_id: String,
    /// Whether the scorer accepted the response
    pub passed: bool,
    /// The score assigned by the scorer, if it produces one
    #[serde(default)]
    pub score: Option<f64>,
}

/// One completed evaluation run of a suite
///
/// Records are validated when they are constructed, either through [RunRecord::new] or when
/// deserialized, so `passed <= total` always holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "RawRunRecord")]
pub struct RunRecord {
    id: String,
    suite_id: String,
    model: String,
    timestamp: DateTime<Utc>,
    revision: Option<u64>,
    passed: u64,
    total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_commit_hash: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cases: Vec<CaseOutcome>,
}

impl RunRecord {
    /// Create a new run record
    ///
    /// Fails if `id` or `suite_id` is empty or if `passed` is greater than `total`.
    pub fn new(
        id: impl Into<String>,
        suite_id: impl Into<String>,
        model: impl Into<String>,
        timestamp: DateTime<Utc>,
        passed: u64,
        total: u64,
    ) -> Result<Self, RecordError> {
        let id = id.into();
        let suite_id = suite_id.into();
        if id.is_empty() {
            return Err(RecordError::EmptyField("id"));
        }
        if suite_id.is_empty() {
            return Err(RecordError::EmptyField("suiteId"));
        }
        if passed > total {
            return Err(RecordError::PassedExceedsTotal { passed, total });
        }

        Ok(Self {
            id,
            suite_id,
            model: model.into(),
            timestamp,
            revision: None,
            passed,
            total,
            system_prompt_name: None,
            system_prompt_version: None,
            git_commit_hash: None,
            cases: Vec::with_capacity(0),
        })
    }

    /// Set the revision of the code and prompts under test
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Set the system prompt name and, optionally, its version
    pub fn with_system_prompt(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.system_prompt_name = Some(name.into());
        self.system_prompt_version = version;
        self
    }

    pub fn with_git_commit_hash(mut self, hash: impl Into<String>) -> Self {
        self.git_commit_hash = Some(hash.into());
        self
    }

    /// Attach per-case outcomes
    ///
    /// The case list is only used when comparing two runs. It does not change `passed` or
    /// `total`.
    pub fn with_cases(mut self, cases: Vec<CaseOutcome>) -> Self {
        self.cases = cases;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn suite_id(&self) -> &str {
        &self.suite_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The revision, if the run was recorded with one
    ///
    /// Revision `0` is a real revision and is never treated as missing.
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    pub fn passed(&self) -> u64 {
        self.passed
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn system_prompt_name(&self) -> Option<&str> {
        self.system_prompt_name.as_deref()
    }

    pub fn system_prompt_version(&self) -> Option<&str> {
        self.system_prompt_version.as_deref()
    }

    pub fn git_commit_hash(&self) -> Option<&str> {
        self.git_commit_hash.as_deref()
    }

    pub fn cases(&self) -> &[CaseOutcome] {
        &self.cases
    }

    /// Whether a pass rate can be computed for this run
    pub fn has_pass_rate(&self) -> bool {
        self.total > 0
    }

    /// The pass rate as a percentage in `0..=100`
    ///
    /// Returns [None] for a run with no cases, which has no meaningful pass rate.
    pub fn pass_rate(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }

        Some(100.0 * self.passed as f64 / self.total as f64)
    }

    /// Compute a fingerprint for the configuration this run evaluated
    ///
    /// The fingerprint is intended to identify runs that are comparable with each other. It uses
    /// the
    ///     - Suite id
    ///     - Model
    ///     - System prompt name
    ///     - System prompt version
    ///
    /// The revision and commit are not part of the fingerprint.
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.suite_id.as_bytes());
        Digest::update(&mut hasher, [0u8]);
        Digest::update(&mut hasher, self.model.as_bytes());
        Digest::update(&mut hasher, [0u8]);
        if let Some(name) = &self.system_prompt_name {
            Digest::update(&mut hasher, name.as_bytes());
        }
        Digest::update(&mut hasher, [0u8]);
        if let Some(version) = &self.system_prompt_version {
            Digest::update(&mut hasher, version.as_bytes());
        }

        format!("{:x}", hasher.finalize())
    }
}
