use crate::config::CompareConfig;
use eval_trend_model::{CaseOutcome, RunRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CompareError {
    #[error("Cannot compare runs from different suites: {baseline} vs {current}")]
    SuiteMismatch { baseline: String, current: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseChange {
    Regression,
    Improvement,
    Unchanged,
}

/// How a single case changed between two runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseComparison {
    pub case_id: String,
    pub baseline_passed: Option<bool>,
    pub current_passed: Option<bool>,
    pub baseline_score: Option<f64>,
    pub current_score: Option<f64>,
    pub change: CaseChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunComparison {
    pub baseline_run_id: String,
    pub current_run_id: String,
    pub cases: Vec<CaseComparison>,
    pub regressions: usize,
    pub improvements: usize,
    pub unchanged: usize,
}

/// Compare two runs of the same suite case by case
///
/// Every case id seen in either run is compared, in case id order. A case that went from pass to
/// fail is a regression and from fail to pass an improvement. When the pass state did not change,
/// a score change larger than the configured threshold in either direction counts instead. Cases
/// that only appear in one of the runs are unchanged.
pub fn compare_runs(
    baseline: &RunRecord,
    current: &RunRecord,
    config: &CompareConfig,
) -> Result<RunComparison, CompareError> {
    if baseline.suite_id() != current.suite_id() {
        return Err(CompareError::SuiteMismatch {
            baseline: baseline.suite_id().to_string(),
            current: current.suite_id().to_string(),
        });
    }

    let baseline_cases = by_case_id(baseline.cases());
    let current_cases = by_case_id(current.cases());
    let case_ids = baseline_cases
        .keys()
        .chain(current_cases.keys())
        .copied()
        .collect::<BTreeSet<_>>();

    if case_ids.is_empty() {
        log::warn!(
            "Neither run {} nor run {} has per-case results",
            baseline.id(),
            current.id()
        );
    }

    let mut comparison = RunComparison {
        baseline_run_id: baseline.id().to_string(),
        current_run_id: current.id().to_string(),
        cases: Vec::with_capacity(case_ids.len()),
        regressions: 0,
        improvements: 0,
        unchanged: 0,
    };

    for case_id in case_ids {
        let baseline_case = baseline_cases.get(case_id);
        let current_case = current_cases.get(case_id);
        let change = case_change(baseline_case, current_case, config.score_threshold());

        match change {
            CaseChange::Regression => comparison.regressions += 1,
            CaseChange::Improvement => comparison.improvements += 1,
            CaseChange::Unchanged => comparison.unchanged += 1,
        }

        comparison.cases.push(CaseComparison {
            case_id: case_id.to_string(),
            baseline_passed: baseline_case.map(|c| c.passed),
            current_passed: current_case.map(|c| c.passed),
            baseline_score: baseline_case.and_then(|c| c.score),
            current_score: current_case.and_then(|c| c.score),
            change,
        });
    }

    Ok(comparison)
}

fn by_case_id(cases: &[CaseOutcome]) -> BTreeMap<&str, &CaseOutcome> {
    cases.iter().map(|c| (c.case_id.as_str(), c)).collect()
}

fn case_change(
    baseline: Option<&&CaseOutcome>,
    current: Option<&&CaseOutcome>,
    score_threshold: f64,
) -> CaseChange {
    let (Some(baseline), Some(current)) = (baseline, current) else {
        return CaseChange::Unchanged;
    };

    match (baseline.passed, current.passed) {
        (true, false) => CaseChange::Regression,
        (false, true) => CaseChange::Improvement,
        _ => match (baseline.score, current.score) {
            (Some(before), Some(after)) if after - before < -score_threshold => {
                CaseChange::Regression
            }
            (Some(before), Some(after)) if after - before > score_threshold => {
                CaseChange::Improvement
            }
            _ => CaseChange::Unchanged,
        },
    }
}
