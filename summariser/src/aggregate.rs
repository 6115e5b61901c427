use crate::classify::{self, DeltaStatus};
use crate::config::Thresholds;
use crate::sequence;
use eval_trend_model::RunRecord;
use serde::{Deserialize, Serialize};

/// Suite level summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSummary {
    /// Number of runs, including runs without any cases
    pub total_runs: usize,
    /// Mean pass rate over the runs that have a pass rate, `0` if there are none
    pub average_pass_rate: f64,
    /// Pass rate of the latest run that has one
    pub latest_pass_rate: Option<f64>,
    /// Change from the previous run to the latest run, in percentage points
    pub delta: Option<f64>,
    pub delta_status: Option<DeltaStatus>,
}

impl SuiteSummary {
    pub fn empty() -> Self {
        Self {
            total_runs: 0,
            average_pass_rate: 0.0,
            latest_pass_rate: None,
            delta: None,
            delta_status: None,
        }
    }
}

/// The ordered runs that have a pass rate, paired with that rate
pub(crate) fn rated_sequence<'a, I>(runs: I) -> Vec<(&'a RunRecord, f64)>
where
    I: IntoIterator<Item = &'a RunRecord>,
{
    sequence::order_refs(runs)
        .into_iter()
        .filter_map(|run| run.pass_rate().map(|rate| (run, rate)))
        .collect()
}

/// Summarise a suite's runs
///
/// Runs with `total == 0` count towards [SuiteSummary::total_runs] but are left out of every
/// pass rate figure. The latest and previous runs are the last two runs that have a pass rate.
pub fn aggregate(runs: &[RunRecord], thresholds: &Thresholds) -> SuiteSummary {
    if runs.is_empty() {
        return SuiteSummary::empty();
    }

    let rated = rated_sequence(runs);
    let excluded = runs.len() - rated.len();
    if excluded > 0 {
        log::debug!("Excluding {excluded} runs without cases from pass rate figures");
    }

    let average_pass_rate = if rated.is_empty() {
        0.0
    } else {
        rated.iter().map(|(_, rate)| rate).sum::<f64>() / rated.len() as f64
    };

    let mut latest_two = rated.iter().rev();
    let latest = latest_two.next();
    let previous = latest_two.next();
    let latest_pass_rate = latest.map(|(_, rate)| *rate);
    let delta =
        latest.and_then(|(latest, _)| classify::change(previous.map(|(run, _)| *run), latest));

    SuiteSummary {
        total_runs: runs.len(),
        average_pass_rate,
        latest_pass_rate,
        delta,
        delta_status: thresholds.classify_delta(delta),
    }
}
