use crate::aggregate::{aggregate, SuiteSummary};
use crate::config::Thresholds;
use crate::filter::group_by_suite_and_config;
use crate::series::{build_series, TrendPoint};
use chrono::{DateTime, Utc};
use eval_trend_model::{RejectedRecord, RunRecord};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// The model and prompt configuration a trend was built for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub fingerprint: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_version: Option<String>,
}

/// Summary and trend of one suite, or of one configuration within a suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub suite_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,
    pub summary: SuiteSummary,
    pub series: Vec<TrendPoint>,
}

impl SuiteReport {
    pub fn new(suite_id: impl Into<String>, runs: &[RunRecord], thresholds: &Thresholds) -> Self {
        Self {
            suite_id: suite_id.into(),
            configuration: None,
            summary: aggregate(runs, thresholds),
            series: build_series(runs, thresholds),
        }
    }
}

/// Build one report per suite, in suite id order
pub fn summarise_suites(runs: &[RunRecord], thresholds: &Thresholds) -> Vec<SuiteReport> {
    runs.iter()
        .cloned()
        .into_group_map_by(|run| run.suite_id().to_string())
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(suite_id, runs)| {
            log::debug!("Summarising {} runs of suite {suite_id}", runs.len());
            SuiteReport::new(suite_id, &runs, thresholds)
        })
        .collect()
}

/// Build one report per configuration of each suite
///
/// Runs of the same suite are only compared with runs of the same model and system prompt.
pub fn summarise_configurations(
    runs: &[RunRecord],
    thresholds: &Thresholds,
) -> Vec<SuiteReport> {
    group_by_suite_and_config(runs)
        .into_iter()
        .filter_map(|((suite_id, fingerprint), runs)| {
            let first = runs.first()?;
            let configuration = Configuration {
                fingerprint,
                model: first.model().to_string(),
                system_prompt_name: first.system_prompt_name().map(str::to_string),
                system_prompt_version: first.system_prompt_version().map(str::to_string),
            };
            log::debug!(
                "Summarising {} runs of suite {suite_id} for {}",
                runs.len(),
                configuration.fingerprint
            );

            Some(SuiteReport {
                configuration: Some(configuration),
                ..SuiteReport::new(suite_id, &runs, thresholds)
            })
        })
        .collect()
}

/// The full output of a summariser invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub thresholds: Thresholds,
    pub rejected: Vec<RejectedRecord>,
    pub suites: Vec<SuiteReport>,
}

impl Report {
    pub fn new(
        thresholds: Thresholds,
        rejected: Vec<RejectedRecord>,
        suites: Vec<SuiteReport>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            thresholds,
            rejected,
            suites,
        }
    }

    pub fn write_to<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
