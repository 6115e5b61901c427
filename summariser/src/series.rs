use crate::aggregate::rated_sequence;
use crate::classify::{self, Status};
use crate::config::Thresholds;
use chrono::{DateTime, Utc};
use eval_trend_model::RunRecord;
use serde::{Deserialize, Serialize};

/// One run projected into a suite's trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// The id of the run this point was built from
    pub run_id: String,
    /// Position on the x-axis
    ///
    /// This is the run's revision. A run without one takes the previous point's key plus one, or
    /// `1` as the first point, which is its 1-based position in a suite without revisions.
    pub order_key: u64,
    pub revision: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub pass_rate: f64,
    /// Change from the previous point, in percentage points
    pub change_from_previous: Option<f64>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit_hash: Option<String>,
}

/// Build the trend series for a suite's runs
///
/// There is one point per run that has a pass rate, in sequence order. Runs with `total == 0`
/// have no point. Each point's change is relative to the point directly before it.
pub fn build_series(runs: &[RunRecord], thresholds: &Thresholds) -> Vec<TrendPoint> {
    let mut previous: Option<(&RunRecord, u64)> = None;

    rated_sequence(runs)
        .into_iter()
        .map(|(run, pass_rate)| {
            let change_from_previous = classify::change(previous.map(|(run, _)| run), run);
            let order_key = run
                .revision()
                .unwrap_or_else(|| previous.map_or(1, |(_, key)| key + 1));
            previous = Some((run, order_key));

            TrendPoint {
                run_id: run.id().to_string(),
                order_key,
                revision: run.revision(),
                timestamp: run.timestamp(),
                model: run.model().to_string(),
                pass_rate,
                change_from_previous,
                status: thresholds.classify(change_from_previous),
                system_prompt_name: run.system_prompt_name().map(str::to_string),
                system_prompt_version: run.system_prompt_version().map(str::to_string),
                git_commit_hash: run.git_commit_hash().map(str::to_string),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use chrono::{Duration, TimeZone};

    fn run(id: &str, revision: Option<u64>, minute: i64, passed: u64, total: u64) -> RunRecord {
        let timestamp =
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap() + Duration::minutes(minute);
        let run = RunRecord::new(id, "suite", "model", timestamp, passed, total).unwrap();
        match revision {
            Some(revision) => run.with_revision(revision),
            None => run,
        }
    }

    #[test]
    fn regression_scenario() {
        let runs = vec![
            run("r2", Some(2), 2, 9, 10),
            run("r1", Some(1), 1, 8, 10),
            run("r3", Some(3), 3, 7, 10),
        ];
        let series = build_series(&runs, &Thresholds::default());

        assert_eq!(
            vec!["r1", "r2", "r3"],
            series.iter().map(|p| p.run_id.as_str()).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![1, 2, 3],
            series.iter().map(|p| p.order_key).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![80.0, 90.0, 70.0],
            series.iter().map(|p| p.pass_rate).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![None, Some(10.0), Some(-20.0)],
            series
                .iter()
                .map(|p| p.change_from_previous)
                .collect::<Vec<_>>()
        );
        assert_eq!(
            vec![
                Status::Neutral,
                Status::Improvement,
                Status::MajorRegression
            ],
            series.iter().map(|p| p.status).collect::<Vec<_>>()
        );
    }

    #[test]
    fn agrees_with_summary() {
        let runs = vec![
            run("a", Some(1), 1, 3, 4),
            run("b", Some(2), 2, 1, 4),
            run("c", None, 3, 0, 0),
            run("d", Some(3), 4, 2, 4),
        ];
        let thresholds = Thresholds::default();
        let series = build_series(&runs, &thresholds);
        let summary = aggregate(&runs, &thresholds);

        let last = series.last().unwrap();
        assert_eq!(summary.latest_pass_rate, Some(last.pass_rate));
        assert_eq!(summary.delta, last.change_from_previous);
    }

    #[test]
    fn zero_total_runs_have_no_point() {
        let runs = vec![
            run("a", Some(1), 1, 8, 10),
            run("empty", Some(2), 2, 0, 0),
            run("b", Some(3), 3, 4, 10),
        ];
        let series = build_series(&runs, &Thresholds::default());

        assert_eq!(
            runs.iter().filter(|r| r.has_pass_rate()).count(),
            series.len()
        );
        assert_eq!("b", series[1].run_id);
        assert_eq!(Some(-40.0), series[1].change_from_previous);
    }

    #[test]
    fn missing_revisions_use_position() {
        let runs = vec![
            run("late", None, 20, 1, 2),
            run("early", None, 10, 2, 2),
        ];
        let series = build_series(&runs, &Thresholds::default());

        assert_eq!("early", series[0].run_id);
        assert_eq!(1, series[0].order_key);
        assert_eq!(None, series[0].revision);
        assert_eq!("late", series[1].run_id);
        assert_eq!(2, series[1].order_key);
        assert_eq!(Status::MajorRegression, series[1].status);
    }

    #[test]
    fn runs_without_revision_follow_the_previous_key() {
        let runs = vec![
            run("r10", Some(10), 1, 1, 2),
            run("r11", Some(11), 2, 1, 2),
            run("later", None, 3, 1, 2),
        ];
        let series = build_series(&runs, &Thresholds::default());

        assert_eq!(
            vec![10, 11, 12],
            series.iter().map(|p| p.order_key).collect::<Vec<_>>()
        );
    }

    #[test]
    fn exact_threshold_changes_between_fractional_rates() {
        let thresholds = Thresholds::default();

        let down = build_series(
            &[run("a", Some(1), 1, 23, 35), run("b", Some(2), 2, 17, 28)],
            &thresholds,
        );
        assert_eq!(Some(-5.0), down[1].change_from_previous);
        assert_eq!(Status::MinorRegression, down[1].status);

        let up = build_series(
            &[run("a", Some(1), 1, 17, 28), run("b", Some(2), 2, 23, 35)],
            &thresholds,
        );
        assert_eq!(Some(5.0), up[1].change_from_previous);
        assert_eq!(Status::Improvement, up[1].status);

        let major = build_series(
            &[run("a", Some(1), 1, 1, 3), run("b", Some(2), 2, 7, 30)],
            &thresholds,
        );
        assert_eq!(Some(-10.0), major[1].change_from_previous);
        assert_eq!(Status::MajorRegression, major[1].status);
    }

    #[test]
    fn carries_display_metadata() {
        let runs = vec![run("a", Some(7), 1, 1, 1)
            .with_system_prompt("concise", Some("v3".to_string()))
            .with_git_commit_hash("abc1234")];
        let series = build_series(&runs, &Thresholds::default());

        assert_eq!(7, series[0].order_key);
        assert_eq!(Some("concise".to_string()), series[0].system_prompt_name);
        assert_eq!(Some("v3".to_string()), series[0].system_prompt_version);
        assert_eq!(Some("abc1234".to_string()), series[0].git_commit_hash);
        assert_eq!("model", series[0].model);
    }

    #[test]
    fn empty_input() {
        assert!(build_series(&[], &Thresholds::default()).is_empty());
    }
}
