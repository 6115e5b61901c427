use crate::compare::{CaseChange, RunComparison};
use crate::report::SuiteReport;
use eval_trend_model::RunRecord;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SuiteRow {
    #[tabled(rename = "Suite")]
    suite: String,
    #[tabled(rename = "Runs")]
    total_runs: usize,
    #[tabled(rename = "Avg pass rate", display = "percent")]
    average_pass_rate: f64,
    #[tabled(rename = "Latest")]
    latest_pass_rate: String,
    #[tabled(rename = "Delta")]
    delta: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Rev")]
    order_key: String,
    #[tabled(rename = "Run")]
    run_id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Pass rate", display = "percent")]
    pass_rate: f64,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Commit")]
    commit: String,
}

#[derive(Tabled)]
struct CaseRow {
    #[tabled(rename = "Case")]
    case_id: String,
    #[tabled(rename = "Baseline")]
    baseline: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Change")]
    change: String,
}

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "Run")]
    id: String,
    #[tabled(rename = "Suite")]
    suite_id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Rev")]
    revision: String,
    #[tabled(rename = "Passed")]
    passed: String,
    #[tabled(rename = "Completed")]
    timestamp: String,
}

fn percent(n: &f64) -> String {
    format!("{:.1}%", n)
}

fn signed(n: f64) -> String {
    format!("{:+.1}", n)
}

fn or_na<T, F: FnOnce(T) -> String>(value: Option<T>, f: F) -> String {
    value.map(f).unwrap_or_else(|| "N/A".to_string())
}

fn render<R: Tabled>(rows: Vec<R>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

/// One row per suite with its summary figures
pub fn suite_table(reports: &[SuiteReport]) -> String {
    render(
        reports
            .iter()
            .map(|report| SuiteRow {
                suite: match &report.configuration {
                    Some(configuration) => {
                        format!("{} ({})", report.suite_id, configuration.model)
                    }
                    None => report.suite_id.clone(),
                },
                total_runs: report.summary.total_runs,
                average_pass_rate: report.summary.average_pass_rate,
                latest_pass_rate: or_na(report.summary.latest_pass_rate, |r| percent(&r)),
                delta: or_na(report.summary.delta, signed),
                status: or_na(report.summary.delta_status, |s| s.label().to_string()),
            })
            .collect(),
    )
}

/// The trend series of a single suite
pub fn trend_table(report: &SuiteReport) -> String {
    render(
        report
            .series
            .iter()
            .map(|point| TrendRow {
                order_key: format!("r{}", point.order_key),
                run_id: point.run_id.clone(),
                model: point.model.clone(),
                pass_rate: point.pass_rate,
                change: or_na(point.change_from_previous, signed),
                status: point.status.label().to_string(),
                commit: point
                    .git_commit_hash
                    .clone()
                    .unwrap_or_else(|| "N/A".to_string()),
            })
            .collect(),
    )
}

pub fn comparison_table(comparison: &RunComparison) -> String {
    fn outcome(passed: Option<bool>, score: Option<f64>) -> String {
        let state = match passed {
            Some(true) => "PASS",
            Some(false) => "FAIL",
            None => return "-".to_string(),
        };
        match score {
            Some(score) => format!("{state} ({score:.1})"),
            None => state.to_string(),
        }
    }

    render(
        comparison
            .cases
            .iter()
            .map(|case| CaseRow {
                case_id: case.case_id.clone(),
                baseline: outcome(case.baseline_passed, case.baseline_score),
                current: outcome(case.current_passed, case.current_score),
                change: match case.change {
                    CaseChange::Regression => "REGRESSION",
                    CaseChange::Improvement => "IMPROVEMENT",
                    CaseChange::Unchanged => "UNCHANGED",
                }
                .to_string(),
            })
            .collect(),
    )
}

/// Runs in the order given
pub fn runs_table(runs: &[&RunRecord]) -> String {
    render(
        runs.iter()
            .map(|run| RunRow {
                id: run.id().to_string(),
                suite_id: run.suite_id().to_string(),
                model: run.model().to_string(),
                revision: or_na(run.revision(), |r| r.to_string()),
                passed: format!("{}/{}", run.passed(), run.total()),
                timestamp: run.timestamp().format("%Y-%m-%d %H:%M").to_string(),
            })
            .collect(),
    )
}
