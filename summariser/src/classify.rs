use crate::config::Thresholds;
use eval_trend_model::RunRecord;
use serde::{Deserialize, Serialize};

/// Classification of a single point in a trend series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Improvement,
    MinorRegression,
    MajorRegression,
    Neutral,
}

/// Classification of the latest change of a suite
///
/// This is the coarse form of [Status] used in suite summaries, both regression kinds collapse
/// into [DeltaStatus::Regression].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaStatus {
    Improvement,
    Regression,
    NoChange,
}

impl Thresholds {
    /// Classify a pass rate change, in percentage points
    ///
    /// No change at all, meaning there was no previous run, is [Status::Neutral].
    pub fn classify(&self, change: Option<f64>) -> Status {
        let Some(change) = change else {
            return Status::Neutral;
        };

        // Major must be checked first, any major regression is also below the minor threshold.
        if change >= self.improvement() {
            Status::Improvement
        } else if change <= self.major_regression() {
            Status::MajorRegression
        } else if change <= self.minor_regression() {
            Status::MinorRegression
        } else {
            Status::Neutral
        }
    }

    /// Classify a suite level delta
    pub fn classify_delta(&self, delta: Option<f64>) -> Option<DeltaStatus> {
        delta.map(|delta| match self.classify(Some(delta)) {
            Status::Improvement => DeltaStatus::Improvement,
            Status::MinorRegression | Status::MajorRegression => DeltaStatus::Regression,
            Status::Neutral => DeltaStatus::NoChange,
        })
    }
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Improvement => "improvement",
            Status::MinorRegression => "minor regression",
            Status::MajorRegression => "major regression",
            Status::Neutral => "neutral",
        }
    }
}

impl DeltaStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeltaStatus::Improvement => "improvement",
            DeltaStatus::Regression => "regression",
            DeltaStatus::NoChange => "no change",
        }
    }
}

/// Signed change in pass rate from `previous` to `current`, in percentage points
///
/// The change is computed from the counts with a single division, so a change that is a whole
/// number of percentage points is exact. Subtracting two rounded pass rates is not, and can put
/// a change of exactly `-5` on the wrong side of a threshold.
///
/// Returns [None] if there is no previous run or either run has no pass rate.
pub(crate) fn change(previous: Option<&RunRecord>, current: &RunRecord) -> Option<f64> {
    let previous = previous?;
    if !previous.has_pass_rate() || !current.has_pass_rate() {
        return None;
    }

    let numerator = 100
        * (i128::from(current.passed()) * i128::from(previous.total())
            - i128::from(previous.passed()) * i128::from(current.total()));
    let denominator = i128::from(previous.total()) * i128::from(current.total());

    Some(numerator as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn counts(passed: u64, total: u64) -> RunRecord {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        RunRecord::new("run", "suite", "model", timestamp, passed, total).unwrap()
    }

    #[test]
    fn change_between_fractional_rates_is_exact() {
        let (high, low) = (counts(23, 35), counts(17, 28));
        assert_eq!(Some(-5.0), change(Some(&high), &low));
        assert_eq!(Some(5.0), change(Some(&low), &high));
        assert_eq!(Some(-10.0), change(Some(&counts(1, 3)), &counts(7, 30)));

        // The same changes from subtracted rates miss the thresholds
        let rate = |run: &RunRecord| run.pass_rate().unwrap();
        assert_ne!(-5.0, rate(&low) - rate(&high));
    }

    #[test]
    fn change_needs_two_rated_runs() {
        assert_eq!(None, change(None, &counts(1, 2)));
        assert_eq!(None, change(Some(&counts(0, 0)), &counts(1, 2)));
        assert_eq!(None, change(Some(&counts(1, 2)), &counts(0, 0)));
    }

    #[test]
    fn classifies_changes_at_fractional_boundaries() {
        let thresholds = Thresholds::default();
        let (high, low) = (counts(23, 35), counts(17, 28));

        assert_eq!(
            Status::MinorRegression,
            thresholds.classify(change(Some(&high), &low))
        );
        assert_eq!(
            Status::Improvement,
            thresholds.classify(change(Some(&low), &high))
        );
        assert_eq!(
            Status::MajorRegression,
            thresholds.classify(change(Some(&counts(1, 3)), &counts(7, 30)))
        );
    }

    #[test]
    fn classifies_boundary_values() {
        let thresholds = Thresholds::default();

        assert_eq!(Status::Improvement, thresholds.classify(Some(5.0)));
        assert_eq!(Status::Neutral, thresholds.classify(Some(4.999)));
        assert_eq!(Status::Neutral, thresholds.classify(Some(0.0)));
        assert_eq!(Status::Neutral, thresholds.classify(Some(-4.999)));
        assert_eq!(Status::MinorRegression, thresholds.classify(Some(-5.0)));
        assert_eq!(Status::MinorRegression, thresholds.classify(Some(-9.999)));
        assert_eq!(Status::MajorRegression, thresholds.classify(Some(-10.0)));
        assert_eq!(Status::MajorRegression, thresholds.classify(Some(-10.0001)));
        assert_eq!(Status::Neutral, thresholds.classify(None));
    }

    #[test]
    fn large_drop_is_major_not_minor() {
        assert_eq!(
            Status::MajorRegression,
            Thresholds::default().classify(Some(-15.0))
        );
    }

    #[test]
    fn uses_configured_thresholds() -> anyhow::Result<()> {
        let thresholds = Thresholds::new(1.0, -2.0, -3.0)?;

        assert_eq!(Status::Improvement, thresholds.classify(Some(1.0)));
        assert_eq!(Status::MinorRegression, thresholds.classify(Some(-2.5)));
        assert_eq!(Status::MajorRegression, thresholds.classify(Some(-3.0)));
        Ok(())
    }

    #[test]
    fn equal_regression_thresholds_are_always_major() -> anyhow::Result<()> {
        let thresholds = Thresholds::new(5.0, -5.0, -5.0)?;
        assert_eq!(Status::MajorRegression, thresholds.classify(Some(-5.0)));
        Ok(())
    }

    #[test]
    fn collapses_regressions_for_deltas() {
        let thresholds = Thresholds::default();

        assert_eq!(None, thresholds.classify_delta(None));
        assert_eq!(
            Some(DeltaStatus::Regression),
            thresholds.classify_delta(Some(-6.0))
        );
        assert_eq!(
            Some(DeltaStatus::Regression),
            thresholds.classify_delta(Some(-20.0))
        );
        assert_eq!(
            Some(DeltaStatus::NoChange),
            thresholds.classify_delta(Some(0.0))
        );
        assert_eq!(
            Some(DeltaStatus::Improvement),
            thresholds.classify_delta(Some(10.0))
        );
    }

    #[test]
    fn serializes_snake_case() -> anyhow::Result<()> {
        assert_eq!(
            "\"major_regression\"",
            serde_json::to_string(&Status::MajorRegression)?
        );
        assert_eq!("\"no_change\"", serde_json::to_string(&DeltaStatus::NoChange)?);
        Ok(())
    }
}
