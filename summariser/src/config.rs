use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_IMPROVEMENT_THRESHOLD: f64 = 5.0;
pub const DEFAULT_MINOR_REGRESSION_THRESHOLD: f64 = -5.0;
pub const DEFAULT_MAJOR_REGRESSION_THRESHOLD: f64 = -10.0;
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error(
        "Thresholds must satisfy major_regression <= minor_regression < 0 < improvement, \
         got improvement={improvement}, minor_regression={minor_regression}, \
         major_regression={major_regression}"
    )]
    ThresholdOrder {
        improvement: f64,
        minor_regression: f64,
        major_regression: f64,
    },
    #[error("Threshold `{0}` must be a finite number")]
    NonFinite(&'static str),
    #[error("Score threshold must be a finite, non-negative number, got {0}")]
    ScoreThreshold(f64),
}

/// Pass rate change thresholds, in percentage points
///
/// A value of this type always satisfies
/// `major_regression <= minor_regression < 0 < improvement`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds")]
pub struct Thresholds {
    improvement: f64,
    minor_regression: f64,
    major_regression: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
struct RawThresholds {
    improvement: f64,
    minor_regression: f64,
    major_regression: f64,
}

impl Default for RawThresholds {
    fn default() -> Self {
        Self {
            improvement: DEFAULT_IMPROVEMENT_THRESHOLD,
            minor_regression: DEFAULT_MINOR_REGRESSION_THRESHOLD,
            major_regression: DEFAULT_MAJOR_REGRESSION_THRESHOLD,
        }
    }
}

impl TryFrom<RawThresholds> for Thresholds {
    type Error = ConfigurationError;

    fn try_from(raw: RawThresholds) -> Result<Self, Self::Error> {
        Thresholds::new(raw.improvement, raw.minor_regression, raw.major_regression)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            improvement: DEFAULT_IMPROVEMENT_THRESHOLD,
            minor_regression: DEFAULT_MINOR_REGRESSION_THRESHOLD,
            major_regression: DEFAULT_MAJOR_REGRESSION_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn new(
        improvement: f64,
        minor_regression: f64,
        major_regression: f64,
    ) -> Result<Self, ConfigurationError> {
        for (name, value) in [
            ("improvement", improvement),
            ("minor_regression", minor_regression),
            ("major_regression", major_regression),
        ] {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFinite(name));
            }
        }

        if !(major_regression <= minor_regression
            && minor_regression < 0.0
            && 0.0 < improvement)
        {
            return Err(ConfigurationError::ThresholdOrder {
                improvement,
                minor_regression,
                major_regression,
            });
        }

        Ok(Self {
            improvement,
            minor_regression,
            major_regression,
        })
    }

    /// Replace any of the thresholds, validating the combined result
    pub fn with_overrides(
        &self,
        improvement: Option<f64>,
        minor_regression: Option<f64>,
        major_regression: Option<f64>,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            improvement.unwrap_or(self.improvement),
            minor_regression.unwrap_or(self.minor_regression),
            major_regression.unwrap_or(self.major_regression),
        )
    }

    pub fn improvement(&self) -> f64 {
        self.improvement
    }

    pub fn minor_regression(&self) -> f64 {
        self.minor_regression
    }

    pub fn major_regression(&self) -> f64 {
        self.major_regression
    }
}

/// Settings for case by case run comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCompareConfig")]
pub struct CompareConfig {
    score_threshold: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawCompareConfig {
    #[serde(default = "default_score_threshold")]
    score_threshold: f64,
}

fn default_score_threshold() -> f64 {
    DEFAULT_SCORE_THRESHOLD
}

impl TryFrom<RawCompareConfig> for CompareConfig {
    type Error = ConfigurationError;

    fn try_from(raw: RawCompareConfig) -> Result<Self, Self::Error> {
        CompareConfig::new(raw.score_threshold)
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

impl CompareConfig {
    pub fn new(score_threshold: f64) -> Result<Self, ConfigurationError> {
        if !score_threshold.is_finite() || score_threshold < 0.0 {
            return Err(ConfigurationError::ScoreThreshold(score_threshold));
        }

        Ok(Self { score_threshold })
    }

    /// The score change a passing case must exceed to count as a regression or improvement
    pub fn score_threshold(&self) -> f64 {
        self.score_threshold
    }
}

/// Summariser configuration, as loaded from a TOML file
///
/// Every section and key is optional, missing values take their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummariserConfig {
    pub thresholds: Thresholds,
    pub compare: CompareConfig,
}

impl SummariserConfig {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Invalid summariser configuration")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("In {}", path.display()))
    }
}
