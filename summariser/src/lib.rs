//! Pass rate trends and regression classification for evaluation runs.
//!
//! Run records are put into a canonical order by [order], summarised per suite by [aggregate]
//! and projected into a plot ready series by [build_series]. Each point of the series and the
//! suite's latest change are classified against configurable [Thresholds].
//!
//! Everything here is a pure function of its input. There is no shared state, so the functions
//! can be called from any number of threads on independent inputs.

mod aggregate;
mod classify;
mod compare;
pub mod config;
pub mod filter;
mod report;
mod sequence;
mod series;
pub mod table;

pub use aggregate::{aggregate, SuiteSummary};
pub use classify::{DeltaStatus, Status};
pub use compare::{compare_runs, CaseChange, CaseComparison, CompareError, RunComparison};
pub use config::{CompareConfig, ConfigurationError, SummariserConfig, Thresholds};
pub use report::{summarise_configurations, summarise_suites, Configuration, Report, SuiteReport};
pub use sequence::order;
pub use series::{build_series, TrendPoint};
