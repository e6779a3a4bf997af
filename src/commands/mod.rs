//! CLI command implementations for codetrend operations.
//!
//! Available commands:
//! - **report**: Complexity report of the current working tree
//! - **trend**: Complexity of one file across a date range of history
//! - **init**: Write a default configuration file

pub mod init;
pub mod report;
pub mod trend;

pub use init::init_config;
pub use report::{build_report, handle_report, ReportConfig};
pub use trend::{handle_trend, summarize, TrendCommandConfig};
