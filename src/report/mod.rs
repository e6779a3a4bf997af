//! Analyzer report parsing.
//!
//! The aggregator only ever sees [`ComplexityReport`]s; the text format of a
//! particular analyzer stays behind [`ReportParser`].

pub mod flog;

use crate::core::ComplexityReport;
use crate::errors::{Error, Result};

pub use flog::FlogReportParser;

/// Converts the complete text output of one analyzer run into a report.
pub trait ReportParser: Send + Sync {
    /// Name used to select the parser from configuration.
    fn name(&self) -> &'static str;

    /// Parse a full report. Unrecognized lines are skipped, so wholly
    /// unparseable text yields an empty report rather than an error.
    fn parse(&self, raw: &str) -> ComplexityReport;

    /// Parse raw analyzer output; fails only when it is not valid UTF-8.
    fn parse_bytes(&self, raw: &[u8]) -> Result<ComplexityReport> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| Error::Parse(format!("{} output is not valid UTF-8: {}", self.name(), e)))?;
        Ok(self.parse(text))
    }
}

/// Look up a parser by its configured name.
pub fn parser_for(name: &str) -> Result<Box<dyn ReportParser>> {
    match name {
        "flog" => Ok(Box::new(FlogReportParser)),
        other => Err(Error::Configuration(format!(
            "Unknown report parser '{}' (available: flog)",
            other
        ))),
    }
}
