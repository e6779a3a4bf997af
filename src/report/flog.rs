//! Parser for `flog`-style score reports.
//!
//! ```text
//!     22.0: flog total
//!      7.3: flog/method average
//!
//!     18.6: main#none
//!      1.7: chain#linking_to          /absolute/path/test_file1.rb:8
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use super::ReportParser;
use crate::core::{round_to_tenth, ComplexityReport, MethodComplexity};

static SCORE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*:\s*(.*?)\s*$").expect("score line pattern is valid")
});
static TOTAL_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+ total$").expect("total label pattern is valid"));
static AVERAGE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+/method average$").expect("average label pattern is valid"));

#[derive(Debug, Clone, Copy, Default)]
pub struct FlogReportParser;

enum Line<'a> {
    Total(f64),
    Average(f64),
    Method(&'a str, f64),
}

fn classify(line: &str) -> Option<Line<'_>> {
    let captures = SCORE_LINE.captures(line)?;
    let score = round_to_tenth(captures.get(1)?.as_str().parse::<f64>().ok()?);
    let label = captures.get(2)?.as_str();

    if TOTAL_LABEL.is_match(label) {
        Some(Line::Total(score))
    } else if AVERAGE_LABEL.is_match(label) {
        Some(Line::Average(score))
    } else if label.is_empty() {
        None
    } else {
        Some(Line::Method(label, score))
    }
}

impl ReportParser for FlogReportParser {
    fn name(&self) -> &'static str {
        "flog"
    }

    fn parse(&self, raw: &str) -> ComplexityReport {
        let mut report = ComplexityReport::default();

        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            match classify(line) {
                Some(Line::Total(score)) => report.total_complexity = Some(score),
                Some(Line::Average(score)) => report.average_complexity = Some(score),
                Some(Line::Method(name, score)) => report.method_complexity.push(MethodComplexity {
                    name: name.to_string(),
                    complexity: score,
                }),
                None => log::trace!("Skipping unrecognized report line: {:?}", line),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn method(name: &str, complexity: f64) -> MethodComplexity {
        MethodComplexity {
            name: name.to_string(),
            complexity,
        }
    }

    #[test]
    fn parses_summary_and_methods() {
        let raw = "\t22.0: flog total\n\
                   \t 7.3: flog/method average\n\
                   \n\
                   \t18.6: main#none\n\
                   \t 1.7: chain#linking_to          /absolute/path/test_file1.rb:8\n";

        let report = FlogReportParser.parse(raw);

        assert_eq!(
            report,
            ComplexityReport {
                total_complexity: Some(22.0),
                average_complexity: Some(7.3),
                method_complexity: vec![
                    method("main#none", 18.6),
                    method("chain#linking_to          /absolute/path/test_file1.rb:8", 1.7),
                ],
            }
        );
    }

    #[test]
    fn keeps_insertion_order_rather_than_score_order() {
        let raw = "1.0: a#small\n9.0: b#large\n5.0: c#medium";
        let names: Vec<_> = FlogReportParser
            .parse(raw)
            .method_complexity
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["a#small", "b#large", "c#medium"]);
    }

    #[test]
    fn missing_summary_lines_stay_undefined() {
        let report = FlogReportParser.parse("\t26.2: Module::TestFile2#test_method /x.rb:54");
        assert_eq!(report.total_complexity, None);
        assert_eq!(report.average_complexity, None);
        assert_eq!(report.method_complexity.len(), 1);
    }

    #[test]
    fn scores_are_rounded_to_one_decimal() {
        let report = FlogReportParser.parse("  12.345: flog total\n  3.96: flog/method average");
        assert_eq!(report.total_complexity, Some(12.3));
        assert_eq!(report.average_complexity, Some(4.0));
    }

    #[test]
    fn garbage_yields_an_empty_report() {
        let report = FlogReportParser.parse("ruby: command not found\n\nno scores here");
        assert!(report.is_empty());
    }

    #[test]
    fn label_with_total_suffix_but_spaces_is_a_method() {
        let report = FlogReportParser.parse("4.0: Foo#bar grand total");
        assert_eq!(report.total_complexity, None);
        assert_eq!(report.method_complexity, vec![method("Foo#bar grand total", 4.0)]);
    }
}
