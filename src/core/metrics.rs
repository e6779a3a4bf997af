use super::ComplexityReport;

/// Round to one decimal place, the precision analyzer scores are reported in.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Highest per-method score in a report, if any method was listed.
pub fn find_max_complexity(report: &ComplexityReport) -> Option<f64> {
    report
        .method_complexity
        .iter()
        .map(|m| m.complexity)
        .fold(None, |max, c| match max {
            Some(m) if m >= c => Some(m),
            _ => Some(c),
        })
}

/// Count methods whose score is strictly above the threshold
pub fn count_high_complexity(report: &ComplexityReport, threshold: f64) -> usize {
    report
        .method_complexity
        .iter()
        .filter(|m| m.complexity > threshold)
        .count()
}
