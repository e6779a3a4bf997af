pub mod metrics;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use metrics::{count_high_complexity, find_max_complexity, round_to_tenth};

/// Opaque revision identifier as handed out by the VCS adapter (hash, number, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RevisionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&RevisionId> for RevisionId {
    fn from(value: &RevisionId) -> Self {
        value.clone()
    }
}

/// A historical state of the repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revision {
    pub id: RevisionId,
    pub date: DateTime<Utc>,
}

impl Revision {
    pub fn new(id: impl Into<RevisionId>, date: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            date,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodComplexity {
    pub name: String,
    pub complexity: f64,
}

/// Complexity figures extracted from one analyzer run.
///
/// `total_complexity` and `average_complexity` stay `None` when the report
/// had no summary line for them; callers treat that as "not computable".
/// `method_complexity` keeps the order the analyzer printed symbols in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_complexity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_complexity: Option<f64>,
    #[serde(default)]
    pub method_complexity: Vec<MethodComplexity>,
}

impl ComplexityReport {
    /// True when no recognizable line was found.
    pub fn is_empty(&self) -> bool {
        self.total_complexity.is_none()
            && self.average_complexity.is_none()
            && self.method_complexity.is_empty()
    }
}

/// One entry of the working-tree complexity report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    #[serde(flatten)]
    pub report: ComplexityReport,
}

/// A [`ComplexityReport`] annotated with the revision it was computed for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub revision: RevisionId,
    #[serde(with = "iso_millis")]
    pub date: DateTime<Utc>,
    pub path: String,
    #[serde(flatten)]
    pub report: ComplexityReport,
    /// Set only on placeholder records for revisions that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrendRecord {
    pub fn new(revision: &Revision, path: impl Into<String>, report: ComplexityReport) -> Self {
        Self {
            revision: revision.id.clone(),
            date: revision.date,
            path: path.into(),
            report,
            error: None,
        }
    }

    pub fn placeholder(revision: &Revision, path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            revision: revision.id.clone(),
            date: revision.date,
            path: path.into(),
            report: ComplexityReport::default(),
            error: Some(error.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// ISO-8601 timestamps in UTC with millisecond precision (`2015-04-29T23:00:00.000Z`).
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(date: &DateTime<Utc>) -> String {
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|date| date.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn revision() -> Revision {
        Revision::new("123", Utc.with_ymd_and_hms(2015, 4, 29, 23, 0, 0).unwrap())
    }

    #[test]
    fn trend_record_serializes_with_camel_case_keys() {
        let record = TrendRecord::new(
            &revision(),
            "test_abs.rb",
            ComplexityReport {
                total_complexity: Some(22.0),
                average_complexity: Some(7.3),
                method_complexity: vec![MethodComplexity {
                    name: "main#none".into(),
                    complexity: 18.6,
                }],
            },
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "revision": "123",
                "date": "2015-04-29T23:00:00.000Z",
                "path": "test_abs.rb",
                "totalComplexity": 22.0,
                "averageComplexity": 7.3,
                "methodComplexity": [{ "name": "main#none", "complexity": 18.6 }]
            })
        );
    }

    #[test]
    fn missing_summary_values_are_omitted() {
        let report = ComplexityReport {
            total_complexity: None,
            average_complexity: None,
            method_complexity: vec![],
        };
        let value = serde_json::to_value(FileReport {
            path: "a.rb".into(),
            report,
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({ "path": "a.rb", "methodComplexity": [] }));
    }

    #[test]
    fn placeholder_round_trips_through_json() {
        let record = TrendRecord::placeholder(&revision(), "x.rb", "exit status 2");
        let text = serde_json::to_string(&record).unwrap();
        let back: TrendRecord = serde_json::from_str(&text).unwrap();
        assert!(back.is_placeholder());
        assert_eq!(back, record);
    }

    #[test]
    fn empty_report_detection() {
        assert!(ComplexityReport::default().is_empty());
        let report = ComplexityReport {
            total_complexity: Some(1.0),
            ..Default::default()
        };
        assert!(!report.is_empty());
    }
}
