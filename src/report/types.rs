use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Outcome of a single test as reported by the runner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    TimedOut,
    Skipped,
    Interrupted,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::TimedOut => "timedOut",
            TestStatus::Skipped => "skipped",
            TestStatus::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value tag attached to a test case by the authoring layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Annotation {
    pub fn new(kind: &str, description: Option<&str>) -> Self {
        Self {
            kind: kind.to_string(),
            description: description.map(str::to_string),
        }
    }
}

/// Identity of a test: its hierarchical title and annotations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Title segments from the outermost suite down to the test title
    pub title_path: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl TestCase {
    pub fn new<I, S>(title_path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title_path: title_path.into_iter().map(Into::into).collect(),
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Error raised while running a test. Stored in the report verbatim:
/// fields without a named slot are kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TestError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ErrorLocation>,
    /// Error that caused this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<TestError>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TestError {
    pub fn message(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Default::default()
        }
    }
}

/// File artifact produced by a test (screenshot, video, trace...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Attachment {
    pub fn file(name: &str, content_type: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            path: Some(path.to_string()),
        }
    }
}

/// Result of one test execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub status: TestStatus,
    /// Wall time in milliseconds; fractional values are kept to the nanosecond
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    #[serde(default)]
    pub errors: Vec<TestError>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TestResult {
    pub fn new(status: TestStatus, duration: Duration) -> Self {
        Self {
            status,
            duration,
            errors: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Wrap into a handle shared between the runner and the reporter
    pub fn shared(self) -> SharedTestResult {
        Arc::new(RwLock::new(self))
    }
}

/// The runner keeps one clone of this handle and observes status changes
/// made by the reporter after recording.
pub type SharedTestResult = Arc<RwLock<TestResult>>;

/// JSON payload stored in `test_results.report`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestReport {
    pub test_name: String,
    pub otel_trace_id: String,
    pub errors: Vec<TestError>,
    pub screenshots: Vec<String>,
    pub video: Option<String>,
}

/// Interval literal for a duration, e.g. `"2500 milliseconds"` or
/// `"1234.6 milliseconds"`
pub fn format_millis(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    let (millis, rest) = (nanos / 1_000_000, nanos % 1_000_000);
    if rest == 0 {
        format!("{} milliseconds", millis)
    } else {
        let fraction = format!("{:06}", rest);
        format!("{}.{} milliseconds", millis, fraction.trim_end_matches('0'))
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = duration.as_nanos();
        if nanos % 1_000_000 == 0 {
            serializer.serialize_u64((nanos / 1_000_000) as u64)
        } else {
            serializer.serialize_f64(nanos as f64 / 1_000_000.0)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        // Runners may report fractional milliseconds
        let millis = f64::deserialize(deserializer)?;
        Ok(Duration::from_nanos((millis.max(0.0) * 1_000_000.0).round() as u64))
    }
}
