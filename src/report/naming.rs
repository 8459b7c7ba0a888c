use regex::Regex;
use std::sync::OnceLock;

use super::types::{TestCase, TestReport, TestResult};

const TRACE_ANNOTATION: &str = "otel_trace_id";
const EXPERIMENTAL_TAG: &str = "@experimental";

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"@[a-z0-9-]+").expect("valid tag regex"))
}

fn spaces_regex() -> &'static Regex {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    SPACES.get_or_init(|| Regex::new(r" +").expect("valid whitespace regex"))
}

/// Build the stored test name from a title path.
///
/// The outermost segment (project/file) is dropped, the rest joined with
/// `" / "`, inline `@tag` tokens removed and runs of spaces collapsed.
pub fn normalize_test_name(title_path: &[String]) -> String {
    let joined = title_path
        .iter()
        .skip(1)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" / ");

    let untagged = tag_regex().replace_all(&joined, "");
    spaces_regex().replace_all(&untagged, " ").trim().to_string()
}

/// Tracing id carried by the `otel_trace_id` annotation, or empty
pub fn trace_id(test: &TestCase) -> String {
    test.annotations
        .iter()
        .find(|a| a.kind == TRACE_ANNOTATION)
        .and_then(|a| a.description.clone())
        .unwrap_or_default()
}

/// Whether any title segment marks the test as experimental
pub fn is_experimental(test: &TestCase) -> bool {
    test.title_path.iter().any(|s| s.contains(EXPERIMENTAL_TAG))
}

/// Assemble the stored report payload.
///
/// Errors are copied as the runner reported them. Screenshot attachments
/// without a path are left out of `screenshots` rather than stored as nulls;
/// `video` is the path of the first `video` attachment.
pub fn build_report(test_name: &str, test: &TestCase, result: &TestResult) -> TestReport {
    let screenshots = result
        .attachments
        .iter()
        .filter(|a| a.name == "screenshot")
        .filter_map(|a| a.path.clone())
        .collect();

    let video = result
        .attachments
        .iter()
        .find(|a| a.name == "video")
        .and_then(|a| a.path.clone());

    TestReport {
        test_name: test_name.to_string(),
        otel_trace_id: trace_id(test),
        errors: result.errors.clone(),
        screenshots,
        video,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::{Annotation, Attachment, TestError, TestStatus};
    use std::time::Duration;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_drops_suite_and_tags() {
        let name = normalize_test_name(&path(&["Suite", "Group @smoke", "does   the thing"]));
        assert_eq!(name, "Group / does the thing");
    }

    #[test]
    fn test_normalize_keeps_uppercase_after_at() {
        // Only lowercase tag tokens are stripped
        let name = normalize_test_name(&path(&["spec.ts", "mail @Home", "sends @p1-critical"]));
        assert_eq!(name, "mail @Home / sends");
    }

    #[test]
    fn test_normalize_short_paths() {
        assert_eq!(normalize_test_name(&path(&[])), "");
        assert_eq!(normalize_test_name(&path(&["only-suite"])), "");
        assert_eq!(
            normalize_test_name(&path(&["Checkout", "completes purchase"])),
            "completes purchase"
        );
    }

    #[test]
    fn test_trace_id_lookup() {
        let test = TestCase::new(["s", "t"])
            .with_annotation(Annotation::new("issue", Some("JIRA-1")))
            .with_annotation(Annotation::new("otel_trace_id", Some("abc123")));
        assert_eq!(trace_id(&test), "abc123");

        let untraced = TestCase::new(["s", "t"]).with_annotation(Annotation::new("otel_trace_id", None));
        assert_eq!(trace_id(&untraced), "");
    }

    #[test]
    fn test_experimental_matches_substring() {
        assert!(is_experimental(&TestCase::new(["file", "beta @experimental", "t"])));
        assert!(!is_experimental(&TestCase::new(["file", "@smoke", "t"])));
    }

    #[test]
    fn test_build_report_collects_attachments() {
        let test = TestCase::new(["f", "t"]);
        let mut result = TestResult::new(TestStatus::Failed, Duration::from_millis(10));
        result.errors.push(TestError::message("boom"));
        result.attachments = vec![
            Attachment::file("screenshot", "image/png", "a.png"),
            Attachment::file("video", "video/webm", "first.webm"),
            Attachment::file("screenshot", "image/png", "b.png"),
            Attachment::file("video", "video/webm", "second.webm"),
            Attachment::file("trace", "application/zip", "trace.zip"),
        ];

        let report = build_report("t", &test, &result);
        assert_eq!(report.screenshots, vec!["a.png", "b.png"]);
        assert_eq!(report.video.as_deref(), Some("first.webm"));
        assert_eq!(report.errors, vec![TestError::message("boom")]);
        assert_eq!(report.otel_trace_id, "");
    }

    #[test]
    fn test_build_report_keeps_nested_errors() {
        let json = r#"{
            "status": "failed",
            "duration": 5,
            "errors": [{
                "message": "outer",
                "matcherResult": { "pass": false, "name": "toBeVisible" },
                "cause": { "message": "inner", "stack": "at checkout.spec.ts:12" }
            }]
        }"#;
        let result: TestResult = serde_json::from_str(json).unwrap();
        let report = build_report("t", &TestCase::new(["f", "t"]), &result);

        let stored = serde_json::to_value(&report).unwrap();
        let expected: serde_json::Value = serde_json::json!([{
            "message": "outer",
            "matcherResult": { "pass": false, "name": "toBeVisible" },
            "cause": { "message": "inner", "stack": "at checkout.spec.ts:12" }
        }]);
        assert_eq!(stored["errors"], expected);

        let cause = report.errors[0].cause.as_ref().unwrap();
        assert_eq!(cause.message.as_deref(), Some("inner"));
    }
}
