use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::{TestCase, TestResult, TestStatus};

/// One finished test in a run file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedTest {
    #[serde(flatten)]
    pub test: TestCase,
    pub result: TestResult,
}

/// Run file replayed by `lumi-pg-reporter record`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunFile {
    pub tests: Vec<RecordedTest>,
}

/// Status the runner should use for a test after reporting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportedOutcome {
    pub test_name: String,
    pub status: TestStatus,
    pub downgraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub session_id: String,
    pub outcomes: Vec<ReportedOutcome>,
}

impl RunSummary {
    /// Whether the run passes once experimental failures are skipped
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| {
            matches!(o.status, TestStatus::Passed | TestStatus::Skipped)
        })
    }
}

pub fn parse_run(content: &str) -> Result<RunFile> {
    Ok(serde_json::from_str(content)?)
}

pub fn load_run(path: &Path) -> Result<RunFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run file {}", path.display()))?;
    parse_run(&content).with_context(|| format!("Invalid run file {}", path.display()))
}

/// Write the summary as pretty JSON to `output`, or stdout
pub async fn write_summary(summary: &RunSummary, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;

    if let Some(path) = output {
        tokio::fs::write(path, json).await?;
        println!("Run summary saved to: {}", path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}
