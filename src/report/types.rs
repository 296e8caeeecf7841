use crate::runner::state::{ScenarioResult, SuiteReport, SuiteSummary};
use serde::{Deserialize, Serialize};

/// Test results for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub session_id: String,
    pub suite_name: String,
    pub endpoint: String,
    pub results: Vec<ScenarioResult>,
    pub summary: SuiteSummary,
    pub generated_at: String,
}

impl TestResults {
    pub fn from_report(report: &SuiteReport) -> Self {
        Self {
            session_id: report.session_id.clone(),
            suite_name: report.suite_name.clone(),
            endpoint: report.endpoint.clone(),
            results: report.results.clone(),
            summary: report.summary.clone(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}
