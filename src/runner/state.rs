use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Body as it came back from the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ResponseBody {
    Json(Value),
    /// Non-empty body that did not parse as JSON.
    Text(String),
    Empty,
    /// No response was received at all.
    Missing,
}

impl ResponseBody {
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(json) => ResponseBody::Json(json),
            Err(_) => ResponseBody::Text(text),
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Short description for failure messages.
    pub fn describe(&self) -> String {
        match self {
            ResponseBody::Json(_) => "json".to_string(),
            ResponseBody::Text(t) => {
                let snippet: String = t.chars().take(80).collect();
                if t.chars().count() > 80 {
                    format!("text: \"{}...\"", snippet)
                } else {
                    format!("text: \"{}\"", snippet)
                }
            }
            ResponseBody::Empty => "empty body".to_string(),
            ResponseBody::Missing => "no response".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed { error: String },
    Skipped { reason: String },
}

/// Outcome of executing one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub expected_status: Option<u16>,
    pub actual_status: Option<u16>,
    pub actual_body: ResponseBody,
    pub passed: bool,
    pub failure_reason: Option<String>,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ScenarioResult {
    /// Result for a request that received a response. An empty problem list
    /// means the scenario passed.
    pub fn observed(
        name: &str,
        expected_status: u16,
        actual_status: u16,
        body: ResponseBody,
        problems: Vec<String>,
        started: Instant,
    ) -> Self {
        let failure_reason = if problems.is_empty() {
            None
        } else {
            Some(problems.join("; "))
        };
        Self::finish(
            name,
            Some(expected_status),
            Some(actual_status),
            body,
            failure_reason,
            started,
        )
    }

    /// Result for a request that never produced a response.
    pub fn transport_failure(
        name: &str,
        expected_status: u16,
        reason: String,
        started: Instant,
    ) -> Self {
        Self::finish(
            name,
            Some(expected_status),
            None,
            ResponseBody::Missing,
            Some(reason),
            started,
        )
    }

    /// Result for a check that ran locally without issuing a request.
    pub fn local(name: &str, problems: Vec<String>, started: Instant) -> Self {
        let failure_reason = if problems.is_empty() {
            None
        } else {
            Some(problems.join("; "))
        };
        Self::finish(name, None, None, ResponseBody::Missing, failure_reason, started)
    }

    pub fn skipped(name: &str, reason: &str) -> Self {
        Self {
            scenario_name: name.to_string(),
            expected_status: None,
            actual_status: None,
            actual_body: ResponseBody::Missing,
            passed: false,
            failure_reason: None,
            status: ScenarioStatus::Skipped {
                reason: reason.to_string(),
            },
            duration_ms: 0,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[String]) -> Self {
        self.tags = tags.to_vec();
        self
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, ScenarioStatus::Skipped { .. })
    }

    fn finish(
        name: &str,
        expected_status: Option<u16>,
        actual_status: Option<u16>,
        body: ResponseBody,
        failure_reason: Option<String>,
        started: Instant,
    ) -> Self {
        let status = match &failure_reason {
            None => ScenarioStatus::Passed,
            Some(error) => ScenarioStatus::Failed {
                error: error.clone(),
            },
        };
        Self {
            scenario_name: name.to_string(),
            expected_status,
            actual_status,
            actual_body: body,
            passed: failure_reason.is_none(),
            failure_reason,
            status,
            duration_ms: started.elapsed().as_millis() as u64,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSummary {
    pub session_id: String,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total_duration_ms: Option<u64>,
}

impl SuiteSummary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// State of one checker session: the suite plus the environment check.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: String,
    pub suite_name: String,
    pub endpoint: String,
    pub results: Vec<ScenarioResult>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl SessionState {
    pub fn new(session_id: &str, suite_name: &str, endpoint: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            suite_name: suite_name.to_string(),
            endpoint: endpoint.to_string(),
            results: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn record(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    pub fn summary(&self) -> SuiteSummary {
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for result in &self.results {
            if result.is_skipped() {
                skipped += 1;
            } else if result.passed {
                passed += 1;
            } else {
                failed += 1;
            }
        }

        let total_duration_ms = self.started_at.map(|start| {
            self.finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(start)
                .as_millis() as u64
        });

        SuiteSummary {
            session_id: self.session_id.clone(),
            total: self.results.len() as u32,
            passed,
            failed,
            skipped,
            total_duration_ms,
        }
    }

    /// Serialize state for reporting
    pub fn to_report(&self) -> SuiteReport {
        SuiteReport {
            session_id: self.session_id.clone(),
            suite_name: self.suite_name.clone(),
            endpoint: self.endpoint.clone(),
            results: self.results.clone(),
            summary: self.summary(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub session_id: String,
    pub suite_name: String,
    pub endpoint: String,
    pub results: Vec<ScenarioResult>,
    pub summary: SuiteSummary,
}
