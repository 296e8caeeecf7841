use reqwest::blocking::Client;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::endpoint::Endpoint;
use super::events::{ConsoleEventListener, EventEmitter, EventListener, TestEvent};
use super::state::{ResponseBody, ScenarioResult, SessionState, SuiteReport};
use crate::error::Result;
use crate::scenario::Scenario;

/// Runs scenarios against one endpoint, one blocking request at a time.
pub struct ContractChecker {
    endpoint: Endpoint,
    client: Client,
    emitter: EventEmitter,
}

impl ContractChecker {
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let client = Client::builder()
            .timeout(endpoint.timeout())
            .default_headers(endpoint.header_map()?)
            .build()?;

        Ok(Self {
            endpoint,
            client,
            emitter: EventEmitter::new(),
        })
    }

    /// Print progress to the console while running.
    pub fn with_console(mut self) -> Self {
        self.subscribe(Box::new(ConsoleEventListener::new()));
        self
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.emitter.subscribe(listener);
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Issue one request and judge the response. Never returns an error:
    /// transport problems become a failed result.
    pub fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let started = Instant::now();
        let name = scenario.name();
        let expected = scenario.expected_status();

        let body = match serde_json::to_vec(scenario.payload()) {
            Ok(bytes) => bytes,
            Err(e) => {
                return ScenarioResult::transport_failure(
                    name,
                    expected,
                    format!("failed to encode payload: {}", e),
                    started,
                )
                .with_tags(scenario.tags());
            }
        };

        log::debug!(
            "POST {} for '{}' with fields {:?}",
            self.endpoint.base_url(),
            name,
            scenario.payload().keys().collect::<Vec<_>>()
        );

        let response = match self.client.post(self.endpoint.base_url()).body(body).send() {
            Ok(response) => response,
            Err(e) => {
                let reason = describe_transport_error(&e, self.endpoint.timeout());
                log::debug!("'{}' transport failure: {}", name, reason);
                return ScenarioResult::transport_failure(name, expected, reason, started)
                    .with_tags(scenario.tags());
            }
        };

        let status = response.status().as_u16();
        let text = match response.text() {
            Ok(text) => text,
            Err(e) => {
                let reason = format!(
                    "status {} but body could not be read: {}",
                    status,
                    describe_transport_error(&e, self.endpoint.timeout())
                );
                return ScenarioResult::transport_failure(name, expected, reason, started)
                    .with_tags(scenario.tags());
            }
        };
        log::debug!("'{}' answered {} ({} bytes)", name, status, text.len());

        let body = ResponseBody::from_text(text);
        let problems = scenario.verify(status, &body);
        ScenarioResult::observed(name, expected, status, body, problems, started)
            .with_tags(scenario.tags())
    }

    /// Run every scenario in order. A failing scenario never stops the rest.
    pub fn run_suite(&self, scenarios: &[Scenario]) -> Vec<ScenarioResult> {
        self.run_numbered(scenarios, 0)
    }

    fn run_numbered(&self, scenarios: &[Scenario], first_index: usize) -> Vec<ScenarioResult> {
        let mut results = Vec::with_capacity(scenarios.len());
        for (offset, scenario) in scenarios.iter().enumerate() {
            let index = first_index + offset;
            self.emitter.emit(TestEvent::ScenarioStarted {
                index,
                name: scenario.name().to_string(),
            });

            let result = self.run_scenario(scenario);

            self.emitter.emit(TestEvent::ScenarioFinished {
                index,
                result: result.clone(),
            });
            results.push(result);
        }
        results
    }

    /// Run a named suite as one session. `env_check`, when given, is recorded
    /// ahead of the scenario results.
    pub fn run_session(
        &self,
        suite_name: &str,
        env_check: Option<ScenarioResult>,
        scenarios: &[Scenario],
    ) -> SuiteReport {
        let mut session = SessionState::new(
            &Uuid::new_v4().to_string(),
            suite_name,
            self.endpoint.base_url(),
        );
        session.start();

        self.emitter.emit(TestEvent::SessionStarted {
            session_id: session.session_id.clone(),
            suite_name: suite_name.to_string(),
            endpoint: self.endpoint.base_url().to_string(),
            scenario_count: scenarios.len(),
        });

        let mut first_index = 0;
        if let Some(check) = env_check {
            self.emitter.emit(TestEvent::ScenarioFinished {
                index: 0,
                result: check.clone(),
            });
            if !check.passed {
                self.emitter.emit(TestEvent::Log {
                    message: "notification delivery cannot be confirmed for this run".to_string(),
                });
            }
            session.record(check);
            first_index = 1;
        }

        for result in self.run_numbered(scenarios, first_index) {
            session.record(result);
        }

        session.finish();
        let report = session.to_report();
        self.emitter.emit(TestEvent::SessionFinished {
            summary: report.summary.clone(),
        });
        report
    }
}

/// Human readable description of a reqwest failure, including its causes.
fn describe_transport_error(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        return format!("request timed out after {}ms", timeout.as_millis());
    }

    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !chain.iter().any(|c| c.contains(&text)) {
            chain.push(text);
        }
        source = cause.source();
    }
    let detail = chain.join(": ");

    if err.is_connect() {
        format!("connection failed: {}", detail)
    } else if err.is_body() || err.is_decode() {
        format!("malformed response: {}", detail)
    } else {
        format!("transport error: {}", detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::ScenarioStatus;
    use std::net::TcpListener;

    fn closed_port_url() -> String {
        // Bind then drop so nothing is listening on the port.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}/api/contact", port)
    }

    #[test]
    fn test_connection_refused_is_a_failed_result() {
        let endpoint = Endpoint::builder(&closed_port_url())
            .timeout_ms(2_000)
            .build()
            .unwrap();
        let checker = ContractChecker::new(endpoint).unwrap();

        let scenario = Scenario::builder("unreachable")
            .field("name", "Jane Doe")
            .expect_status(200)
            .build();
        let result = checker.run_scenario(&scenario);

        assert!(!result.passed);
        assert_eq!(result.actual_status, None);
        assert_eq!(result.actual_body, ResponseBody::Missing);
        assert!(matches!(result.status, ScenarioStatus::Failed { .. }));
        let reason = result.failure_reason.unwrap();
        assert!(
            reason.starts_with("connection failed") || reason.starts_with("transport error"),
            "unexpected reason: {}",
            reason
        );
    }

    #[test]
    fn test_suite_continues_after_transport_failures() {
        let endpoint = Endpoint::builder(&closed_port_url())
            .timeout_ms(2_000)
            .build()
            .unwrap();
        let checker = ContractChecker::new(endpoint).unwrap();

        let scenarios = vec![
            Scenario::builder("first").build(),
            Scenario::builder("second").expect_status(400).build(),
        ];
        let results = checker.run_suite(&scenarios);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].scenario_name, "first");
        assert_eq!(results[1].scenario_name, "second");
        assert!(results.iter().all(|r| !r.passed));
    }
}
