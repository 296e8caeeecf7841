use super::state::{ScenarioResult, ScenarioStatus, SuiteSummary};
use std::cell::RefCell;

/// Test execution events for real-time updates
#[derive(Debug, Clone)]
pub enum TestEvent {
    // Session events
    SessionStarted {
        session_id: String,
        suite_name: String,
        endpoint: String,
        scenario_count: usize,
    },
    SessionFinished {
        summary: SuiteSummary,
    },

    // Scenario events
    ScenarioStarted {
        index: usize,
        name: String,
    },
    ScenarioFinished {
        index: usize,
        result: ScenarioResult,
    },

    Log {
        message: String,
    },
}

/// Receives events as the checker runs.
pub trait EventListener {
    fn on_event(&self, event: &TestEvent);
}

/// Fans events out to every registered listener, in registration order.
#[derive(Default)]
pub struct EventEmitter {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: TestEvent) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener {
    spinner: RefCell<Option<ProgressBar>>,
    interactive: bool,
}

impl ConsoleEventListener {
    pub fn new() -> Self {
        use std::io::IsTerminal;
        Self {
            spinner: RefCell::new(None),
            interactive: std::io::stdout().is_terminal(),
        }
    }

    fn start_spinner(&self, index: usize, name: &str) {
        use colored::Colorize;

        // When not a TTY (piped output), use hidden target to avoid terminal escape codes
        let pb = if self.interactive {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        };
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("    {spinner} {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("[{}] {}... ", index, name.dimmed()));
        pb.enable_steady_tick(StdDuration::from_millis(100));
        *self.spinner.borrow_mut() = Some(pb);
    }

    fn clear_spinner(&self) {
        if let Some(pb) = self.spinner.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}

impl Default for ConsoleEventListener {
    fn default() -> Self {
        Self::new()
    }
}

impl EventListener for ConsoleEventListener {
    fn on_event(&self, event: &TestEvent) {
        use colored::Colorize;

        match event {
            TestEvent::SessionStarted {
                session_id,
                suite_name,
                endpoint,
                scenario_count,
            } => {
                println!(
                    "\n{} Suite {} ({} scenarios)",
                    "▶".green().bold(),
                    suite_name.white().bold(),
                    scenario_count
                );
                println!("  Endpoint: {}", endpoint.cyan());
                println!("  Session: {}", session_id.dimmed());
            }

            TestEvent::ScenarioStarted { index, name } => {
                self.start_spinner(*index, name);
            }

            TestEvent::ScenarioFinished { index, result } => {
                self.clear_spinner();
                let status = result
                    .actual_status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "---".to_string());
                match &result.status {
                    ScenarioStatus::Passed => println!(
                        "    {} [{}] {} {} ({}ms)",
                        "✓".green(),
                        index,
                        result.scenario_name,
                        status.dimmed(),
                        result.duration_ms
                    ),
                    ScenarioStatus::Failed { error } => {
                        println!(
                            "    {} [{}] {} {} ({}ms)",
                            "✗".red(),
                            index,
                            result.scenario_name,
                            status.red(),
                            result.duration_ms
                        );
                        println!("        {}", error.red());
                    }
                    ScenarioStatus::Skipped { reason } => println!(
                        "    {} [{}] {} ({})",
                        "○".yellow(),
                        index,
                        result.scenario_name,
                        reason.dimmed()
                    ),
                }
            }

            TestEvent::SessionFinished { summary } => {
                self.clear_spinner();
                println!("\n{} Suite finished", "■".blue().bold());
                println!("  Total scenarios: {}", summary.total);
                println!(
                    "  {} passed, {} failed, {} skipped",
                    summary.passed.to_string().green(),
                    summary.failed.to_string().red(),
                    summary.skipped.to_string().yellow()
                );
                if let Some(duration) = summary.total_duration_ms {
                    println!("  Duration: {}ms", duration);
                }
            }

            TestEvent::Log { message } => {
                match self.spinner.borrow().as_ref() {
                    Some(pb) => pb.println(format!("      {}", message)),
                    None => println!("      {}", message),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl EventListener for Recorder {
        fn on_event(&self, event: &TestEvent) {
            let label = match event {
                TestEvent::SessionStarted { .. } => "session-started".to_string(),
                TestEvent::SessionFinished { .. } => "session-finished".to_string(),
                TestEvent::ScenarioStarted { index, .. } => format!("started-{}", index),
                TestEvent::ScenarioFinished { index, .. } => format!("finished-{}", index),
                TestEvent::Log { message } => message.clone(),
            };
            self.0.borrow_mut().push(label);
        }
    }

    #[test]
    fn test_emitter_delivers_to_all_listeners_in_order() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));

        let mut emitter = EventEmitter::new();
        emitter.subscribe(Box::new(Recorder(first.clone())));
        emitter.subscribe(Box::new(Recorder(second.clone())));

        emitter.emit(TestEvent::ScenarioStarted {
            index: 0,
            name: "a".into(),
        });
        emitter.emit(TestEvent::Log {
            message: "hello".into(),
        });

        assert_eq!(*first.borrow(), vec!["started-0", "hello"]);
        assert_eq!(*second.borrow(), vec!["started-0", "hello"]);
    }
}
