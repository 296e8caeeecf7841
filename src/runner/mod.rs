pub mod context;
pub mod endpoint;
pub mod events;
pub mod executor;
pub mod state;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::contact::suite::{builtin_suite, SuiteOptions};
use crate::parser::yaml::parse_suite_file;
use crate::scenario::Suite;
use crate::utils::config::{CheckerConfig, EnvSecrets};

pub use endpoint::Endpoint;
pub use events::*;
pub use executor::ContractChecker;
pub use state::*;

pub const ENV_CHECK_NAME: &str = "environment secrets";

/// Options for [`run_checks`], usually straight from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Suite file or directory; the built-in contact suite when `None`
    pub path: Option<PathBuf>,
    pub config: CheckerConfig,
    /// Endpoint override that wins over suite files and config
    pub url: Option<String>,
    /// Timeout override that wins over suite files and config
    pub timeout_ms: Option<u64>,
    pub headers: Vec<(String, String)>,
    pub tags: Option<Vec<String>>,
    pub scenario: Option<String>,
    pub induce_failure: bool,
    pub env_check: bool,
    pub output: PathBuf,
    pub report: bool,
}

impl RunOptions {
    pub fn new(config: CheckerConfig) -> Self {
        Self {
            path: None,
            config,
            url: None,
            timeout_ms: None,
            headers: Vec::new(),
            tags: None,
            scenario: None,
            induce_failure: false,
            env_check: true,
            output: PathBuf::from("./output"),
            report: false,
        }
    }
}

/// Validate the notification secrets as a locally evaluated result.
pub fn environment_check(secrets: &EnvSecrets) -> ScenarioResult {
    let started = Instant::now();
    let problems = secrets
        .validate()
        .into_iter()
        .map(|issue| issue.to_string())
        .collect();
    ScenarioResult::local(ENV_CHECK_NAME, problems, started).with_tags(&["environment".to_string()])
}

/// Collect suite files from a file or directory path
pub fn collect_suite_files(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e
                    .path()
                    .extension()
                    .map_or(false, |ext| ext == "yaml" || ext == "yml")
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Load the suites to run, already filtered by tags and scenario name.
pub fn load_suites(options: &RunOptions) -> Result<Vec<Suite>> {
    let suites = match &options.path {
        None => vec![builtin_suite(&SuiteOptions {
            include_induced_failure: options.induce_failure,
        })],
        Some(path) => {
            let mut suites = Vec::new();
            for file in collect_suite_files(path) {
                let suite = parse_suite_file(&file)
                    .with_context(|| format!("Failed to load suite {}", file.display()))?;
                suites.push(suite);
            }
            suites
        }
    };

    Ok(suites
        .into_iter()
        .map(|s| s.select(options.tags.as_deref(), options.scenario.as_deref()))
        .collect())
}

/// Endpoint for a suite: CLI values beat the suite file, which beats config.
pub fn resolve_endpoint(suite: &Suite, options: &RunOptions) -> Result<Endpoint> {
    let url = options
        .url
        .as_deref()
        .or(suite.endpoint.as_deref())
        .unwrap_or(&options.config.base_url);
    let timeout_ms = options
        .timeout_ms
        .or(suite.timeout_ms)
        .unwrap_or(options.config.timeout_ms);
    log::info!("Suite '{}' -> {} (timeout {}ms)", suite.name, url, timeout_ms);

    let mut builder = Endpoint::builder(url)
        .timeout_ms(timeout_ms)
        .headers(suite.headers.iter());
    for (name, value) in &options.headers {
        builder = builder.header(name, value);
    }
    Ok(builder.build()?)
}

/// Run every selected suite and return one report per suite.
///
/// Every endpoint is resolved before the first request is sent, so a bad
/// suite header fails the run up front. Once requests start, every selected
/// scenario produces a result.
pub fn run_checks(options: &RunOptions) -> Result<Vec<SuiteReport>> {
    let suites: Vec<Suite> = load_suites(options)?
        .into_iter()
        .filter(|s| !s.scenarios.is_empty())
        .collect();
    if suites.is_empty() {
        println!("{} No scenarios selected.", "ℹ".blue());
        return Ok(Vec::new());
    }

    let mut checkers = Vec::with_capacity(suites.len());
    for suite in &suites {
        let endpoint = resolve_endpoint(suite, options)
            .with_context(|| format!("Suite '{}' has an unusable endpoint", suite.name))?;
        checkers.push(ContractChecker::new(endpoint)?.with_console());
    }

    // Secrets are read once, before anything is sent.
    let mut env_check = Some(if options.env_check {
        environment_check(&EnvSecrets::load(&options.config))
    } else {
        ScenarioResult::skipped(ENV_CHECK_NAME, "disabled by --skip-env-check")
            .with_tags(&["environment".to_string()])
    });

    let mut reports = Vec::with_capacity(suites.len());
    for (suite, checker) in suites.iter().zip(&checkers) {
        log::info!(
            "Running '{}' against {}",
            suite.name,
            checker.endpoint().base_url()
        );
        let report = checker.run_session(&suite.name, env_check.take(), &suite.scenarios);

        if options.report {
            let dir = if suites.len() > 1 {
                options.output.join(safe_dir_name(&suite.name))
            } else {
                options.output.clone()
            };
            if let Err(e) = crate::report::write_reports(&report, &dir) {
                log::error!("Report for '{}' not written: {:#}", suite.name, e);
                println!("{} Could not write reports to {}: {:#}", "✗".red(), dir.display(), e);
            }
        }
        reports.push(report);
    }

    Ok(reports)
}

fn safe_dir_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::{DEFAULT_CHAT_ID_VAR, DEFAULT_TOKEN_VAR};

    #[test]
    fn test_environment_check_result() {
        let config = CheckerConfig::default();
        let good = EnvSecrets::from_lookup(&config, |name| match name {
            DEFAULT_TOKEN_VAR => Some("7719356680:AAGq-xkRvPqWmZsd".to_string()),
            DEFAULT_CHAT_ID_VAR => Some("-100987650".to_string()),
            _ => None,
        });
        let result = environment_check(&good);
        assert!(result.passed);
        assert_eq!(result.scenario_name, ENV_CHECK_NAME);

        let bad = EnvSecrets::from_lookup(&config, |_| None);
        let result = environment_check(&bad);
        assert!(!result.passed);
        let reason = result.failure_reason.unwrap();
        assert!(reason.contains("TELEGRAM_BOT_TOKEN is not set"));
        assert!(reason.contains("TELEGRAM_CHAT_ID is not set"));
    }

    #[test]
    fn test_resolve_endpoint_precedence() {
        let mut suite = Suite::new("s", Vec::new());
        suite.endpoint = Some("http://suite.local/api/contact".into());
        suite.timeout_ms = Some(45_000);

        let mut options = RunOptions::new(CheckerConfig::default());
        let endpoint = resolve_endpoint(&suite, &options).unwrap();
        assert_eq!(endpoint.base_url(), "http://suite.local/api/contact");
        assert_eq!(endpoint.timeout().as_millis(), 45_000);

        options.url = Some("http://cli.local/api/contact".into());
        options.timeout_ms = Some(60_000);
        options.headers.push(("X-Trace".into(), "1".into()));
        let endpoint = resolve_endpoint(&suite, &options).unwrap();
        assert_eq!(endpoint.base_url(), "http://cli.local/api/contact");
        assert_eq!(endpoint.timeout().as_millis(), 60_000);
        assert_eq!(endpoint.default_headers()["x-trace"], "1");

        let plain = Suite::new("plain", Vec::new());
        let endpoint = resolve_endpoint(&plain, &RunOptions::new(CheckerConfig::default())).unwrap();
        assert_eq!(endpoint.base_url(), "http://localhost:3000/api/contact");
    }

    #[test]
    fn test_load_builtin_suite_with_filters() {
        let mut options = RunOptions::new(CheckerConfig::default());
        options.tags = Some(vec!["phone".to_string()]);
        let suites = load_suites(&options).unwrap();
        assert_eq!(suites.len(), 1);
        assert!(!suites[0].scenarios.is_empty());
        assert!(suites[0]
            .scenarios
            .iter()
            .all(|s| s.expected_status() == 400));
    }

    #[test]
    fn test_collect_suite_files_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), "[]").unwrap();
        std::fs::write(dir.path().join("a.yml"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = collect_suite_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.yml"));
        assert!(files[1].ends_with("b.yaml"));
    }
}
