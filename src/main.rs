use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use contract_checker::runner::{self, RunOptions};
use contract_checker::utils::config::{CheckerConfig, EnvSecrets};
use contract_checker::{contact, report};

#[derive(Parser)]
#[command(name = "contract-checker")]
#[command(version = "0.1.0")]
#[command(about = "Declarative HTTP contract checker for the contact form endpoint", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SecretArgs {
    /// Variable holding the notification bot token
    #[arg(long)]
    token_var: Option<String>,

    /// Variable holding the notification chat id
    #[arg(long)]
    chat_id_var: Option<String>,
}

impl SecretArgs {
    fn apply(self, config: &mut CheckerConfig) {
        if let Some(var) = self.token_var {
            config.token_var = var;
        }
        if let Some(var) = self.chat_id_var {
            config.chat_id_var = var;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a suite file, a directory of suites, or the built-in contact suite
    Run {
        /// Path to suite file or directory (built-in contact suite if omitted)
        path: Option<PathBuf>,

        /// Endpoint URL, overrides suite files and CONTRACT_CHECKER_URL
        #[arg(short, long)]
        url: Option<String>,

        /// Extra default header as Name=Value. Can be specified multiple times.
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Per-request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Filter scenarios by tags (comma-separated, all required)
        #[arg(short, long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Run only scenarios whose name matches (case-insensitive prefix)
        #[arg(long)]
        scenario: Option<String>,

        /// Include the scenario that expects an induced 500 response
        #[arg(long, default_value = "false")]
        induce_failure: bool,

        /// Do not validate the notification secrets before running
        #[arg(long, default_value = "false")]
        skip_env_check: bool,

        #[command(flatten)]
        secrets: SecretArgs,

        /// Output directory for reports
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Write JSON and JUnit reports
        #[arg(long, default_value = "false")]
        report: bool,
    },

    /// List the scenarios a run would execute
    List {
        /// Path to suite file or directory (built-in contact suite if omitted)
        path: Option<PathBuf>,

        /// Filter scenarios by tags (comma-separated, all required)
        #[arg(short, long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// List only scenarios whose name matches (case-insensitive prefix)
        #[arg(long)]
        scenario: Option<String>,

        /// Include the scenario that expects an induced 500 response
        #[arg(long, default_value = "false")]
        induce_failure: bool,
    },

    /// Check that the notification secrets are present and plausible
    EnvCheck {
        #[command(flatten)]
        secrets: SecretArgs,
    },

    /// Generate report from saved results
    Report {
        /// Path to test-results.json
        results: PathBuf,

        /// Output format (json, junit)
        #[arg(short, long, default_value = "junit")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = CheckerConfig::from_env();

    match cli.command {
        Commands::Run {
            path,
            url,
            headers,
            timeout_ms,
            tags,
            scenario,
            induce_failure,
            skip_env_check,
            secrets,
            output,
            report,
        } => {
            secrets.apply(&mut config);

            let mut options = RunOptions::new(config);
            for raw in &headers {
                match runner::endpoint::parse_header_arg(raw) {
                    Some(pair) => options.headers.push(pair),
                    None => anyhow::bail!("Invalid header '{}', expected Name=Value", raw),
                }
            }
            options.path = path;
            options.url = url;
            options.timeout_ms = timeout_ms;
            options.tags = tags;
            options.scenario = scenario;
            options.induce_failure = induce_failure;
            options.env_check = !skip_env_check;
            options.output = output;
            options.report = report;

            match &options.path {
                Some(p) => println!("{} Running suites from: {}", "▶".green().bold(), p.display()),
                None => println!(
                    "{} Running built-in {} suite",
                    "▶".green().bold(),
                    contact::suite::SUITE_NAME.cyan()
                ),
            }
            if let Some(ref tags_list) = options.tags {
                println!("  Tags: {}", tags_list.join(", ").yellow());
            }
            if options.report {
                println!("  Reports: {}", options.output.display().to_string().cyan());
            }

            let reports = runner::run_checks(&options)?;
            let failed: u32 = reports.iter().map(|r| r.summary.failed).sum();
            if failed > 0 {
                anyhow::bail!("{} scenario(s) failed", failed);
            }
        }

        Commands::List {
            path,
            tags,
            scenario,
            induce_failure,
        } => {
            let mut options = RunOptions::new(config);
            options.path = path;
            options.tags = tags;
            options.scenario = scenario;
            options.induce_failure = induce_failure;

            for suite in runner::load_suites(&options)? {
                println!(
                    "{} {} ({} scenarios)",
                    "→".blue(),
                    suite.name.white().bold(),
                    suite.scenarios.len()
                );
                for (i, scenario) in suite.scenarios.iter().enumerate() {
                    println!(
                        "    [{}] {} {}",
                        i,
                        scenario.display_name(),
                        format!("[{}]", scenario.tags().join(", ")).dimmed()
                    );
                }
            }
        }

        Commands::EnvCheck { secrets } => {
            secrets.apply(&mut config);
            let issues = EnvSecrets::load(&config).validate();
            if issues.is_empty() {
                println!(
                    "{} {} and {} look plausible",
                    "✓".green(),
                    config.token_var.cyan(),
                    config.chat_id_var.cyan()
                );
            } else {
                for issue in &issues {
                    println!("{} {}", "✗".red(), issue);
                }
                anyhow::bail!("{} environment problem(s)", issues.len());
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::try_parse_from([
            "contract-checker",
            "run",
            "--url",
            "http://localhost:3000/api/contact",
            "-H",
            "X-Trace=1",
            "--tags",
            "validation,phone",
            "--skip-env-check",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                path,
                url,
                headers,
                tags,
                skip_env_check,
                ..
            } => {
                assert!(path.is_none());
                assert_eq!(url.as_deref(), Some("http://localhost:3000/api/contact"));
                assert_eq!(headers, vec!["X-Trace=1".to_string()]);
                assert_eq!(tags, Some(vec!["validation".to_string(), "phone".to_string()]));
                assert!(skip_env_check);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_list_scenario_filter() {
        let cli = Cli::try_parse_from([
            "contract-checker",
            "list",
            "--scenario",
            "missing",
            "--induce-failure",
        ])
        .unwrap();
        match cli.command {
            Commands::List {
                scenario,
                induce_failure,
                ..
            } => {
                assert_eq!(scenario.as_deref(), Some("missing"));
                assert!(induce_failure);
            }
            _ => panic!("expected list"),
        }
    }
}
