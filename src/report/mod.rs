pub mod json;
pub mod junit;
pub mod types;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::runner::state::SuiteReport;

/// Generate report from test results
pub fn generate_report(results_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let test_results = json::read_results(results_path)?;

    match format {
        "json" => json::generate(&test_results, output),
        "junit" => match output {
            Some(path) => {
                std::fs::write(path, junit::generate_junit_xml(&test_results)?)?;
                println!("JUnit report saved to: {}", path.display());
                Ok(())
            }
            None => {
                println!("{}", junit::generate_junit_xml(&test_results)?);
                Ok(())
            }
        },
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}

/// Write `test-results.json` and `junit.xml` for a finished session.
pub fn write_reports(report: &SuiteReport, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let results = types::TestResults::from_report(report);

    let json_path = json::write_results(&results, output_dir)?;
    println!(
        "\n{} JSON report saved to: {}",
        "📄".to_string().blue(),
        json_path.display().to_string().cyan()
    );

    junit::write_report(&results, output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{ResponseBody, ScenarioResult, SessionState};
    use std::time::Instant;

    #[test]
    fn test_write_reports_then_regenerate() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionState::new("s-1", "contact-form", "http://localhost");
        session.start();
        session.record(ScenarioResult::observed(
            "ok",
            200,
            200,
            ResponseBody::Empty,
            vec![],
            Instant::now(),
        ));
        session.finish();

        write_reports(&session.to_report(), dir.path()).unwrap();
        let json_path = dir.path().join("test-results.json");
        assert!(json_path.exists());
        assert!(dir.path().join("junit.xml").exists());

        let regenerated = dir.path().join("again.xml");
        generate_report(&json_path, "junit", Some(&regenerated)).unwrap();
        let xml = std::fs::read_to_string(regenerated).unwrap();
        assert!(xml.contains(r#"<testcase name="ok""#));

        assert!(generate_report(&json_path, "pdf", None).is_err());
    }
}
