use super::types::TestResults;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const RESULTS_FILE: &str = "test-results.json";

/// Print the results as pretty JSON, or save them to `output`.
pub fn generate(results: &TestResults, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("JSON report saved to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Save `test-results.json` under `output_dir`, returning its path.
pub fn write_results(results: &TestResults, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(RESULTS_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(results)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Load a results file written by [`write_results`].
pub fn read_results(path: &Path) -> Result<TestResults> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not a results file", path.display()))
}
