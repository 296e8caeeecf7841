use super::types::{ScenarioSpec, StatusSpec, SuiteFile, SuiteHeader};
use crate::error::{CheckerError, Result};
use crate::runner::context::SuiteContext;
use crate::scenario::{BodyCheck, Payload, Scenario, Suite};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Parse a YAML suite file into a [`Suite`]
pub fn parse_suite_file(path: &Path) -> Result<Suite> {
    let content = std::fs::read_to_string(path).map_err(|source| CheckerError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_suite_content(&content, path, &SuiteContext::new())
}

/// Parse YAML content. `source_path` names the suite and anchors `data:` files.
pub fn parse_suite_content(content: &str, source_path: &Path, ctx: &SuiteContext) -> Result<Suite> {
    let invalid = |reason: String| CheckerError::Suite {
        path: source_path.to_path_buf(),
        reason,
    };

    let (header, specs) = match split_document(content) {
        // 1. Header block, `---`, then a list of scenarios
        Some((header, body)) => {
            let header: SuiteHeader = if header.trim().is_empty() {
                SuiteHeader::default()
            } else {
                serde_yaml::from_str(header).map_err(|e| invalid(format!("header: {}", e)))?
            };
            let specs: Vec<ScenarioSpec> =
                serde_yaml::from_str(body).map_err(|e| invalid(format!("scenarios: {}", e)))?;
            (header, specs)
        }
        None => {
            let root: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()))?;
            if root.is_sequence() {
                // 2. A bare list of scenarios
                let specs: Vec<ScenarioSpec> = serde_yaml::from_str(content)
                    .map_err(|e| invalid(format!("scenarios: {}", e)))?;
                (SuiteHeader::default(), specs)
            } else {
                // 3. One mapping with a `scenarios` key
                let file: SuiteFile =
                    serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()))?;
                (file.header, file.scenarios)
            }
        }
    };

    let base_dir = source_path.parent().unwrap_or(Path::new("."));
    let mut scenarios = Vec::new();
    for spec in &specs {
        scenarios.extend(expand_scenario(spec, &header, base_dir, ctx, source_path)?);
    }

    let name = header.name.clone().unwrap_or_else(|| {
        source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("suite")
            .to_string()
    });

    Ok(Suite {
        name,
        endpoint: header.endpoint.as_deref().map(|e| ctx.substitute_vars(e)),
        headers: header
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), ctx.substitute_vars(v)))
            .collect(),
        timeout_ms: header.timeout_ms,
        scenarios,
    })
}

/// Split on a line that is exactly `---`. A leading document marker with
/// nothing before it is not a header separator.
fn split_document(content: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let header = &content[..offset];
            let body = &content[offset + line.len()..];
            if header.trim().is_empty() {
                return None;
            }
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

/// Expand one spec into scenarios, one per CSV row when `data:` is set.
fn expand_scenario(
    spec: &ScenarioSpec,
    header: &SuiteHeader,
    base_dir: &Path,
    ctx: &SuiteContext,
    source_path: &Path,
) -> Result<Vec<Scenario>> {
    let rows = match &spec.data {
        Some(file) => load_data_rows(&base_dir.join(file))?,
        None => vec![HashMap::new()],
    };
    log::debug!("Expanding '{}' over {} row(s)", spec.name, rows.len());

    let mut scenarios = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let row_ctx = ctx.with_vars(row);

        let mut name = row_ctx.substitute_vars(&spec.name);
        if rows.len() > 1 {
            name = format!("{} [{}]", name, idx + 1);
        }

        let mut payload: Payload = match row_ctx.substitute_value(&Value::Object(spec.payload.clone())) {
            Value::Object(map) => map,
            _ => Payload::new(),
        };
        for key in &spec.without {
            payload.remove(key);
        }

        let status = resolve_status(&spec.expect.status, &row_ctx).ok_or_else(|| {
            CheckerError::Suite {
                path: source_path.to_path_buf(),
                reason: format!("scenario '{}': invalid expected status {:?}", name, spec.expect.status),
            }
        })?;

        let mut checks = Vec::with_capacity(spec.expect.body.len());
        for check in &spec.expect.body {
            checks.push(substitute_check(check, &row_ctx).map_err(|reason| {
                CheckerError::Suite {
                    path: source_path.to_path_buf(),
                    reason: format!("scenario '{}': {}", name, reason),
                }
            })?);
        }

        let mut builder = Scenario::builder(&name)
            .payload(payload)
            .expect_status(status)
            .checks(checks)
            .tags(header.tags.iter().chain(spec.tags.iter()));
        if let Some(json) = spec.expect.json {
            builder = builder.expect_json(json);
        }
        scenarios.push(builder.build());
    }
    Ok(scenarios)
}

fn resolve_status(status: &StatusSpec, ctx: &SuiteContext) -> Option<u16> {
    let code = match status {
        StatusSpec::Code(code) => *code,
        StatusSpec::Template(raw) => ctx.substitute_vars(raw).trim().parse().ok()?,
    };
    (100..=599).contains(&code).then_some(code)
}

fn substitute_check(check: &BodyCheck, ctx: &SuiteContext) -> std::result::Result<BodyCheck, String> {
    let value = serde_json::to_value(check).map_err(|e| e.to_string())?;
    serde_json::from_value(ctx.substitute_value(&value)).map_err(|e| e.to_string())
}

/// Read CSV rows as column -> value maps.
pub fn load_data_rows(path: &Path) -> Result<Vec<HashMap<String, String>>> {
    let data_err = |source| CheckerError::Data {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::Reader::from_path(path).map_err(data_err)?;
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        let row: HashMap<String, String> = record.map_err(data_err)?;
        rows.push(row);
    }
    Ok(rows)
}
