use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::scenario::BodyCheck;

/// Suite-level settings, either in the header block above `---` or at the
/// top of a single mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteHeader {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, alias = "url")]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default, alias = "timeout")]
    pub timeout_ms: Option<u64>,

    /// Added to every scenario in the file
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Whole-file form: header fields plus a `scenarios` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteFile {
    #[serde(flatten)]
    pub header: SuiteHeader,

    #[serde(default)]
    pub scenarios: Vec<ScenarioSpec>,
}

/// One scenario as written in a suite file, before variable expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSpec {
    pub name: String,

    #[serde(default)]
    pub payload: serde_json::Map<String, Value>,

    /// Payload keys to drop after substitution
    #[serde(default)]
    pub without: Vec<String>,

    /// CSV file, relative to the suite file; one scenario per row
    #[serde(default)]
    pub data: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub expect: ExpectSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectSpec {
    pub status: StatusSpec,

    /// Require a JSON body even without body checks
    #[serde(default)]
    pub json: Option<bool>,

    #[serde(default)]
    pub body: Vec<BodyCheck>,
}

/// A status code, or a `${var}` template resolved per data row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusSpec {
    Code(u16),
    Template(String),
}
