use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::runner::state::ResponseBody;

/// JSON object sent as the request body. Absent fields are simply not present.
pub type Payload = serde_json::Map<String, Value>;

/// Resolve a dot path (`data.name`) or JSON pointer (`/data/name`) against a body.
/// `$` and `.` address the root.
pub fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() || path == "$" || path == "." {
        return Some(body);
    }
    let pointer = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path.replace('.', "/"))
    };
    body.pointer(&pointer)
}

/// Predicate registered from code rather than a suite file.
#[derive(Clone)]
pub struct CustomCheck {
    pub description: String,
    predicate: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl CustomCheck {
    pub fn new<F>(description: &str, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.to_string(),
            predicate: Arc::new(predicate),
        }
    }
}

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCheck")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// One assertion on the parsed response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyCheck {
    Exists(String),
    Absent(String),
    IsString(String),
    NonEmptyString(String),
    IsObject(String),
    Equals {
        path: String,
        value: Value,
    },
    OneOf {
        path: String,
        values: Vec<String>,
        #[serde(default, rename = "ignoreCase")]
        ignore_case: bool,
    },
    /// At least one of the paths holds a non-blank string.
    AnyNonEmptyString(Vec<String>),
    /// Every field present in the payload is echoed unchanged under `object`.
    Echoes {
        object: String,
        fields: Vec<String>,
    },
    #[serde(skip)]
    Custom(CustomCheck),
}

impl BodyCheck {
    /// Check the body, returning a mismatch description on failure.
    pub fn verify(&self, body: &Value, payload: &Payload) -> Result<(), String> {
        match self {
            BodyCheck::Exists(path) => lookup(body, path)
                .map(|_| ())
                .ok_or_else(|| format!("missing '{}'", path)),
            BodyCheck::Absent(path) => match lookup(body, path) {
                Some(v) => Err(format!("expected no '{}', found {}", path, v)),
                None => Ok(()),
            },
            BodyCheck::IsString(path) => match lookup(body, path) {
                Some(Value::String(_)) => Ok(()),
                Some(other) => Err(format!("'{}' is not a string: {}", path, other)),
                None => Err(format!("missing '{}'", path)),
            },
            BodyCheck::NonEmptyString(path) => match lookup(body, path) {
                Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
                Some(other) => Err(format!("'{}' is not a non-empty string: {}", path, other)),
                None => Err(format!("missing '{}'", path)),
            },
            BodyCheck::IsObject(path) => match lookup(body, path) {
                Some(Value::Object(_)) => Ok(()),
                Some(other) => Err(format!("'{}' is not an object: {}", path, other)),
                None => Err(format!("missing '{}'", path)),
            },
            BodyCheck::Equals { path, value } => match lookup(body, path) {
                Some(actual) if actual == value => Ok(()),
                Some(actual) => Err(format!("'{}' is {}, expected {}", path, actual, value)),
                None => Err(format!("missing '{}', expected {}", path, value)),
            },
            BodyCheck::OneOf {
                path,
                values,
                ignore_case,
            } => {
                let actual = match lookup(body, path) {
                    Some(Value::String(s)) => s,
                    Some(other) => return Err(format!("'{}' is not a string: {}", path, other)),
                    None => return Err(format!("missing '{}'", path)),
                };
                let found = values.iter().any(|v| {
                    if *ignore_case {
                        v.to_lowercase() == actual.to_lowercase()
                    } else {
                        v == actual
                    }
                });
                if found {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' is \"{}\", expected one of {:?}",
                        path, actual, values
                    ))
                }
            }
            BodyCheck::AnyNonEmptyString(paths) => {
                let found = paths.iter().any(|p| {
                    matches!(lookup(body, p), Some(Value::String(s)) if !s.trim().is_empty())
                });
                if found {
                    Ok(())
                } else {
                    Err(format!("none of {:?} holds a non-empty string", paths))
                }
            }
            BodyCheck::Echoes { object, fields } => {
                let echoed = match lookup(body, object) {
                    Some(Value::Object(map)) => map,
                    Some(other) => return Err(format!("'{}' is not an object: {}", object, other)),
                    None => return Err(format!("missing '{}'", object)),
                };
                let mut problems = Vec::new();
                for field in fields {
                    let Some(sent) = payload.get(field) else {
                        continue;
                    };
                    match echoed.get(field) {
                        Some(actual) if actual == sent => {}
                        Some(actual) => problems.push(format!(
                            "'{}.{}' is {}, submitted {}",
                            object, field, actual, sent
                        )),
                        None => problems.push(format!("'{}.{}' was not echoed", object, field)),
                    }
                }
                if problems.is_empty() {
                    Ok(())
                } else {
                    Err(problems.join("; "))
                }
            }
            BodyCheck::Custom(check) => {
                if (check.predicate)(body) {
                    Ok(())
                } else {
                    Err(format!("predicate failed: {}", check.description))
                }
            }
        }
    }
}

impl fmt::Display for BodyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyCheck::Exists(p) => write!(f, "exists({})", p),
            BodyCheck::Absent(p) => write!(f, "absent({})", p),
            BodyCheck::IsString(p) => write!(f, "isString({})", p),
            BodyCheck::NonEmptyString(p) => write!(f, "nonEmptyString({})", p),
            BodyCheck::IsObject(p) => write!(f, "isObject({})", p),
            BodyCheck::Equals { path, value } => write!(f, "equals({} == {})", path, value),
            BodyCheck::OneOf { path, values, .. } => write!(f, "oneOf({} in {:?})", path, values),
            BodyCheck::AnyNonEmptyString(paths) => {
                write!(f, "anyNonEmptyString({})", paths.join(" | "))
            }
            BodyCheck::Echoes { object, fields } => {
                write!(f, "echoes({}: {})", object, fields.join(", "))
            }
            BodyCheck::Custom(c) => write!(f, "custom({})", c.description),
        }
    }
}

/// A named request together with the outcome it must produce.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    payload: Payload,
    expected_status: u16,
    body_checks: Vec<BodyCheck>,
    expect_json: bool,
    tags: Vec<String>,
}

impl Scenario {
    pub fn builder(name: &str) -> ScenarioBuilder {
        ScenarioBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn expected_status(&self) -> u16 {
        self.expected_status
    }

    pub fn body_checks(&self) -> &[BodyCheck] {
        &self.body_checks
    }

    pub fn expects_json(&self) -> bool {
        self.expect_json
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Compare an observed response with this scenario's expectations.
    /// Returns every mismatch found; an empty list means the scenario passed.
    pub fn verify(&self, status: u16, body: &ResponseBody) -> Vec<String> {
        let mut problems = Vec::new();

        if status != self.expected_status {
            problems.push(format!(
                "expected status {}, got {}",
                self.expected_status, status
            ));
        }

        match body.json() {
            Some(json) => {
                for check in &self.body_checks {
                    if let Err(reason) = check.verify(json, &self.payload) {
                        problems.push(reason);
                    }
                }
            }
            None if self.expect_json => {
                problems.push(format!("response body is not valid JSON ({})", body.describe()));
            }
            None => {}
        }

        problems
    }

    /// True when the scenario carries every tag in `required`.
    pub fn matches_tags(&self, required: &[String]) -> bool {
        required.iter().all(|t| self.tags.contains(t))
    }

    /// Case-insensitive exact or prefix match on the scenario name.
    pub fn matches_name(&self, name: &str) -> bool {
        let own = self.name.to_lowercase();
        let wanted = name.to_lowercase();
        own == wanted || own.starts_with(&wanted)
    }

    pub fn display_name(&self) -> String {
        format!("{} → {}", self.name, self.expected_status)
    }
}

/// A named scenario table, optionally carrying its own endpoint settings.
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub endpoint: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: Option<u64>,
    pub scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn new(name: &str, scenarios: Vec<Scenario>) -> Self {
        Self {
            name: name.to_string(),
            endpoint: None,
            headers: BTreeMap::new(),
            timeout_ms: None,
            scenarios,
        }
    }

    /// Keep only scenarios carrying every tag in `tags` and matching `name`.
    pub fn select(mut self, tags: Option<&[String]>, name: Option<&str>) -> Self {
        self.scenarios.retain(|s| {
            tags.map_or(true, |t| s.matches_tags(t)) && name.map_or(true, |n| s.matches_name(n))
        });
        self
    }
}

/// Builder for [`Scenario`]. The expected status defaults to 200.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    name: String,
    payload: Payload,
    expected_status: u16,
    body_checks: Vec<BodyCheck>,
    expect_json: Option<bool>,
    tags: Vec<String>,
}

impl ScenarioBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            payload: Payload::new(),
            expected_status: 200,
            body_checks: Vec::new(),
            expect_json: None,
            tags: Vec::new(),
        }
    }

    /// Replace the whole payload.
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Set one payload field. `Value::Null` sends an explicit null.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Drop a payload field so the key is absent from the request.
    pub fn without(mut self, key: &str) -> Self {
        self.payload.remove(key);
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn check(mut self, check: BodyCheck) -> Self {
        self.body_checks.push(check);
        self
    }

    pub fn checks(mut self, checks: impl IntoIterator<Item = BodyCheck>) -> Self {
        self.body_checks.extend(checks);
        self
    }

    pub fn check_with<F>(self, description: &str, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.check(BodyCheck::Custom(CustomCheck::new(description, predicate)))
    }

    /// Require (or waive) a JSON body. Implied by any body check unless set.
    pub fn expect_json(mut self, expect: bool) -> Self {
        self.expect_json = Some(expect);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self = self.tag(tag.as_ref());
        }
        self
    }

    pub fn build(self) -> Scenario {
        let expect_json = self
            .expect_json
            .unwrap_or(!self.body_checks.is_empty());
        Scenario {
            name: self.name,
            payload: self.payload,
            expected_status: self.expected_status,
            body_checks: self.body_checks,
            expect_json,
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn success_body() -> Value {
        json!({
            "message": "Inquiry submitted successfully",
            "data": {"name": "Jane Doe", "phone": "010-1234-5678", "region": "Seoul"}
        })
    }

    #[test]
    fn test_lookup_dot_path_and_pointer() {
        let body = success_body();
        assert_eq!(lookup(&body, "data.name"), Some(&json!("Jane Doe")));
        assert_eq!(lookup(&body, "/data/region"), Some(&json!("Seoul")));
        assert_eq!(lookup(&body, "$"), Some(&body));
        assert!(lookup(&body, "data.email").is_none());
    }

    #[test]
    fn test_builder_defaults_and_overrides() {
        let scenario = Scenario::builder("missing region")
            .field("name", "Jane")
            .field("region", "Seoul")
            .without("region")
            .expect_status(400)
            .tag("validation")
            .tag("validation")
            .build();

        assert_eq!(scenario.expected_status(), 400);
        assert!(!scenario.payload().contains_key("region"));
        assert_eq!(scenario.tags(), ["validation".to_string()]);
        assert!(!scenario.expects_json());
    }

    #[test]
    fn test_body_checks_imply_json() {
        let scenario = Scenario::builder("ok")
            .check(BodyCheck::IsString("message".into()))
            .build();
        assert!(scenario.expects_json());

        let problems = scenario.verify(200, &ResponseBody::Text("<html>".into()));
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("not valid JSON"));
    }

    #[test]
    fn test_verify_reports_every_mismatch() {
        let scenario = Scenario::builder("valid")
            .field("name", "Jane Doe")
            .field("phone", "010-1234-5678")
            .expect_status(200)
            .check(BodyCheck::IsObject("data".into()))
            .check(BodyCheck::Equals {
                path: "data.region".into(),
                value: json!("Busan"),
            })
            .build();

        let problems = scenario.verify(500, &ResponseBody::Json(success_body()));
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("expected status 200, got 500"));
        assert!(problems[1].contains("data.region"));
    }

    #[test]
    fn test_echoes_only_checks_submitted_fields() {
        let mut payload = Payload::new();
        payload.insert("name".into(), json!("Jane Doe"));
        payload.insert("phone".into(), json!("010-1234-5678"));

        let check = BodyCheck::Echoes {
            object: "data".into(),
            fields: vec!["name".into(), "phone".into(), "message".into()],
        };
        assert!(check.verify(&success_body(), &payload).is_ok());

        payload.insert("message".into(), json!("hello"));
        let err = check.verify(&success_body(), &payload).unwrap_err();
        assert!(err.contains("data.message"));
    }

    #[test]
    fn test_one_of_ignore_case() {
        let check = BodyCheck::OneOf {
            path: "message".into(),
            values: vec!["inquiry submitted successfully".into(), "ok".into()],
            ignore_case: true,
        };
        assert!(check.verify(&success_body(), &Payload::new()).is_ok());
    }

    #[test]
    fn test_any_non_empty_string() {
        let check = BodyCheck::AnyNonEmptyString(vec!["error".into(), "message".into()]);
        let empty = Payload::new();
        assert!(check.verify(&json!({"error": "boom"}), &empty).is_ok());
        assert!(check.verify(&json!({"message": "boom"}), &empty).is_ok());
        assert!(check.verify(&json!({"error": "  "}), &empty).is_err());
        assert!(check.verify(&json!({"error": 5}), &empty).is_err());
    }

    #[test]
    fn test_custom_check() {
        let scenario = Scenario::builder("custom")
            .check_with("data has three keys", |body| {
                body["data"].as_object().map_or(false, |m| m.len() == 3)
            })
            .build();
        assert!(scenario
            .verify(200, &ResponseBody::Json(success_body()))
            .is_empty());
    }

    #[test]
    fn test_deserialize_checks_from_yaml() {
        let yaml = r#"
- isString: message
- equals: { path: data.name, value: "Jane Doe" }
- oneOf: { path: message, values: [ok, success], ignoreCase: true }
- anyNonEmptyString: [error, message]
"#;
        let checks: Vec<BodyCheck> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(checks.len(), 4);
        assert!(matches!(
            &checks[2],
            BodyCheck::OneOf { ignore_case: true, .. }
        ));
    }

    #[test]
    fn test_suite_select() {
        let suite = Suite::new(
            "contact",
            vec![
                Scenario::builder("missing name").tag("validation").build(),
                Scenario::builder("missing phone").tag("validation").build(),
                Scenario::builder("valid").tag("success").build(),
            ],
        );
        let tags = vec!["validation".to_string()];
        let selected = suite.clone().select(Some(&tags), None);
        assert_eq!(selected.scenarios.len(), 2);

        let selected = suite.select(Some(&tags), Some("missing p"));
        assert_eq!(selected.scenarios.len(), 1);
        assert_eq!(selected.scenarios[0].name(), "missing phone");
    }

    #[test]
    fn test_matches_name_and_tags() {
        let scenario = Scenario::builder("Invalid phone: empty")
            .tags(["validation", "phone"])
            .build();
        assert!(scenario.matches_name("invalid phone"));
        assert!(!scenario.matches_name("missing"));
        assert!(scenario.matches_tags(&["phone".to_string()]));
        assert!(!scenario.matches_tags(&["success".to_string()]));
    }
}
