use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

fn var_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\$\{([a-zA-Z0-9_.]+)\}").ok())
        .as_ref()
}

/// Variables visible while a suite file is expanded into scenarios.
///
/// Lookup order is data-row variables first, then the process environment.
#[derive(Debug, Clone, Default)]
pub struct SuiteContext {
    pub vars: HashMap<String, String>,
    use_process_env: bool,
}

impl SuiteContext {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            use_process_env: true,
        }
    }

    /// Context that never consults the process environment.
    pub fn isolated() -> Self {
        Self {
            vars: HashMap::new(),
            use_process_env: false,
        }
    }

    pub fn with_vars(&self, vars: &HashMap<String, String>) -> Self {
        let mut next = self.clone();
        for (k, v) in vars {
            next.vars.insert(k.clone(), v.clone());
        }
        next
    }

    pub fn get_var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned().or_else(|| {
            if self.use_process_env {
                std::env::var(name).ok()
            } else {
                None
            }
        })
    }

    /// Substitute `${name}` patterns. Unknown names are left as written.
    pub fn substitute_vars(&self, text: &str) -> String {
        let Some(re) = var_pattern() else {
            return text.to_string();
        };
        re.replace_all(text, |caps: &regex::Captures| {
            let key = &caps[1];
            if let Some(val) = self.get_var(key) {
                return val;
            }
            match key {
                "timestamp" => chrono::Utc::now().timestamp().to_string(),
                "date" => chrono::Local::now().format("%Y-%m-%d").to_string(),
                _ => format!("${{{}}}", key),
            }
        })
        .to_string()
    }

    /// Substitute inside every string of a JSON value.
    ///
    /// A string that is exactly one `${name}` reference whose value is the
    /// literal `null` becomes JSON null, so data rows can send nulls.
    pub fn substitute_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => {
                let replaced = self.substitute_vars(s);
                if replaced == "null" && s.starts_with("${") && s.ends_with('}') {
                    Value::Null
                } else {
                    Value::String(replaced)
                }
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.substitute_value(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.substitute_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(pairs: &[(&str, &str)]) -> SuiteContext {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SuiteContext::isolated().with_vars(&vars)
    }

    #[test]
    fn test_substitute_known_and_unknown() {
        let c = ctx(&[("host", "localhost:3000")]);
        assert_eq!(
            c.substitute_vars("http://${host}/api/${path}"),
            "http://localhost:3000/api/${path}"
        );
    }

    #[test]
    fn test_substitute_value_recurses_and_maps_null() {
        let c = ctx(&[("phone", "null"), ("name", "Kim")]);
        let value = json!({"name": "${name}", "phone": "${phone}", "tags": ["${name}"], "n": 1});
        assert_eq!(
            c.substitute_value(&value),
            json!({"name": "Kim", "phone": null, "tags": ["Kim"], "n": 1})
        );
    }

    #[test]
    fn test_process_env_fallback() {
        std::env::set_var("CONTRACT_CHECKER_CONTEXT_TEST", "from-env");
        let c = SuiteContext::new();
        assert_eq!(
            c.substitute_vars("${CONTRACT_CHECKER_CONTEXT_TEST}"),
            "from-env"
        );
        assert_eq!(
            SuiteContext::isolated().substitute_vars("${CONTRACT_CHECKER_CONTEXT_TEST}"),
            "${CONTRACT_CHECKER_CONTEXT_TEST}"
        );
    }
}
