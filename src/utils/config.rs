use std::fmt;

use crate::runner::endpoint::DEFAULT_TIMEOUT_MS;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/contact";
pub const DEFAULT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const DEFAULT_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Overrides read by [`CheckerConfig::from_env`].
pub const URL_ENV: &str = "CONTRACT_CHECKER_URL";
pub const TIMEOUT_ENV: &str = "CONTRACT_CHECKER_TIMEOUT_MS";

/// Values that must not appear in a real secret.
const PLACEHOLDER_MARKERS: [&str; 4] = ["hardcoded", "token", "chatid", "1234"];
const MIN_TOKEN_LEN: usize = 11;
const MIN_CHAT_ID_LEN: usize = 4;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CheckerConfig {
    /// Endpoint used when neither the CLI nor a suite file names one
    pub base_url: String,

    /// Per-request timeout (ms)
    pub timeout_ms: u64,

    /// Name of the variable holding the notification bot token
    pub token_var: String,

    /// Name of the variable holding the notification chat id
    pub chat_id_var: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            token_var: DEFAULT_TOKEN_VAR.to_string(),
            chat_id_var: DEFAULT_CHAT_ID_VAR.to_string(),
        }
    }
}

impl CheckerConfig {
    /// Defaults overlaid with `CONTRACT_CHECKER_*` process variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(URL_ENV).filter(|u| !u.trim().is_empty()) {
            log::info!("Using endpoint from {}", URL_ENV);
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.timeout_ms = ms,
                _ => log::warn!(
                    "Ignoring {}={:?}: expected a positive number of milliseconds",
                    TIMEOUT_ENV,
                    raw
                ),
            }
        }

        config
    }
}

/// Why a secret looks wrong. Never carries the secret itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretIssue {
    Missing { var: String },
    Empty { var: String },
    TooShort { var: String, min_len: usize },
    Placeholder { var: String, marker: String },
}

impl fmt::Display for SecretIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretIssue::Missing { var } => write!(f, "{} is not set", var),
            SecretIssue::Empty { var } => write!(f, "{} is empty", var),
            SecretIssue::TooShort { var, min_len } => write!(
                f,
                "{} is shorter than {} characters, possibly hardcoded or invalid",
                var, min_len
            ),
            SecretIssue::Placeholder { var, marker } => {
                write!(f, "{} contains suspicious substring '{}'", var, marker)
            }
        }
    }
}

/// Notification secrets the contact endpoint depends on.
///
/// Loaded once at the start of a run. Only their presence and superficial
/// plausibility are checked; the values are never sent anywhere.
pub struct EnvSecrets {
    token_var: String,
    chat_id_var: String,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl fmt::Debug for EnvSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSecrets")
            .field("token_var", &self.token_var)
            .field("chat_id_var", &self.chat_id_var)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl EnvSecrets {
    pub fn load(config: &CheckerConfig) -> Self {
        Self::from_lookup(config, |name| match std::env::var(name) {
            Ok(value) => Some(value),
            Err(std::env::VarError::NotPresent) => None,
            Err(e) => {
                log::warn!("Could not read {}: {}", name, e);
                None
            }
        })
    }

    pub fn from_lookup<F>(config: &CheckerConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            token_var: config.token_var.clone(),
            chat_id_var: config.chat_id_var.clone(),
            bot_token: lookup(&config.token_var),
            chat_id: lookup(&config.chat_id_var),
        }
    }

    /// Every plausibility problem found across both secrets.
    pub fn validate(&self) -> Vec<SecretIssue> {
        let mut issues = Vec::new();
        check_secret(
            &self.token_var,
            self.bot_token.as_deref(),
            MIN_TOKEN_LEN,
            &mut issues,
        );
        check_secret(
            &self.chat_id_var,
            self.chat_id.as_deref(),
            MIN_CHAT_ID_LEN,
            &mut issues,
        );
        issues
    }
}

fn check_secret(var: &str, value: Option<&str>, min_len: usize, issues: &mut Vec<SecretIssue>) {
    let Some(value) = value else {
        issues.push(SecretIssue::Missing {
            var: var.to_string(),
        });
        return;
    };
    if value.trim().is_empty() {
        issues.push(SecretIssue::Empty {
            var: var.to_string(),
        });
        return;
    }
    if value.chars().count() < min_len {
        issues.push(SecretIssue::TooShort {
            var: var.to_string(),
            min_len,
        });
    }
    let lowered = value.to_lowercase();
    for marker in PLACEHOLDER_MARKERS {
        if lowered.contains(marker) {
            issues.push(SecretIssue::Placeholder {
                var: var.to_string(),
                marker: marker.to_string(),
            });
        }
    }
}
