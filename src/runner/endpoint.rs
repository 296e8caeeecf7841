use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{CheckerError, Result};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// The service under test. Read-only once built.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base_url: String,
    default_headers: BTreeMap<String, String>,
    timeout: Duration,
}

impl Endpoint {
    pub fn builder(base_url: &str) -> EndpointBuilder {
        EndpointBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| CheckerError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| CheckerError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    base_url: String,
    default_headers: BTreeMap<String, String>,
    timeout: Duration,
}

impl EndpointBuilder {
    pub fn new(base_url: &str) -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert(
            CONTENT_TYPE.as_str().to_string(),
            "application/json".to_string(),
        );
        Self {
            base_url: base_url.trim().to_string(),
            default_headers,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Add or replace a default header. Names are case-insensitive.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let key = name.trim().to_ascii_lowercase();
        self.default_headers.insert(key, value.trim().to_string());
        self
    }

    pub fn headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_ms(self, timeout_ms: u64) -> Self {
        self.timeout(Duration::from_millis(timeout_ms))
    }

    pub fn build(self) -> Result<Endpoint> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| CheckerError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(CheckerError::InvalidUrl {
                url: self.base_url,
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let endpoint = Endpoint {
            base_url: self.base_url,
            default_headers: self.default_headers,
            timeout: self.timeout,
        };
        // Reject bad header names and values up front.
        endpoint.header_map()?;
        Ok(endpoint)
    }
}

/// Parse a `Name=Value` (or `Name: Value`) CLI header argument. The first
/// separator wins, so values may contain either character.
pub fn parse_header_arg(raw: &str) -> Option<(String, String)> {
    let at = raw.find(|c: char| c == '=' || c == ':')?;
    let (name, value) = (&raw[..at], &raw[at + 1..]);
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
