//! Client configuration (environment-provided).

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;
use crate::retry::{DEFAULT_ATTEMPTS, DEFAULT_BASE_DELAY, RetryPolicy};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_COMPANY_NAME: &str = "Visual ERP";
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

pub const ENV_API_URL: &str = "VISUAL_ERP_API_URL";
pub const ENV_API_TOKEN: &str = "VISUAL_ERP_API_TOKEN";
pub const ENV_COMPANY_NAME: &str = "VISUAL_ERP_COMPANY_NAME";
pub const ENV_COMPANY_WEBSITE: &str = "VISUAL_ERP_COMPANY_WEBSITE";
pub const ENV_RETRY_ATTEMPTS: &str = "VISUAL_ERP_RETRY_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "VISUAL_ERP_RETRY_DELAY_MS";
pub const ENV_PROBE_INTERVAL_SECS: &str = "VISUAL_ERP_PROBE_INTERVAL_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "VISUAL_ERP_REQUEST_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "VISUAL_ERP_SESSION_FILE";

/// Company identity printed on shareable sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyProfile {
    pub name: String,
    pub website: Option<String>,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_COMPANY_NAME.to_string(),
            website: None,
        }
    }
}

/// Everything the client needs to talk to one backend.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub company: CompanyProfile,
    pub retry: RetryPolicy,
    pub probe_interval: Duration,
    pub request_timeout: Option<Duration>,
    pub session_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base_url(&base_url.into()),
            api_token: None,
            company: CompanyProfile::default(),
            retry: RetryPolicy::default(),
            probe_interval: DEFAULT_PROBE_INTERVAL,
            request_timeout: None,
            session_file: None,
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_company(mut self, company: CompanyProfile) -> Self {
        self.company = company;
        self
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (environment, test map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Url::parse(&base_url).map_err(|e| ConfigError::invalid(ENV_API_URL, e.to_string()))?;

        let attempts = match get(ENV_RETRY_ATTEMPTS) {
            Some(v) => parse_number::<u32>(ENV_RETRY_ATTEMPTS, &v)?,
            None => DEFAULT_ATTEMPTS,
        };
        if attempts == 0 {
            return Err(ConfigError::invalid(ENV_RETRY_ATTEMPTS, "must be at least 1"));
        }
        let base_delay = match get(ENV_RETRY_DELAY_MS) {
            Some(v) => Duration::from_millis(parse_number::<u64>(ENV_RETRY_DELAY_MS, &v)?),
            None => DEFAULT_BASE_DELAY,
        };
        let probe_interval = match get(ENV_PROBE_INTERVAL_SECS) {
            Some(v) => match parse_number::<u64>(ENV_PROBE_INTERVAL_SECS, &v)? {
                0 => return Err(ConfigError::invalid(ENV_PROBE_INTERVAL_SECS, "must be positive")),
                secs => Duration::from_secs(secs),
            },
            None => DEFAULT_PROBE_INTERVAL,
        };
        let request_timeout = get(ENV_REQUEST_TIMEOUT_SECS)
            .map(|v| parse_number::<u64>(ENV_REQUEST_TIMEOUT_SECS, &v))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            base_url: trim_base_url(&base_url),
            api_token: get(ENV_API_TOKEN),
            company: CompanyProfile {
                name: get(ENV_COMPANY_NAME).unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
                website: get(ENV_COMPANY_WEBSITE),
            },
            retry: RetryPolicy::new(attempts, base_delay),
            probe_interval,
            request_timeout,
            session_file: get(ENV_SESSION_FILE).map(PathBuf::from),
        })
    }

    /// Whether the base URL points at a loopback or placeholder host.
    pub fn is_dev_target(&self) -> bool {
        match Url::parse(&self.base_url) {
            Ok(url) => url.host_str().map(is_dev_host).unwrap_or(true),
            Err(_) => true,
        }
    }

    pub fn has_api_token(&self) -> bool {
        self.api_token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

impl core::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("company", &self.company)
            .field("retry", &self.retry)
            .field("probe_interval", &self.probe_interval)
            .field("request_timeout", &self.request_timeout)
            .field("session_file", &self.session_file)
            .finish()
    }
}

/// Loopback addresses, `localhost`, mDNS names and documentation placeholders.
pub fn is_dev_host(host: &str) -> bool {
    let host = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase();

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    host == "localhost"
        || host.ends_with(".localhost")
        || host.ends_with(".local")
        || host == "example.com"
        || host.ends_with(".example.com")
        || host.ends_with(".example")
        || host.contains("your-")
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_number<T: core::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::invalid(key, format!("'{value}' is not a valid number")))
}
