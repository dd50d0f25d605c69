use serde::Deserialize;

/// Main configuration structure for the link checker
///
/// Every section has defaults, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub checker: CheckerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// What to do with resource URLs that are neither HTTP(S) nor FTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownSchemePolicy {
    /// Count the resource as reachable without touching the network
    #[default]
    AssumeOk,
    /// Record the resource as failed with status code 0
    AssumeFailed,
    /// Issue an HTTP GET anyway and report whatever happens
    AttemptHttp,
}

/// Link checking behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Timeout for each HTTP resource probe (seconds)
    #[serde(rename = "http-timeout-secs")]
    pub http_timeout_secs: u64,

    /// Timeout for FTP connect and control operations (seconds)
    #[serde(rename = "ftp-timeout-secs")]
    pub ftp_timeout_secs: u64,

    /// Pause before every resource probe (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Rewrite bare OGC service endpoints into GetCapabilities requests
    #[serde(rename = "rewrite-ogc-urls")]
    pub rewrite_ogc_urls: bool,

    #[serde(rename = "unknown-scheme-policy")]
    pub unknown_scheme_policy: UnknownSchemePolicy,

    /// Backoff growth after each failed dataset fetch (seconds)
    #[serde(rename = "backoff-step-secs")]
    pub backoff_step_secs: u64,

    /// Attempts per dataset before giving up; unbounded when absent
    #[serde(rename = "max-fetch-attempts")]
    pub max_fetch_attempts: Option<u32>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 20,
            ftp_timeout_secs: 30,
            request_delay_ms: 250,
            rewrite_ogc_urls: true,
            unknown_scheme_policy: UnknownSchemePolicy::AssumeOk,
            backoff_step_secs: 10,
            max_fetch_attempts: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub name: String,
    pub version: String,

    /// URL or email address with information about the operator
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "ckan-link-checker".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!("{}/{} (+{})", self.name, self.version, contact),
            None => format!("{}/{}", self.name, self.version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory in which each run creates its `results_*` folder
    #[serde(rename = "results-root")]
    pub results_root: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_root: ".".to_string(),
        }
    }
}
