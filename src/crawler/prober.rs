//! Resource URL prober
//!
//! This module decides whether a single resource link is reachable:
//! - Building the HTTP client with the configured user agent
//! - GET probes for HTTP(S) links
//! - Anonymous login + CWD probes for FTP links (see [`super::ftp`])
//! - The policy for links with any other scheme
//! - The OGC GetCapabilities rewrite applied before probing
//!
//! Probing never fails: every problem is folded into [`ProbeOutcome::Failed`].

use crate::catalog::Resource;
use crate::config::{Config, UnknownSchemePolicy, UserAgentConfig};
use crate::crawler::ftp::probe_ftp;
use crate::url::{classify_transport, rewrite_ogc_url, Transport};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Result of probing one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The link answered as expected
    Ok,

    /// The link is broken
    Failed {
        /// HTTP status code, or 0 for transport-level failures
        status_code: u16,
        /// Reason phrase or error description
        reason: String,
    },
}

impl ProbeOutcome {
    /// Creates a transport-level failure (status code 0)
    pub fn transport_failure(reason: impl Into<String>) -> Self {
        Self::Failed {
            status_code: 0,
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed, so a link that redirects to a working page
/// counts as working.
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Total timeout for each request
///
/// # Example
///
/// ```no_run
/// use ckan_link_checker::config::UserAgentConfig;
/// use ckan_link_checker::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(20)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Probes resource links according to the checker configuration
pub struct Prober {
    client: Client,
    ftp_timeout: Duration,
    request_delay: Duration,
    rewrite_ogc_urls: bool,
    unknown_scheme_policy: UnknownSchemePolicy,
}

impl Prober {
    /// Creates a prober from the checker configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let checker = &config.checker;
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(checker.http_timeout_secs),
        )?;

        Ok(Self {
            client,
            ftp_timeout: Duration::from_secs(checker.ftp_timeout_secs),
            request_delay: Duration::from_millis(checker.request_delay_ms),
            rewrite_ogc_urls: checker.rewrite_ogc_urls,
            unknown_scheme_policy: checker.unknown_scheme_policy,
        })
    }

    /// The URL that will actually be requested for `resource`
    pub fn target_url(&self, resource: &Resource) -> String {
        let url = resource.url().trim();
        if self.rewrite_ogc_urls {
            if let Some(rewritten) = rewrite_ogc_url(url, resource.format()) {
                return rewritten;
            }
        }
        url.to_string()
    }

    /// Probes a single resource
    ///
    /// The politeness delay is applied before every probe that touches
    /// the network.
    pub async fn probe(&self, resource: &Resource) -> ProbeOutcome {
        let url = self.target_url(resource);
        if url != resource.url() {
            tracing::debug!("Rewrote {} to {}", resource.url(), url);
        }

        match classify_transport(&url) {
            Transport::Http => {
                self.pause().await;
                probe_http(&self.client, &url).await
            }
            Transport::Ftp => {
                self.pause().await;
                probe_ftp(&url, self.ftp_timeout).await
            }
            Transport::Other(scheme) => match self.unknown_scheme_policy {
                UnknownSchemePolicy::AssumeOk => {
                    tracing::debug!("Not checking {} (scheme '{}')", url, scheme);
                    ProbeOutcome::Ok
                }
                UnknownSchemePolicy::AssumeFailed => {
                    if scheme.is_empty() {
                        ProbeOutcome::transport_failure("missing URL scheme")
                    } else {
                        ProbeOutcome::transport_failure(format!(
                            "unsupported URL scheme: {}",
                            scheme
                        ))
                    }
                }
                UnknownSchemePolicy::AttemptHttp => {
                    self.pause().await;
                    probe_http(&self.client, &url).await
                }
            },
        }
    }

    async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }
}

/// Probes a URL with an HTTP GET
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | HTTP 200 (after redirects) | `Ok` |
/// | Any other status | `Failed { status, reason phrase }` |
/// | Timeout, connection error, malformed URL | `Failed { 0, error text }` |
pub async fn probe_http(client: &Client, url: &str) -> ProbeOutcome {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            if status == StatusCode::OK {
                return ProbeOutcome::Ok;
            }

            ProbeOutcome::Failed {
                status_code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            }
        }
        Err(e) => {
            let reason = if e.is_timeout() {
                format!("Request timeout: {}", e)
            } else {
                e.to_string()
            };
            ProbeOutcome::transport_failure(reason)
        }
    }
}
