//! CKAN action API client
//!
//! Talks to the two read-only actions the checker needs, `package_list`
//! and `package_show`. Dataset fetches are retried with the ratcheting
//! backoff from [`super::backoff`].

use crate::catalog::backoff::{AttemptOutcome, Backoff};
use crate::catalog::types::{error_details, is_version_3_body, DatasetFetch, DatasetList, Package};
use crate::config::Config;
use crate::crawler::build_http_client;
use crate::url::network_location;
use crate::{CheckerError, ConfigError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Timeout for calls to the catalog API itself
const API_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for a CKAN version 3 endpoint
pub struct CkanClient {
    client: Client,
    endpoint: Url,
    action_base: Url,
    backoff: Backoff,
    max_attempts: Option<u32>,
}

impl CkanClient {
    /// Connects to `endpoint` and verifies that it is a CKAN version 3 API
    ///
    /// # Arguments
    ///
    /// * `endpoint` - API base URL, e.g. `https://data.example.org/api/3`
    /// * `config` - The checker configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CkanClient)` - The endpoint answered with the version 3 discovery body
    /// * `Err(CheckerError)` - Bad URL, unreachable endpoint, or not a version 3 API
    pub async fn connect(endpoint: &str, config: &Config) -> Result<Self, CheckerError> {
        let endpoint_url = Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        if !matches!(endpoint_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: catalog endpoint must use http or https",
                endpoint
            ))
            .into());
        }

        let client = build_http_client(&config.user_agent, API_TIMEOUT)?;

        tracing::debug!("Checking API version at {}", endpoint_url);
        let body = client
            .get(endpoint_url.clone())
            .send()
            .await
            .map_err(|source| CheckerError::Http {
                url: endpoint_url.to_string(),
                source,
            })?
            .text()
            .await?;

        if !is_version_3_body(&body) {
            return Err(ConfigError::NotCkanEndpoint(endpoint.to_string()).into());
        }

        let action_base = Url::parse(&format!(
            "{}/action/",
            endpoint_url.as_str().trim_end_matches('/')
        ))?;

        Ok(Self {
            client,
            endpoint: endpoint_url,
            action_base,
            backoff: Backoff::new(config.checker.backoff_step_secs),
            max_attempts: config.checker.max_fetch_attempts,
        })
    }

    /// Network location of the endpoint, used to name result folders
    pub fn host(&self) -> String {
        network_location(self.endpoint.as_str())
    }

    /// Current backoff delay carried into the next dataset fetch
    pub fn backoff_delay(&self) -> Duration {
        self.backoff.current()
    }

    /// Retrieves the names of all datasets in catalog order
    ///
    /// Any failure here is fatal for the run: there is nothing to check
    /// without the list.
    pub async fn list_dataset_names(&self) -> Result<DatasetList, CheckerError> {
        let url = self.action_base.join("package_list")?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CheckerError::Http {
                url: url.to_string(),
                source,
            })?;

        // Error envelopes arrive with non-2xx statuses too (e.g. 403)
        let status = response.status();
        let text = response.text().await?;

        let document: Value = match serde_json::from_str(&text) {
            Ok(document) => document,
            Err(_) if !status.is_success() => {
                return Err(CheckerError::UnexpectedResponse {
                    url: url.to_string(),
                    message: format!("HTTP {}", status),
                })
            }
            Err(e) => return Err(e.into()),
        };

        match document.get("success").and_then(Value::as_bool) {
            Some(true) => {}
            Some(false) => {
                let (kind, message) = error_details(&document);
                return Err(CheckerError::Catalog { kind, message });
            }
            None => {
                return Err(CheckerError::UnexpectedResponse {
                    url: url.to_string(),
                    message: format!("HTTP {}: missing 'success' flag", status),
                })
            }
        }

        let names = document
            .get("result")
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| CheckerError::UnexpectedResponse {
                url: url.to_string(),
                message: "'result' is not a list of dataset names".to_string(),
            })?;

        Ok(DatasetList { names, document })
    }

    /// Fetches one dataset, retrying transient failures
    ///
    /// Connection failures and bodies that are not a CKAN response envelope
    /// are retried after the current backoff delay. A well-formed error
    /// envelope is not retried; it is returned as [`DatasetFetch::Failed`]
    /// so the caller can persist it and move on. When a retry ceiling is
    /// configured and exhausted, a synthesized error body is returned.
    pub async fn fetch_dataset(&mut self, name: &str) -> DatasetFetch {
        let mut attempts: u32 = 0;

        loop {
            let delay = self.backoff.current();
            if !delay.is_zero() {
                tracing::info!("Sleep {} seconds before fetching {}", delay.as_secs(), name);
                tokio::time::sleep(delay).await;
            }

            attempts += 1;
            match self.attempt_fetch(name).await {
                Ok(envelope) => {
                    self.backoff.record(AttemptOutcome::Success);
                    return interpret_show_response(envelope);
                }
                Err(cause) => {
                    self.backoff.record(AttemptOutcome::Failure);
                    tracing::warn!("Fetching dataset {} failed (attempt {}): {}", name, attempts, cause);

                    if self.max_attempts.is_some_and(|max| attempts >= max) {
                        let message = format!("gave up after {} attempts: {}", attempts, cause);
                        return DatasetFetch::Failed {
                            document: json!({
                                "__type": "Retries Exhausted",
                                "message": message,
                            }),
                            reason: message,
                        };
                    }
                }
            }
        }
    }

    /// Issues a single `package_show` call
    ///
    /// Returns the parsed envelope, or the cause of a retryable failure.
    async fn attempt_fetch(&self, name: &str) -> Result<Value, String> {
        let url = self
            .action_base
            .join("package_show")
            .map_err(|e| e.to_string())?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(json!({ "id": name }).to_string())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let text = response.text().await.map_err(|e| e.to_string())?;

        match serde_json::from_str::<Value>(&text) {
            Ok(envelope) if envelope.get("success").and_then(Value::as_bool).is_some() => {
                Ok(envelope)
            }
            Ok(_) => Err(format!("HTTP {}: response is not a CKAN envelope", status)),
            Err(e) => Err(format!("HTTP {}: invalid JSON: {}", status, e)),
        }
    }
}

/// Turns a well-formed `package_show` envelope into a [`DatasetFetch`]
fn interpret_show_response(envelope: Value) -> DatasetFetch {
    let success = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    match envelope.get("result") {
        Some(result) if success && envelope.get("error").is_none() => {
            match serde_json::from_value::<Package>(result.clone()) {
                Ok(package) => DatasetFetch::Found {
                    package,
                    document: result.clone(),
                },
                Err(e) => DatasetFetch::Failed {
                    document: result.clone(),
                    reason: format!("unreadable dataset document: {}", e),
                },
            }
        }
        _ => {
            let (kind, message) = error_details(&envelope);
            let document = envelope
                .get("error")
                .cloned()
                .unwrap_or_else(|| envelope.clone());
            DatasetFetch::Failed {
                document,
                reason: format!("{}: {}", kind, message),
            }
        }
    }
}
