//! FTP reachability probe
//!
//! Opens a control connection, logs in anonymously and changes into the
//! URL's path. No data connection is opened. The blocking FTP client runs
//! on tokio's blocking pool with socket timeouts, and the whole exchange is
//! bounded by the same timeout on the async side.

use crate::crawler::prober::ProbeOutcome;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use suppaftp::FtpStream;
use url::{Host, Url};

const DEFAULT_FTP_PORT: u16 = 21;
const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Where an FTP resource lives
#[derive(Debug, Clone, PartialEq, Eq)]
struct FtpTarget {
    host: String,
    port: u16,
    path: String,
}

impl FtpTarget {
    fn parse(url: &str) -> Result<Self, String> {
        let parsed = Url::parse(url.trim()).map_err(|e| format!("invalid FTP URL: {}", e))?;

        // IPv6 literals are kept without brackets so they resolve
        let host = match parsed.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err("FTP URL has no host".to_string()),
        };

        // The server expects the directory name as written, not URL-encoded
        let mut path = urlencoding::decode(parsed.path())
            .map_err(|e| format!("invalid FTP path: {}", e))?
            .into_owned();
        if let Some(query) = parsed.query() {
            path.push('?');
            path.push_str(query);
        }
        if path.is_empty() {
            path.push('/');
        }

        Ok(Self {
            host,
            port: parsed.port().unwrap_or(DEFAULT_FTP_PORT),
            path,
        })
    }

    fn resolve(&self) -> Result<SocketAddr, String> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| format!("{}: {}", self.host, e))?
            .next()
            .ok_or_else(|| format!("{}: no address found", self.host))
    }
}

/// Probes an `ftp://` URL
///
/// Any protocol or network error maps to `Failed { status_code: 0, .. }`.
pub async fn probe_ftp(url: &str, timeout: Duration) -> ProbeOutcome {
    let target = match FtpTarget::parse(url) {
        Ok(t) => t,
        Err(reason) => return ProbeOutcome::transport_failure(reason),
    };

    let handle = tokio::task::spawn_blocking(move || check_ftp(&target, timeout));

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(()))) => ProbeOutcome::Ok,
        Ok(Ok(Err(reason))) => ProbeOutcome::transport_failure(reason),
        Ok(Err(join_error)) => {
            ProbeOutcome::transport_failure(format!("FTP check aborted: {}", join_error))
        }
        Err(_) => ProbeOutcome::transport_failure(format!(
            "FTP check timed out after {}s",
            timeout.as_secs()
        )),
    }
}

/// Runs the blocking FTP conversation
fn check_ftp(target: &FtpTarget, timeout: Duration) -> Result<(), String> {
    let addr = target.resolve()?;

    let mut ftp = FtpStream::connect_timeout(addr, timeout).map_err(|e| e.to_string())?;
    ftp.get_ref()
        .set_read_timeout(Some(timeout))
        .and_then(|_| ftp.get_ref().set_write_timeout(Some(timeout)))
        .map_err(|e| e.to_string())?;

    ftp.login(ANONYMOUS_USER, ANONYMOUS_PASSWORD)
        .map_err(|e| e.to_string())?;
    ftp.cwd(&target.path).map_err(|e| e.to_string())?;

    if let Err(e) = ftp.quit() {
        tracing::debug!("FTP QUIT to {} failed: {}", target.host, e);
    }

    Ok(())
}
