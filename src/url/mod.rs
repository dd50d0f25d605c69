//! URL handling module for the link checker
//!
//! This module provides transport classification for resource URLs,
//! network-location extraction for the per-domain statistics, and the
//! OGC capabilities rewrite.

mod domain;
mod ogc;

// Re-export main functions
pub use domain::network_location;
pub use ogc::{rewrite_ogc_url, OgcService};

use url::Url;

/// How a resource URL is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// `http` or `https`
    Http,
    /// `ftp`
    Ftp,
    /// Anything else, including URLs that do not parse
    Other(String),
}

/// Classifies a resource URL by its scheme
///
/// Scheme matching is case-insensitive and ignores surrounding whitespace,
/// which catalogs are prone to. Unparseable URLs are classified as
/// `Other` carrying whatever precedes the first `:` (or an empty string).
///
/// # Examples
///
/// ```
/// use ckan_link_checker::url::{classify_transport, Transport};
///
/// assert_eq!(classify_transport("HTTPS://example.org"), Transport::Http);
/// assert_eq!(classify_transport("ftp://ftp.example.org/pub"), Transport::Ftp);
/// assert_eq!(
///     classify_transport("mailto:someone@example.org"),
///     Transport::Other("mailto".to_string())
/// );
/// ```
pub fn classify_transport(url: &str) -> Transport {
    let scheme = match Url::parse(url.trim()) {
        Ok(parsed) => parsed.scheme().to_string(),
        Err(_) => url
            .trim()
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default(),
    };

    match scheme.as_str() {
        "http" | "https" => Transport::Http,
        "ftp" => Transport::Ftp,
        _ => Transport::Other(scheme),
    }
}
