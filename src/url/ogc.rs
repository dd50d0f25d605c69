//! Rewriting of bare OGC service endpoints
//!
//! Catalogs frequently publish the service root of a WMS/WFS/WMTS/WCS
//! instead of a capabilities request. Probing the bare root tells us little,
//! so such URLs are turned into a `GetCapabilities` request first.

use url::Url;

/// OGC service families recognized by their declared format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OgcService {
    Wms,
    Wfs,
    Wmts,
    Wcs,
}

impl OgcService {
    /// Maps a resource format tag (e.g. `"ogc:wms"`) to its service family
    pub fn from_format(format: &str) -> Option<Self> {
        match format.trim().to_ascii_lowercase().as_str() {
            "ogc:wms" => Some(Self::Wms),
            "ogc:wfs" => Some(Self::Wfs),
            "ogc:wmts" => Some(Self::Wmts),
            "ogc:wcs" => Some(Self::Wcs),
            _ => None,
        }
    }

    /// The `SERVICE` query value for this family
    pub fn service_token(&self) -> &'static str {
        match self {
            Self::Wms => "WMS",
            Self::Wfs => "WFS",
            Self::Wmts => "WMTS",
            Self::Wcs => "WCS",
        }
    }
}

/// Counts the query parameters that carry both a key and a value
fn query_pair_count(url: &Url) -> usize {
    url.query_pairs()
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .count()
}

/// Same count for text that does not parse as a URL
fn raw_query_pair_count(url: &str) -> usize {
    let Some((_, rest)) = url.split('#').next().unwrap_or("").split_once('?') else {
        return 0;
    };

    rest.split('&')
        .filter(|pair| {
            pair.split_once('=')
                .is_some_and(|(key, value)| !key.is_empty() && !value.is_empty())
        })
        .count()
}

/// Returns the GetCapabilities form of `url` when `format` names an OGC
/// service and the URL carries fewer than two query parameters
///
/// Returns `None` when no rewrite applies.
///
/// # Examples
///
/// ```
/// use ckan_link_checker::url::rewrite_ogc_url;
///
/// assert_eq!(
///     rewrite_ogc_url("http://example.org/geo?foo=1", "ogc:wfs").as_deref(),
///     Some("http://example.org/geo?SERVICE=WFS&REQUEST=GetCapabilities")
/// );
/// assert_eq!(rewrite_ogc_url("http://example.org/geo?a=1&b=2", "ogc:wfs"), None);
/// ```
pub fn rewrite_ogc_url(url: &str, format: &str) -> Option<String> {
    let service = OgcService::from_format(format)?;
    let capabilities = format!(
        "SERVICE={}&REQUEST=GetCapabilities",
        service.service_token()
    );

    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            if query_pair_count(&parsed) >= 2 {
                return None;
            }
            parsed.set_fragment(None);
            parsed.set_query(Some(&capabilities));
            Some(parsed.to_string())
        }
        Err(_) => {
            if raw_query_pair_count(url) >= 2 {
                return None;
            }
            let base = url.split(['?', '#']).next().unwrap_or(url).trim();
            Some(format!("{}?{}", base, capabilities))
        }
    }
}
