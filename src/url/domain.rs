use url::Url;

/// Extracts the network location (`host[:port]`) from a URL string
///
/// The port is only included when it is written explicitly and differs from
/// the scheme's default. URLs that cannot be parsed or that carry no host
/// yield an empty string, so that they are still counted (under `""`) by
/// the domain aggregation.
///
/// # Examples
///
/// ```
/// use ckan_link_checker::url::network_location;
///
/// assert_eq!(network_location("https://Data.Example.org/x"), "data.example.org");
/// assert_eq!(network_location("http://example.org:8080/x"), "example.org:8080");
/// assert_eq!(network_location("not a url"), "");
/// ```
pub fn network_location(url: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return String::new();
    };

    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host.to_lowercase(), port),
        (Some(host), None) => host.to_lowercase(),
        (None, _) => String::new(),
    }
}
