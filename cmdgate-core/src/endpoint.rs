//! Gate endpoint normalization.
//!
//! Operators configure the gate address loosely: `gate:8080/api`,
//! `//gate/api` and `https://gate/api` are all accepted. Normalization turns
//! any of these into one canonical absolute URL, once, at construction time.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use tracing::info;

use crate::config::ConfigError;

/// A normalized, absolute gate URL.
///
/// Always carries a host and an `http`/`https` scheme. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateEndpoint {
    url: Url,
}

impl GateEndpoint {
    /// Normalize a raw endpoint string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the trimmed input is empty, does not parse as
    /// a URL once a scheme is supplied, has no host, or uses a scheme other
    /// than `http`/`https`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let endpoint = normalize(raw)?;
        info!(endpoint = %endpoint, "Normalized gate endpoint");
        Ok(endpoint)
    }

    /// Canonical string form, used for requests and logs.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The parsed URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `http` or `https`.
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host name or address literal.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Port, falling back to the scheme default.
    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(80)
    }

    /// Request path; `/` when none was given.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Whether requests to this endpoint are made over TLS.
    pub fn uses_tls(&self) -> bool {
        self.url.scheme() == "https"
    }
}

impl fmt::Display for GateEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateEndpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

/// Normalize without logging; `GateEndpoint::parse` is the logged entry point.
fn normalize(raw: &str) -> Result<GateEndpoint, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyEndpoint);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else if trimmed.starts_with("//") {
        format!("http:{trimmed}")
    } else {
        format!("http://{trimmed}")
    };

    let mut url = Url::parse(&candidate).map_err(|e| ConfigError::InvalidUrl {
        url: trimmed.to_string(),
        message: e.to_string(),
    })?;

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::MissingHost {
            url: trimmed.to_string(),
        });
    }

    // Special schemes always yield a rooted path; other schemes may not.
    let path = url.path().to_string();
    if !path.is_empty() && !path.starts_with('/') {
        url.set_path(&format!("/{path}"));
    }

    match url.scheme() {
        "http" | "https" => Ok(GateEndpoint { url }),
        scheme => Err(ConfigError::UnsupportedScheme {
            url: trimmed.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_port_gets_http_scheme() {
        let ep = GateEndpoint::parse("gate.example.com:8080").unwrap();
        assert_eq!(ep.scheme(), "http");
        assert_eq!(ep.host(), "gate.example.com");
        assert_eq!(ep.port(), 8080);
        assert_eq!(ep.path(), "/");
        assert_eq!(ep.as_str(), "http://gate.example.com:8080/");
    }

    #[test]
    fn test_host_port_path() {
        let ep = GateEndpoint::parse("gate.example.com:8080/api").unwrap();
        assert_eq!(ep.as_str(), "http://gate.example.com:8080/api");
        assert_eq!(ep.path(), "/api");
    }

    #[test]
    fn test_scheme_relative_input() {
        let ep = GateEndpoint::parse("//host/path").unwrap();
        assert_eq!(ep.scheme(), "http");
        assert_eq!(ep.host(), "host");
        assert_eq!(ep.path(), "/path");
    }

    #[test]
    fn test_fully_qualified_https_kept() {
        let ep = GateEndpoint::parse("https://gate.example.com/v1/authorize").unwrap();
        assert!(ep.uses_tls());
        assert_eq!(ep.port(), 443);
        assert_eq!(ep.as_str(), "https://gate.example.com/v1/authorize");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let ep = GateEndpoint::parse("  gate:9000/api \n").unwrap();
        assert_eq!(ep.as_str(), "http://gate:9000/api");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in [
            "gate.example.com:8080",
            "gate.example.com:8080/api",
            "//host/path",
            "https://gate/a/b?x=1",
            "10.0.0.5:7000",
        ] {
            let once = GateEndpoint::parse(raw).unwrap();
            let twice = GateEndpoint::parse(once.as_str()).unwrap();
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        assert!(matches!(
            GateEndpoint::parse(""),
            Err(ConfigError::EmptyEndpoint)
        ));
        assert!(matches!(
            GateEndpoint::parse("   \t"),
            Err(ConfigError::EmptyEndpoint)
        ));
    }

    #[test]
    fn test_unparsable_endpoint_rejected() {
        assert!(matches!(
            GateEndpoint::parse("gate:notaport/api"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            GateEndpoint::parse("http://"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        let result = GateEndpoint::parse("ftp://gate.example.com/upload");
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedScheme { ref scheme, .. }) if scheme == "ftp"
        ));
    }

    #[test]
    fn test_from_str() {
        let ep: GateEndpoint = "gate:1234".parse().unwrap();
        assert_eq!(ep.to_string(), "http://gate:1234/");
    }
}
