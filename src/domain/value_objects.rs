//! # Domain Value Objects
//!
//! Immutable value types defined by their attributes rather than identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validated product page URL.
///
/// The pipeline's only hard input gate: every downstream stage assumes an
/// absolute http(s) URL with a non-empty host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductUrl {
    url: String,
    host: String,
    is_secure: bool,
}

impl ProductUrl {
    /// Parses and validates a candidate product URL.
    ///
    /// # Errors
    /// Returns an error for empty input, unparseable URLs, non-http(s)
    /// schemes, and URLs without a host.
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UrlError::Empty);
        }

        let parsed = url::Url::parse(trimmed).map_err(|_| UrlError::InvalidFormat)?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(UrlError::UnsupportedScheme {
                    scheme: other.to_string(),
                });
            }
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(UrlError::NoHost)?
            .to_string();

        Ok(Self {
            url: parsed.to_string(),
            is_secure: parsed.scheme() == "https",
            host,
        })
    }

    /// Returns the normalized URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Returns the host component.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns true if the URL uses HTTPS.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.is_secure
    }

    /// Resolves a possibly-relative href against this URL.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()?
            .join(href)
            .ok()
            .map(|u| u.to_string())
    }
}

impl AsRef<str> for ProductUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ProductUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// URL validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("URL cannot be empty")]
    Empty,
    #[error("URL format is invalid")]
    InvalidFormat,
    #[error("URL scheme '{scheme}' is not supported, expected http or https")]
    UnsupportedScheme { scheme: String },
    #[error("URL must have a valid host")]
    NoHost,
}
