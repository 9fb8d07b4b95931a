//! Validation and canonical form of link targets.

use url::Url;

/// Longest accepted target URL, in bytes, after normalization.
pub const MAX_LONG_LINK_LENGTH: usize = 2048;

/// Reasons a target URL is rejected.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("URL is empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("Only HTTP and HTTPS protocols are allowed, got `{0}`")]
    UnsupportedProtocol(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("URL is {0} bytes long, the limit is {limit}", limit = MAX_LONG_LINK_LENGTH)]
    TooLong(usize),
}

/// Normalizes a link target before it is stored.
///
/// Surrounding whitespace and the fragment are dropped. Parsing lowercases
/// the host and removes default ports. Only `http` and `https` URLs with a
/// host are accepted; `javascript:`, `data:` and friends are rejected.
///
/// # Errors
///
/// See [`UrlNormalizationError`].
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }

    let mut url = Url::parse(input)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol(
            url.scheme().to_string(),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlNormalizationError::MissingHost);
    }

    url.set_fragment(None);

    let normalized = String::from(url);
    if normalized.len() > MAX_LONG_LINK_LENGTH {
        return Err(UrlNormalizationError::TooLong(normalized.len()));
    }

    Ok(normalized)
}
