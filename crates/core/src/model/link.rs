use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LinkError {
    #[error("link cannot be empty")]
    Empty,

    #[error("not a valid URL: {0}")]
    Invalid(#[from] url::ParseError),

    #[error("only http and https links are supported, got {scheme:?}")]
    UnsupportedScheme { scheme: String },
}

/// Normalize a user-entered link before it is appended to a topic.
///
/// The stored value is the trimmed input, not the re-serialized URL, so the
/// user sees exactly what they pasted.
///
/// # Errors
///
/// Returns `LinkError` if the input is blank, unparsable, or not http(s).
pub fn validate_link(raw: &str) -> Result<String, LinkError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LinkError::Empty);
    }
    let url = Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(LinkError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_links_and_trims() {
        assert_eq!(
            validate_link("  https://youtu.be/abc  ").unwrap(),
            "https://youtu.be/abc"
        );
        assert!(validate_link("http://example.com/a?b=c").is_ok());
    }

    #[test]
    fn rejects_blank_relative_and_non_http() {
        assert_eq!(validate_link("   ").unwrap_err(), LinkError::Empty);
        assert!(matches!(
            validate_link("www.example.com"),
            Err(LinkError::Invalid(_))
        ));
        assert!(matches!(
            validate_link("ftp://example.com/file"),
            Err(LinkError::UnsupportedScheme { scheme }) if scheme == "ftp"
        ));
    }
}
