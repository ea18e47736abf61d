//! URL validation before a fetch is attempted
//!
//! Cheap, local checks applied ahead of the network hop: scheme, length,
//! path/query shape, and file extension. None of this touches robots.txt
//! or domain classification — those gates run separately.

use url::Url;

const MAX_URL_LENGTH: usize = 2000;
const MAX_PATH_SEGMENTS: usize = 20;
const MAX_QUERY_PARAMS: usize = 50;

const BLOCKED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".tar", ".gz",
    ".7z", ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp", ".mp3", ".mp4", ".avi",
    ".mov", ".wmv", ".flv", ".exe", ".msi", ".dmg", ".deb", ".rpm",
];

/// Why a URL failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Scheme is not http or https
    UnsupportedScheme,
    /// URL exceeds the maximum length
    TooLong,
    /// Path has more than the allowed number of segments
    TooManySegments,
    /// Query string has more than the allowed number of parameters
    TooManyQueryParams,
    /// Path ends in a blocked file extension
    BlockedExtension,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::UnsupportedScheme => "unsupported scheme (expected http or https)",
            Self::TooLong => "URL exceeds maximum length",
            Self::TooManySegments => "too many path segments",
            Self::TooManyQueryParams => "too many query parameters",
            Self::BlockedExtension => "blocked file extension",
        };
        write!(f, "{}", msg)
    }
}

/// Validates a URL is eligible to be fetched
///
/// Checks scheme, overall length, path segment count, query parameter
/// count, and file extension against a fixed blocklist. Does not resolve
/// DNS or make any network call.
pub fn validate_url(url: &Url) -> Result<(), ValidationError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::UnsupportedScheme);
    }

    if url.as_str().len() > MAX_URL_LENGTH {
        return Err(ValidationError::TooLong);
    }

    let segment_count = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).count())
        .unwrap_or(0);
    if segment_count > MAX_PATH_SEGMENTS {
        return Err(ValidationError::TooManySegments);
    }

    if let Some(query) = url.query() {
        let param_count = query.split('&').filter(|p| !p.is_empty()).count();
        if param_count > MAX_QUERY_PARAMS {
            return Err(ValidationError::TooManyQueryParams);
        }
    }

    if has_blocked_extension(url.path()) {
        return Err(ValidationError::BlockedExtension);
    }

    Ok(())
}

fn has_blocked_extension(path: &str) -> bool {
    let path_lower = path.to_lowercase();
    BLOCKED_EXTENSIONS
        .iter()
        .any(|ext| path_lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_valid_url_passes() {
        assert!(validate_url(&parse("https://example.com/page")).is_ok());
    }

    #[test]
    fn test_ftp_scheme_rejected() {
        assert_eq!(
            validate_url(&parse("ftp://example.com/file")),
            Err(ValidationError::UnsupportedScheme)
        );
    }

    #[test]
    fn test_too_long_url_rejected() {
        let long_path = "a".repeat(2100);
        let url = parse(&format!("https://example.com/{}", long_path));
        assert_eq!(validate_url(&url), Err(ValidationError::TooLong));
    }

    #[test]
    fn test_too_many_path_segments_rejected() {
        let path = (0..25).map(|_| "x").collect::<Vec<_>>().join("/");
        let url = parse(&format!("https://example.com/{}", path));
        assert_eq!(
            validate_url(&url),
            Err(ValidationError::TooManySegments)
        );
    }

    #[test]
    fn test_too_many_query_params_rejected() {
        let query = (0..60)
            .map(|i| format!("p{}=1", i))
            .collect::<Vec<_>>()
            .join("&");
        let url = parse(&format!("https://example.com/page?{}", query));
        assert_eq!(
            validate_url(&url),
            Err(ValidationError::TooManyQueryParams)
        );
    }

    #[test]
    fn test_blocked_extension_rejected() {
        assert_eq!(
            validate_url(&parse("https://example.com/file.pdf")),
            Err(ValidationError::BlockedExtension)
        );
        assert_eq!(
            validate_url(&parse("https://example.com/image.JPG")),
            Err(ValidationError::BlockedExtension)
        );
    }

    #[test]
    fn test_allowed_extension_passes() {
        assert!(validate_url(&parse("https://example.com/page.html")).is_ok());
    }

    #[test]
    fn test_within_limits_passes() {
        let path = (0..20).map(|_| "x").collect::<Vec<_>>().join("/");
        let query = (0..50)
            .map(|i| format!("p{}=1", i))
            .collect::<Vec<_>>()
            .join("&");
        let url = parse(&format!("https://example.com/{}?{}", path, query));
        assert!(validate_url(&url).is_ok());
    }
}
