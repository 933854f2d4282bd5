//! URL utilities for consistent URL handling
//!
//! This module provides utilities for normalizing base URLs and for escaping
//! user-supplied values (emails, event titles) that are embedded in endpoint
//! paths.

/// Normalize a base URL by removing trailing slashes
///
/// This ensures consistent URL construction when appending endpoints,
/// preventing double slashes in the final URLs.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use eventline::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000/api", "events"),
///     "http://localhost:8000/api/events"
/// );
/// assert_eq!(
///     construct_api_url("http://localhost:8000/api/", "/events"),
///     "http://localhost:8000/api/events"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode a value for use as a single path segment (or query value).
///
/// Everything outside the RFC 3986 unreserved set is escaped, matching what
/// `encodeURIComponent` does for the characters that matter here (spaces,
/// slashes, `@` in emails, `&`/`?` in free text).
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for &byte in segment.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
                out.push(HEX_DIGITS[(byte & 0x0f) as usize] as char);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/api"),
            "http://localhost:8000/api"
        );
        assert_eq!(
            normalize_base_url("http://localhost:8000/api/"),
            "http://localhost:8000/api"
        );
        assert_eq!(
            normalize_base_url("http://localhost:8000/api///"),
            "http://localhost:8000/api"
        );
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("http://localhost:8000/api", "events"),
            "http://localhost:8000/api/events"
        );
        assert_eq!(
            construct_api_url("http://localhost:8000/api/", "/events"),
            "http://localhost:8000/api/events"
        );
        assert_eq!(
            construct_api_url("http://localhost:8000/api///", "auth/login"),
            "http://localhost:8000/api/auth/login"
        );
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("plain"), "plain");
        assert_eq!(encode_path_segment("ada@example.com"), "ada%40example.com");
        assert_eq!(encode_path_segment("Demo Day"), "Demo%20Day");
        assert_eq!(encode_path_segment("a/b?c&d"), "a%2Fb%3Fc%26d");
        assert_eq!(encode_path_segment("café"), "caf%C3%A9");
    }
}
