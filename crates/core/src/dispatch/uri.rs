//! Base URL normalization and request URI assembly

use digirest_domain::{DigirestError, Result};

use super::body::encode_form_pairs;

/// Trim the URL and make it end with exactly one `/`.
///
/// # Errors
/// Returns `Config` when the URL is empty
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(DigirestError::config("Please set the base url to access the API."));
    }
    Ok(format!("{trimmed}/"))
}

/// `base + resource`, with the query string appended when there is one.
///
/// `base` is expected to be normalized already; `resource` is appended
/// literally.
pub fn build_uri(base: &str, resource: &str, query: &[(String, String)]) -> String {
    let mut uri = String::with_capacity(base.len() + resource.len());
    uri.push_str(base);
    uri.push_str(resource);
    if !query.is_empty() {
        uri.push(if resource.contains('?') { '&' } else { '?' });
        uri.push_str(&encode_form_pairs(query));
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_normalized_to_one() {
        assert_eq!(normalize_base_url("https://x/api").unwrap(), "https://x/api/");
        assert_eq!(normalize_base_url("https://x/api/").unwrap(), "https://x/api/");
        assert_eq!(normalize_base_url("https://x/api///").unwrap(), "https://x/api/");
    }

    #[test]
    fn test_empty_base_url_is_config_error() {
        for url in ["", "   ", "/"] {
            let err = normalize_base_url(url).unwrap_err();
            assert!(matches!(err, DigirestError::Config(_)), "{url:?}");
        }
    }

    #[test]
    fn test_build_uri_without_query() {
        assert_eq!(build_uri("https://x/api/", "contacts", &[]), "https://x/api/contacts");
    }

    #[test]
    fn test_build_uri_encodes_query() {
        let query = vec![
            ("foo".to_string(), "bar".to_string()),
            ("q".to_string(), "a b&c".to_string()),
        ];

        assert_eq!(
            build_uri("https://x/api/", "contacts", &query),
            "https://x/api/contacts?foo=bar&q=a+b%26c"
        );
    }

    #[test]
    fn test_build_uri_extends_existing_query() {
        let query = vec![("page".to_string(), "2".to_string())];

        assert_eq!(
            build_uri("https://x/", "contacts?limit=5", &query),
            "https://x/contacts?limit=5&page=2"
        );
    }
}
