//! URL helper functions

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::SiteConfig;

lazy_static! {
    static ref UID_PATTERN: Regex = Regex::new(r"^[a-z0-9][a-z0-9_-]*$").unwrap();
}

/// Whether `uid` is safe to use as a route and as a directory name
pub fn is_valid_uid(uid: &str) -> bool {
    UID_PATTERN.is_match(uid)
}

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello") // -> "/blog/post/hello"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Route of a post page
pub fn post_url(config: &SiteConfig, uid: &str) -> String {
    url_for(config, &format!("post/{}", encode_segment(uid)))
}

/// Percent-encode a single path segment
pub fn encode_segment(segment: &str) -> String {
    const SEGMENT: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
        .remove(b'-')
        .remove(b'_')
        .remove(b'.')
        .remove(b'~');
    percent_encoding::utf8_percent_encode(segment, SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig {
            url: "https://example.com".to_string(),
            root: "/blog/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/css/style.css"), "/blog/css/style.css");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/post/hello"),
            "https://example.com/blog/post/hello"
        );
    }

    #[test]
    fn test_is_valid_uid() {
        assert!(is_valid_uid("como-utilizar-hooks"));
        assert!(is_valid_uid("post_2"));
        assert!(!is_valid_uid(""));
        assert!(!is_valid_uid("-leading"));
        assert!(!is_valid_uid("../etc"));
        assert!(!is_valid_uid("Upper"));
        assert!(!is_valid_uid("a/b"));
    }

    #[test]
    fn test_post_url() {
        let config = SiteConfig::default();
        assert_eq!(post_url(&config, "como-utilizar-hooks"), "/post/como-utilizar-hooks");
        assert_eq!(post_url(&config, "a b"), "/post/a%20b");
    }
}
