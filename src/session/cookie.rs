//! Session cookie helpers.
//!
//! The cookie carries the raw session token. Tokens have 256 bits of entropy
//! and are only meaningful to the in-process store, so no signature is added.

use super::SessionConfig;

/// Builds a `Set-Cookie` value carrying `token`.
pub fn build_session_cookie(config: &SessionConfig, token: &str) -> String {
    let max_age = config.session_lifetime.num_seconds().max(0);
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}",
        config.cookie_name, token, config.cookie_path, max_age
    );
    push_attributes(&mut cookie, config);
    cookie
}

/// Builds a `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}=; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        config.cookie_name, config.cookie_path
    );
    push_attributes(&mut cookie, config);
    cookie
}

fn push_attributes(cookie: &mut String, config: &SessionConfig) {
    if let Some(domain) = &config.cookie_domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    if config.cookie_http_only {
        cookie.push_str("; HttpOnly");
    }
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie.push_str("; SameSite=");
    cookie.push_str(config.cookie_same_site.as_str());
}

/// Extracts the value of cookie `name` from a `Cookie` request header.
///
/// Returns `None` when the cookie is absent or empty.
pub fn token_from_cookie_header<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::session::SameSite;

    #[test]
    fn test_build_session_cookie_defaults() {
        let config = SessionConfig::default();
        let cookie = build_session_cookie(&config, "deadbeef");

        assert_eq!(
            cookie,
            "session_token=deadbeef; Path=/; Max-Age=604800; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn test_build_session_cookie_secure_with_domain() {
        let config = SessionConfig {
            cookie_secure: true,
            cookie_domain: Some("chores.example".to_owned()),
            cookie_same_site: SameSite::Lax,
            session_lifetime: Duration::hours(1),
            ..Default::default()
        };
        let cookie = build_session_cookie(&config, "t");

        assert!(cookie.starts_with("session_token=t; Path=/; Max-Age=3600"));
        assert!(cookie.contains("; Domain=chores.example"));
        assert!(cookie.contains("; Secure"));
        assert!(cookie.ends_with("; SameSite=Lax"));
    }

    #[test]
    fn test_clear_session_cookie() {
        let cookie = clear_session_cookie(&SessionConfig::default());
        assert!(cookie.starts_with("session_token=; Path=/; Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_token_from_cookie_header() {
        let header = "theme=dark; session_token=abc123; lang=en";
        assert_eq!(
            token_from_cookie_header(header, "session_token"),
            Some("abc123")
        );
        assert_eq!(token_from_cookie_header(header, "missing"), None);
        assert_eq!(token_from_cookie_header("session_token=", "session_token"), None);
        assert_eq!(token_from_cookie_header("", "session_token"), None);
    }

    #[test]
    fn test_token_from_cookie_header_exact_name() {
        let header = "xsession_token=nope; session_token=yes";
        assert_eq!(
            token_from_cookie_header(header, "session_token"),
            Some("yes")
        );
    }
}
