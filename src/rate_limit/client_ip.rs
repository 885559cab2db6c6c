use std::net::{IpAddr, SocketAddr};

/// Identity used when neither a forwarded address nor a peer is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Picks the rate limiting identity for a request.
///
/// The first `X-Forwarded-For` entry wins if it parses as an IP address.
/// Anything else in that header is ignored and the transport peer is used.
pub fn extract_client_ip(forwarded_for: Option<&str>, peer: Option<SocketAddr>) -> String {
    let forwarded = forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .and_then(|first| first.parse::<IpAddr>().ok());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => UNKNOWN_CLIENT.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.7:51234".parse().unwrap())
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        assert_eq!(
            extract_client_ip(Some("203.0.113.9, 10.0.0.1"), peer()),
            "203.0.113.9"
        );
    }

    #[test]
    fn test_forwarded_for_ipv6() {
        assert_eq!(extract_client_ip(Some("2001:db8::1"), None), "2001:db8::1");
    }

    #[test]
    fn test_invalid_forwarded_for_falls_back_to_peer() {
        assert_eq!(extract_client_ip(Some("not-an-ip"), peer()), "10.0.0.7");
        assert_eq!(extract_client_ip(Some(""), peer()), "10.0.0.7");
    }

    #[test]
    fn test_no_source_is_unknown() {
        assert_eq!(extract_client_ip(None, None), UNKNOWN_CLIENT);
        assert_eq!(extract_client_ip(Some("garbage"), None), UNKNOWN_CLIENT);
    }
}
