/* src/normalizer.rs */

use std::net::IpAddr;

use tracing::warn;

use crate::validator::{is_valid_ip, parse_ip};

/// Produce the canonical text form of a validated IP address.
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) collapse to the embedded
/// IPv4 address. Everything else is re-rendered canonically, with IPv6 zero
/// runs compressed. Input that fails to parse comes back unchanged.
///
/// ```rust
/// use client_info::normalizer::normalize;
///
/// assert_eq!(normalize("::ffff:192.168.1.1"), "192.168.1.1");
/// assert_eq!(normalize("2001:0db8:0000:0000:0000:0000:0000:0001"), "2001:db8::1");
/// ```
pub fn normalize(ip: &str) -> String {
    let addr = match parse_ip(ip) {
        Ok(addr) => addr,
        Err(err) => {
            warn!(%err, "returning client ip unnormalized");
            return ip.to_string();
        }
    };

    match addr {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        addr => addr.to_string(),
    }
}

/// Validate and normalize a resolved IP, yielding `None` when there is none.
pub fn caller_ip(ip: Option<&str>) -> Option<String> {
    if !is_valid_ip(ip) {
        return None;
    }
    ip.map(normalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_ipv4_mapped() {
        assert_eq!(normalize("::ffff:192.168.1.1"), "192.168.1.1");
        assert_eq!(normalize("::FFFF:c0a8:0101"), "192.168.1.1");
    }

    #[test]
    fn test_compresses_ipv6() {
        assert_eq!(normalize("2001:DB8:0:0:0:0:0:1"), "2001:db8::1");
        assert_eq!(normalize("0:0:0:0:0:0:0:1"), "::1");
    }

    #[test]
    fn test_ipv4_compatible_is_not_mapped() {
        assert_eq!(normalize("::1"), "::1");
        assert_eq!(normalize("::c0a8:101"), "::c0a8:101");
    }

    #[test]
    fn test_canonical_input_is_unchanged() {
        for ip in ["203.0.113.9", "10.0.0.1", "2001:db8::1", "fe80::1ff:fe23:4567:890a", "::"] {
            assert_eq!(normalize(ip), ip);
            assert_eq!(normalize(&normalize(ip)), ip);
        }
    }

    #[test]
    fn test_unparseable_input_is_returned_as_is() {
        assert_eq!(normalize("unknown"), "unknown");
    }

    #[test]
    fn test_caller_ip() {
        assert_eq!(caller_ip(Some("::ffff:10.1.2.3")).as_deref(), Some("10.1.2.3"));
        assert_eq!(caller_ip(Some("nope")), None);
        assert_eq!(caller_ip(None), None);
    }
}
