/* src/forwarded.rs */

//! Splitting of `X-Forwarded-For` chains.
//!
//! The header lists hops left to right, `client, proxy1, proxy2`, so the
//! leftmost entry is the originating client and the rightmost is the proxy
//! nearest to us. Some platforms (Azure App Service for one) append a port to
//! IPv4 entries, which is stripped here.

use crate::validator::is_valid_ip;

/// Split a raw `X-Forwarded-For` value into its entries, in header order.
///
/// Each entry is trimmed. An entry containing exactly one `:` is taken to be
/// `ipv4:port` and only the part before the colon is kept; anything else,
/// including IPv6 literals, passes through unchanged. A bare IPv6 literal
/// with a single colon cannot be told apart from `host:port` and gets cut.
///
/// ```rust
/// use client_info::forwarded::split_forwarded_for;
///
/// assert_eq!(
///     split_forwarded_for(Some("1.2.3.4:8080, 5.6.7.8")),
///     vec!["1.2.3.4", "5.6.7.8"]
/// );
/// assert!(split_forwarded_for(None).is_empty());
/// ```
pub fn split_forwarded_for(value: Option<&str>) -> Vec<&str> {
    let Some(value) = value else {
        return Vec::new();
    };

    value
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            match entry.split_once(':') {
                Some((addr, port)) if !port.contains(':') => addr,
                _ => entry,
            }
        })
        .collect()
}

/// Return the leftmost entry of an `X-Forwarded-For` value that is a valid IP.
///
/// Proxies such as Squid write `unknown` in place of an address; those entries
/// and any other invalid ones are skipped rather than ending the search.
pub fn first_valid_forwarded(value: Option<&str>) -> Option<&str> {
    split_forwarded_for(value)
        .into_iter()
        .find(|entry| is_valid_ip(Some(entry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_ipv4_port() {
        assert_eq!(
            split_forwarded_for(Some("1.2.3.4:8080, 5.6.7.8")),
            vec!["1.2.3.4", "5.6.7.8"]
        );
    }

    #[test]
    fn test_keeps_ipv6_entries() {
        assert_eq!(
            split_forwarded_for(Some("2001:db8::1,  ::ffff:10.0.0.1 ")),
            vec!["2001:db8::1", "::ffff:10.0.0.1"]
        );
    }

    #[test]
    fn test_preserves_order_and_invalid_entries() {
        assert_eq!(
            split_forwarded_for(Some("unknown, 203.0.113.9 ,10.0.0.1")),
            vec!["unknown", "203.0.113.9", "10.0.0.1"]
        );
        assert_eq!(split_forwarded_for(Some("")), vec![""]);
    }

    #[test]
    fn test_single_colon_ipv6_is_cut() {
        // Known limitation of the port heuristic.
        assert_eq!(split_forwarded_for(Some("fe80:1")), vec!["fe80"]);
    }

    #[test]
    fn test_first_valid_skips_unknown() {
        assert_eq!(
            first_valid_forwarded(Some("unknown, garbage, 198.51.100.4:443, 10.0.0.1")),
            Some("198.51.100.4")
        );
        assert_eq!(first_valid_forwarded(Some("unknown, nope")), None);
        assert_eq!(first_valid_forwarded(None), None);
    }
}
