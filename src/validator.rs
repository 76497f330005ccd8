/* src/validator.rs */

use std::net::IpAddr;

use crate::error::{ClientInfoError, Result};

/// Check whether `value` is a syntactically valid IPv4 or IPv6 address.
///
/// Absent input is simply not an address, so it yields `false`.
///
/// ```rust
/// use client_info::validator::is_valid_ip;
///
/// assert!(is_valid_ip(Some("203.0.113.7")));
/// assert!(is_valid_ip(Some("2001:db8::1")));
/// assert!(!is_valid_ip(Some("unknown")));
/// assert!(!is_valid_ip(None));
/// ```
pub fn is_valid_ip(value: Option<&str>) -> bool {
    value.is_some_and(|s| s.parse::<IpAddr>().is_ok())
}

/// Parse `value` into an [`IpAddr`].
pub fn parse_ip(value: &str) -> Result<IpAddr> {
    value
        .parse::<IpAddr>()
        .map_err(|_| ClientInfoError::InvalidIpFormat(value.to_string()))
}

/// Check whether `value` is a valid IPv6 address.
pub fn is_ipv6(value: &str) -> bool {
    matches!(value.parse::<IpAddr>(), Ok(IpAddr::V6(_)))
}

/// Drop a `%zone` scope suffix from an IPv6 address.
///
/// Sockets report link-local peers as `fe80::1%eth0`. The suffix is only
/// removed when what precedes it is an IPv6 address; other input is returned
/// unchanged.
pub fn strip_zone(value: &str) -> &str {
    match value.split_once('%') {
        Some((addr, zone)) if !zone.is_empty() && is_ipv6(addr) => addr,
        _ => value,
    }
}
