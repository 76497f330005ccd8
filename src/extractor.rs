/* src/extractor.rs */

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use tracing::{debug, trace};

use crate::forwarded::first_valid_forwarded;
use crate::validator::{is_valid_ip, strip_zone};

/// Type alias for header maps, keyed by lower-cased header name.
pub type HeaderMap = HashMap<String, String>;

/// A place a client IP can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpSource {
    /// `X-Client-IP`, set by Amazon EC2, Heroku and others.
    XClientIp,
    /// `X-Forwarded-For`, the proxy chain written by load balancers.
    XForwardedFor,
    /// `CF-Connecting-IP` (Cloudflare).
    CfConnectingIp,
    /// `True-Client-IP` (Akamai and Cloudflare).
    TrueClientIp,
    /// `X-Real-IP` (nginx).
    XRealIp,
    /// `X-Cluster-Client-IP` (Rackspace LB, Riverbed Stingray).
    XClusterClientIp,
    /// `X-Forwarded`.
    XForwarded,
    /// `Forwarded-For`.
    ForwardedFor,
    /// `Forwarded`, compared as a whole value.
    Forwarded,
    /// Remote address of the connection.
    ConnectionRemote,
    /// Remote address of the socket underlying the connection.
    ConnectionSocket,
    /// Remote address of the request's own socket.
    RequestSocket,
    /// Remote address reported by the server framework's info record.
    InfoRemote,
}

impl IpSource {
    /// Every source, most trusted first.
    pub const DEFAULT_PRIORITY: [IpSource; 13] = [
        IpSource::XClientIp,
        IpSource::XForwardedFor,
        IpSource::CfConnectingIp,
        IpSource::TrueClientIp,
        IpSource::XRealIp,
        IpSource::XClusterClientIp,
        IpSource::XForwarded,
        IpSource::ForwardedFor,
        IpSource::Forwarded,
        IpSource::ConnectionRemote,
        IpSource::ConnectionSocket,
        IpSource::RequestSocket,
        IpSource::InfoRemote,
    ];

    /// The lower-cased header this source reads, if it is a header.
    pub fn header_name(self) -> Option<&'static str> {
        match self {
            IpSource::XClientIp => Some("x-client-ip"),
            IpSource::XForwardedFor => Some("x-forwarded-for"),
            IpSource::CfConnectingIp => Some("cf-connecting-ip"),
            IpSource::TrueClientIp => Some("true-client-ip"),
            IpSource::XRealIp => Some("x-real-ip"),
            IpSource::XClusterClientIp => Some("x-cluster-client-ip"),
            IpSource::XForwarded => Some("x-forwarded"),
            IpSource::ForwardedFor => Some("forwarded-for"),
            IpSource::Forwarded => Some("forwarded"),
            IpSource::ConnectionRemote
            | IpSource::ConnectionSocket
            | IpSource::RequestSocket
            | IpSource::InfoRemote => None,
        }
    }

    /// Pick the candidate this source offers for the request.
    fn candidate<'a>(
        self,
        headers: &'a HeaderMap,
        connection: Option<&'a ConnectionInfo>,
    ) -> Option<&'a str> {
        match self {
            IpSource::XForwardedFor => {
                first_valid_forwarded(header_value(headers, "x-forwarded-for"))
            }
            IpSource::ConnectionRemote => connection_address(&connection?.remote_address),
            IpSource::ConnectionSocket => connection_address(&connection?.socket_remote_address),
            IpSource::RequestSocket => connection_address(&connection?.request_socket_address),
            IpSource::InfoRemote => connection_address(&connection?.info_remote_address),
            header_source => header_value(headers, header_source.header_name()?),
        }
    }
}

/// Socket addresses may carry an IPv6 zone, which is not part of the client IP.
fn connection_address(address: &Option<String>) -> Option<&str> {
    address.as_deref().map(strip_zone)
}

impl fmt::Display for IpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.header_name() {
            Some(name) => f.write_str(name),
            None => f.write_str(match self {
                IpSource::ConnectionRemote => "connection.remote_address",
                IpSource::ConnectionSocket => "connection.socket.remote_address",
                IpSource::RequestSocket => "socket.remote_address",
                _ => "info.remote_address",
            }),
        }
    }
}

/// Transport-level addresses used once every header has been ruled out.
///
/// Server stacks expose the peer address in different places; each one is a
/// separate fallback tier, tried in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Remote address of the connection.
    pub remote_address: Option<String>,
    /// Remote address of the socket underlying the connection.
    pub socket_remote_address: Option<String>,
    /// Remote address of the request's own socket.
    pub request_socket_address: Option<String>,
    /// Remote address from the framework's alternate info record.
    pub info_remote_address: Option<String>,
}

impl ConnectionInfo {
    /// Create connection info with no addresses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection remote address.
    pub fn with_remote_address(mut self, address: impl Into<String>) -> Self {
        self.remote_address = Some(address.into());
        self
    }

    /// Set the underlying socket's remote address.
    pub fn with_socket_remote_address(mut self, address: impl Into<String>) -> Self {
        self.socket_remote_address = Some(address.into());
        self
    }

    /// Set the request socket's remote address.
    pub fn with_request_socket_address(mut self, address: impl Into<String>) -> Self {
        self.request_socket_address = Some(address.into());
        self
    }

    /// Set the info record's remote address.
    pub fn with_info_remote_address(mut self, address: impl Into<String>) -> Self {
        self.info_remote_address = Some(address.into());
        self
    }
}

impl From<SocketAddr> for ConnectionInfo {
    fn from(addr: SocketAddr) -> Self {
        Self::new().with_remote_address(addr.ip().to_string())
    }
}

/// A client IP accepted by the extractor, still in its original spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIp<'a> {
    /// Where the address was found.
    pub source: IpSource,
    /// The address as it appeared in the request.
    pub ip: &'a str,
}

impl ResolvedIp<'_> {
    /// Get the address text.
    pub fn as_str(&self) -> &str {
        self.ip
    }
}

/// Client IP resolution over an ordered list of sources.
#[derive(Debug, Clone)]
pub struct IpExtractor {
    /// Sources to check, in order of preference.
    pub sources: Vec<IpSource>,
}

impl Default for IpExtractor {
    fn default() -> Self {
        Self {
            sources: IpSource::DEFAULT_PRIORITY.to_vec(),
        }
    }
}

impl IpExtractor {
    /// Create an extractor using the default priority.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sources to check, most trusted first.
    pub fn with_sources(mut self, sources: Vec<IpSource>) -> Self {
        self.sources = sources;
        self
    }

    /// Find the first source whose candidate is a valid IP address.
    pub fn resolve<'a>(
        &self,
        headers: &'a HeaderMap,
        connection: Option<&'a ConnectionInfo>,
    ) -> Option<ResolvedIp<'a>> {
        for &source in &self.sources {
            let Some(candidate) = source.candidate(headers, connection) else {
                continue;
            };

            if is_valid_ip(Some(candidate)) {
                debug!(%source, ip = candidate, "client ip resolved");
                return Some(ResolvedIp {
                    source,
                    ip: candidate,
                });
            }
            trace!(%source, candidate, "skipping invalid ip candidate");
        }

        debug!("no valid client ip in request");
        None
    }

    /// Resolve the client IP and return it as an owned string.
    pub fn extract(
        &self,
        headers: &HeaderMap,
        connection: Option<&ConnectionInfo>,
    ) -> Option<String> {
        self.resolve(headers, connection)
            .map(|resolved| resolved.ip.to_string())
    }
}

/// Look up a header case-insensitively.
pub fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    if let Some(value) = headers.get(name) {
        return Some(value.as_str());
    }

    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Resolve the client IP with the default source priority.
///
/// The returned value is exactly as found in the request; pass it through
/// [`normalize`](crate::normalizer::normalize) for a canonical form.
///
/// # Arguments
///
/// * `headers` - Map of HTTP headers (lower-cased keys recommended)
/// * `connection` - Transport addresses to fall back on
///
/// # Examples
///
/// ```rust
/// use client_info::{ConnectionInfo, HeaderMap, resolve_client_ip};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for".to_string(), "unknown, 203.0.113.1".to_string());
///
/// let connection = ConnectionInfo::new().with_remote_address("10.0.0.5");
/// let ip = resolve_client_ip(&headers, Some(&connection));
/// assert_eq!(ip.as_deref(), Some("203.0.113.1"));
/// ```
pub fn resolve_client_ip(
    headers: &HeaderMap,
    connection: Option<&ConnectionInfo>,
) -> Option<String> {
    IpExtractor::default().extract(headers, connection)
}
