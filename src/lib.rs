/* src/lib.rs */
//! # Client Info
//!
//! Request enrichment for HTTP services: resolves the originating client IP
//! address across the usual proxy and load-balancer headers, falls back to
//! connection-level addresses, and classifies the client's user agent into
//! browser, device and operating system.
//!
//! ## Features
//!
//! - Ordered IP resolution over `X-Client-IP`, `X-Forwarded-For`,
//!   `CF-Connecting-IP`, `True-Client-IP`, `X-Real-IP`, `X-Cluster-Client-IP`,
//!   `X-Forwarded`, `Forwarded-For` and `Forwarded`, then connection addresses
//! - Every candidate is validated as an IPv4 or IPv6 address before use
//! - IPv4-mapped IPv6 addresses normalized to plain IPv4
//! - User agent classification through a pluggable classifier (woothee by default)
//! - Optional Axum middleware and extractor integration via the `axum` feature
//!
//! ## Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use client_info::{ConnectionInfo, Enricher, HeaderMap};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("x-forwarded-for".to_string(), "unknown, 203.0.113.7:8080".to_string());
//! headers.insert(
//!     "user-agent".to_string(),
//!     "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
//! );
//!
//! let connection = ConnectionInfo::new().with_remote_address("10.0.0.5");
//! let info = Enricher::default().enrich(&headers, Some(&connection));
//!
//! assert_eq!(info.ip.as_deref(), Some("203.0.113.7"));
//! assert_eq!(info.agent.browser.name, "Firefox");
//! ```

pub mod agent;
pub mod enricher;
pub mod error;
pub mod extractor;
pub mod forwarded;
pub mod normalizer;
pub mod validator;

#[cfg(feature = "axum")]
pub mod middleware;

pub use agent::{
    AgentInfo, Classification, Component, UaFamily, UserAgentClassifier, WootheeClassifier,
};
pub use enricher::{ClientInfo, Enricher};
pub use error::{ClientInfoError, Result};
pub use extractor::{
    ConnectionInfo, HeaderMap, IpExtractor, IpSource, ResolvedIp, resolve_client_ip,
};
pub use normalizer::normalize;

#[cfg(feature = "axum")]
pub use middleware::{ClientInfoLayer, ClientInfoService};

/// Re-export commonly used types
pub use std::net::IpAddr;
