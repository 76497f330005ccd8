/* src/enricher.rs */

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::{AgentInfo, UserAgentClassifier, WootheeClassifier};
use crate::error::{ClientInfoError, Result};
use crate::extractor::{ConnectionInfo, HeaderMap, IpExtractor, header_value};
use crate::normalizer::caller_ip;
use crate::validator::parse_ip;

/// What the enrichment step attaches to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub agent: AgentInfo,
    /// Normalized client IP, or `None` when no source held a valid address.
    pub ip: Option<String>,
}

impl ClientInfo {
    /// Parse the client IP into an address.
    pub fn ip_addr(&self) -> Result<IpAddr> {
        self.ip.as_deref().ok_or(ClientInfoError::NoValidIp).and_then(parse_ip)
    }
}

/// Builds [`ClientInfo`] for a request from its headers and connection.
///
/// Holds the IP extractor and the user agent classifier; both are read-only,
/// so one enricher serves any number of concurrent requests.
#[derive(Clone)]
pub struct Enricher {
    extractor: IpExtractor,
    classifier: Arc<dyn UserAgentClassifier>,
}

impl fmt::Debug for Enricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enricher")
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new(WootheeClassifier::new())
    }
}

impl Enricher {
    /// Create an enricher around the given classifier.
    pub fn new(classifier: impl UserAgentClassifier + 'static) -> Self {
        Self::with_shared_classifier(Arc::new(classifier))
    }

    /// Create an enricher around an already shared classifier.
    pub fn with_shared_classifier(classifier: Arc<dyn UserAgentClassifier>) -> Self {
        Self {
            extractor: IpExtractor::default(),
            classifier,
        }
    }

    /// Set the IP extractor.
    pub fn with_extractor(mut self, extractor: IpExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Resolve the client IP and classify the user agent for one request.
    ///
    /// ```rust
    /// use client_info::{ConnectionInfo, Enricher, HeaderMap};
    ///
    /// let enricher = Enricher::default();
    /// let connection = ConnectionInfo::new().with_remote_address("::ffff:10.0.0.5");
    ///
    /// let info = enricher.enrich(&HeaderMap::new(), Some(&connection));
    /// assert_eq!(info.ip.as_deref(), Some("10.0.0.5"));
    /// assert_eq!(info.agent.browser.name, "UNKNOWN");
    /// ```
    pub fn enrich(
        &self,
        headers: &HeaderMap,
        connection: Option<&ConnectionInfo>,
    ) -> ClientInfo {
        let resolved = self.extractor.resolve(headers, connection);
        let ip = caller_ip(resolved.map(|resolved| resolved.ip));

        let classification = self.classifier.classify(header_value(headers, "user-agent"));
        let agent = AgentInfo::from(classification);

        debug!(
            ip = ip.as_deref().unwrap_or("-"),
            browser = %agent.browser.name,
            os = %agent.os.name,
            "client info"
        );

        ClientInfo { agent, ip }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Classification, UNKNOWN, UaFamily};

    #[derive(Debug)]
    struct FixedClassifier;

    impl UserAgentClassifier for FixedClassifier {
        fn classify(&self, user_agent: Option<&str>) -> Classification {
            match user_agent {
                Some(_) => Classification {
                    agent: UaFamily::new("Fixture", "1.2.3"),
                    device: UaFamily::new("Desktop", ""),
                    os: UaFamily::new("Linux", "6.1"),
                },
                None => Classification::unknown(),
            }
        }
    }

    #[test]
    fn test_enrich_resolves_and_normalizes() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for".to_string(), "unknown, ::ffff:203.0.113.8".to_string());
        headers.insert("user-agent".to_string(), "fixture/1.2.3".to_string());

        let info = Enricher::new(FixedClassifier).enrich(&headers, None);
        assert_eq!(info.ip.as_deref(), Some("203.0.113.8"));
        assert_eq!(info.agent.browser.name, "Fixture");
        assert_eq!(info.agent.browser.version, "1.2.3");
        assert_eq!(info.agent.os.version, "6.1.");
    }

    #[test]
    fn test_enrich_without_any_ip() {
        let info = Enricher::new(FixedClassifier).enrich(&HeaderMap::new(), None);
        assert_eq!(info.ip, None);
        assert_eq!(info.agent, AgentInfo::unknown());
        assert_eq!(info.ip_addr(), Err(ClientInfoError::NoValidIp));

        let json = serde_json::to_value(&info).unwrap();
        assert!(json["ip"].is_null());
        assert_eq!(json["agent"]["browser"]["name"], UNKNOWN);
    }

    #[test]
    fn test_enrich_uses_configured_extractor() {
        use crate::extractor::IpSource;

        let mut headers = HeaderMap::new();
        headers.insert("x-client-ip".to_string(), "198.51.100.1".to_string());
        let connection = ConnectionInfo::new().with_remote_address("10.0.0.5");

        let enricher = Enricher::new(FixedClassifier)
            .with_extractor(IpExtractor::new().with_sources(vec![IpSource::ConnectionRemote]));
        let info = enricher.enrich(&headers, Some(&connection));
        assert_eq!(info.ip_addr(), Ok("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn test_default_enricher_classifies_real_agents() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "User-Agent".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
        );

        let info = Enricher::default().enrich(&headers, None);
        assert_eq!(info.agent.browser.name, "Firefox");
        assert_eq!(info.ip, None);
    }
}
