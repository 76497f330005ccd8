/* src/agent.rs */

//! User agent classification.
//!
//! The crate does not match user agent strings itself. A
//! [`UserAgentClassifier`] turns the raw header into a [`Classification`]
//! and [`AgentInfo`] is the browser/device/OS summary built from it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Marker used for any name the classifier could not determine.
pub const UNKNOWN: &str = woothee::woothee::VALUE_UNKNOWN;

/// One classified family with its version parts.
///
/// Unknown version parts are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UaFamily {
    pub family: String,
    pub major: String,
    pub minor: String,
    pub patch: String,
}

impl UaFamily {
    /// A family with the given name and a version split from `version`.
    pub fn new(family: impl Into<String>, version: &str) -> Self {
        let [major, minor, patch] = split_version(version);
        Self {
            family: family.into(),
            major,
            minor,
            patch,
        }
    }

    /// A family with no name and no version.
    pub fn unknown() -> Self {
        Self {
            family: UNKNOWN.to_string(),
            ..Self::default()
        }
    }

    /// The version as a dotted `major.minor.patch` triple.
    pub fn version(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// What a classifier reports for one user agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The browser or client application.
    pub agent: UaFamily,
    /// The hardware class the client runs on.
    pub device: UaFamily,
    /// The operating system.
    pub os: UaFamily,
}

impl Classification {
    /// The classification of a missing or unrecognised user agent.
    pub fn unknown() -> Self {
        Self {
            agent: UaFamily::unknown(),
            device: UaFamily::unknown(),
            os: UaFamily::unknown(),
        }
    }
}

/// Classifies raw `User-Agent` values.
///
/// Implementations are constructed once and shared read-only by every
/// request, so they must be `Send + Sync`. An absent header is not an error:
/// it classifies as [`Classification::unknown`].
pub trait UserAgentClassifier: Send + Sync {
    fn classify(&self, user_agent: Option<&str>) -> Classification;
}

/// [`UserAgentClassifier`] backed by the woothee rule set.
#[derive(Clone)]
pub struct WootheeClassifier {
    parser: Arc<woothee::parser::Parser>,
}

impl fmt::Debug for WootheeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WootheeClassifier").finish_non_exhaustive()
    }
}

impl WootheeClassifier {
    /// Creates a new classifier, loading the woothee dataset.
    pub fn new() -> Self {
        Self {
            parser: Arc::new(woothee::parser::Parser::new()),
        }
    }
}

impl Default for WootheeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentClassifier for WootheeClassifier {
    fn classify(&self, user_agent: Option<&str>) -> Classification {
        let Some(user_agent) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
            return Classification::unknown();
        };

        let Some(result) = self.parser.parse(user_agent) else {
            return Classification::unknown();
        };

        Classification {
            agent: UaFamily::new(known_or_unknown(result.name), clean_version(result.version)),
            device: UaFamily::new(device_name(result.category), ""),
            os: UaFamily::new(known_or_unknown(result.os), clean_version(&result.os_version)),
        }
    }
}

fn known_or_unknown(name: &str) -> &str {
    let name = name.trim();
    if name.is_empty() { UNKNOWN } else { name }
}

fn clean_version(version: &str) -> &str {
    if version == UNKNOWN { "" } else { version }
}

/// Map a woothee category to a readable device name.
fn device_name(category: &str) -> &str {
    match category {
        "pc" => "Desktop",
        "smartphone" => "Smartphone",
        "mobilephone" => "Mobile Phone",
        "appliance" => "Appliance",
        "crawler" => "Crawler",
        "misc" => "Misc",
        _ => UNKNOWN,
    }
}

/// Split `"NT 10.0"`, `"10_15_7"` or `"120.0.6099.71"` into at most three parts.
fn split_version(version: &str) -> [String; 3] {
    let numeric = version
        .find(|c: char| c.is_ascii_digit())
        .map_or("", |start| version[start..].trim());

    let mut parts = numeric.split(['.', '_']).map(str::to_string);

    [
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
    ]
}

/// A named component of the client with its dotted version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub version: String,
}

impl From<&UaFamily> for Component {
    fn from(family: &UaFamily) -> Self {
        Self {
            name: family.family.clone(),
            version: family.version(),
        }
    }
}

/// Browser, device and operating system of the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub browser: Component,
    pub device: Component,
    pub os: Component,
}

impl AgentInfo {
    /// Summarise a classifier result as browser, device and OS components.
    pub fn from_classification(classification: &Classification) -> Self {
        Self {
            browser: Component::from(&classification.agent),
            device: Component::from(&classification.device),
            os: Component::from(&classification.os),
        }
    }

    /// Agent info for a request without a usable user agent.
    pub fn unknown() -> Self {
        Self::from_classification(&Classification::unknown())
    }
}

impl From<Classification> for AgentInfo {
    fn from(classification: Classification) -> Self {
        Self::from_classification(&classification)
    }
}
