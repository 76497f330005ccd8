/* src/error.rs */

use thiserror::Error;

/// Result type alias for operations that may fail with `ClientInfoError`.
pub type Result<T> = std::result::Result<T, ClientInfoError>;

/// Errors raised by the explicit parsing APIs.
///
/// Resolution and the middleware never return these; an unusable candidate
/// is skipped and a missing IP is reported as `None`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientInfoError {
    /// Invalid IP address format.
    #[error("Invalid IP address format: {0}")]
    InvalidIpFormat(String),

    /// No valid IP address was resolved for the request.
    #[error("No valid IP address found")]
    NoValidIp,
}
