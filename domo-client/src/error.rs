//! Error types for the domo HTTP client

use thiserror::Error;

/// Errors that can occur while talking to the gateway endpoint
#[derive(Debug, Error)]
pub enum DomoError {
    /// Network-level communication error
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the allotted timeout
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// The gateway answered with a non-2xx HTTP status
    #[error("HTTP {0} error from gateway")]
    Status(u16),

    /// The response body of a 2xx answer was not valid JSON
    #[error("Error decoding the response to JSON: {0}")]
    Decode(String),
}
