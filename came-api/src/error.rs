use domo_client::DomoError;
use thiserror::Error;

/// High-level errors for CAME Domotic operations
///
/// Every public entry point of this crate either returns a usable value or
/// one of these three kinds. Transport-layer errors never leak in their
/// native form: they are wrapped here, with the triggering cause embedded in
/// the message.
#[derive(Debug, Error)]
pub enum CameError {
    /// The configured host does not answer or does not expose the API
    ///
    /// Raised synchronously while a session or API instance is being
    /// created, when the endpoint probe fails. A configuration problem,
    /// not a transient I/O error.
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// Could not establish or keep a session
    ///
    /// Covers bad credentials, rejected logins (any non-zero ack during
    /// login), malformed login responses, login network failures, and the
    /// session-layer ack codes 1 and 3.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The gateway or the network failed outside of authentication
    ///
    /// Covers timeouts, network errors, non-2xx statuses, undecodable
    /// responses, and all non-authentication ack codes.
    #[error("Server error: {0}")]
    Server(String),
}

/// Type alias for results that can return a CameError
pub type Result<T> = std::result::Result<T, CameError>;

/// Convert a transport failure into the generic server-error kind
///
/// The login path deliberately bypasses this conversion so it can map the
/// same failures to `CameError::Auth` instead.
impl From<DomoError> for CameError {
    fn from(error: DomoError) -> Self {
        CameError::Server(error.to_string())
    }
}
