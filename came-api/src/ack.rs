//! Acknowledgement-code classification
//!
//! Every gateway response carries an `sl_data_ack_reason` integer: 0 is
//! success, 1 and 3 are authentication failures, 4 through 11 are session- or
//! application-layer errors with fixed meanings. The message table must match
//! the gateway documentation byte-for-byte.

use crate::error::CameError;

/// Ack codes that indicate an authentication problem
const AUTH_ERROR_CODES: [i64; 2] = [1, 3];

/// Human-readable message for a non-zero ack code
pub fn ack_error_message(ack_code: i64) -> String {
    match ack_code {
        1 => "Invalid user.".to_string(),
        3 => "Too many sessions during login.".to_string(),
        4 => "Error occurred in JSON Syntax.".to_string(),
        5 => "No session layer command tag.".to_string(),
        6 => "Unrecognized session layer command.".to_string(),
        7 => "No client ID in request.".to_string(),
        8 => "Wrong client ID in request.".to_string(),
        9 => "Wrong application command.".to_string(),
        10 => "No reply to application command, maybe service down.".to_string(),
        11 => "Wrong application data.".to_string(),
        other => format!("Unknown error code: {other}"),
    }
}

/// Whether a non-zero ack code is authentication-related
pub fn is_auth_error(ack_code: i64) -> bool {
    AUTH_ERROR_CODES.contains(&ack_code)
}

/// Classify a non-zero ack code into the matching error kind
pub fn ack_error(ack_code: i64) -> CameError {
    let message = format!("ACK error {}: {}", ack_code, ack_error_message(ack_code));
    if is_auth_error(ack_code) {
        CameError::Auth(message)
    } else {
        CameError::Server(message)
    }
}
