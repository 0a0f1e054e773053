//! Request-envelope builders for the session-layer wire protocol
//!
//! Every request to the gateway is one of four fixed JSON shapes. Session
//! commands (`sl_registration_req`, `sl_keep_alive_req`, `sl_logout_req`)
//! are flat; application commands wrap an inner `sl_appl_msg` object inside
//! the `sl_data_req` envelope.

use serde_json::{json, Value};

/// Login envelope carrying plaintext credentials
pub(crate) fn registration_req(username: &str, password: &str) -> Value {
    json!({
        "sl_cmd": "sl_registration_req",
        "sl_login": username,
        "sl_pwd": password,
    })
}

/// Session keep-alive envelope
pub(crate) fn keep_alive_req(client_id: &str) -> Value {
    json!({
        "sl_client_id": client_id,
        "sl_cmd": "sl_keep_alive_req",
    })
}

/// Session logout envelope
pub(crate) fn logout_req(client_id: &str) -> Value {
    json!({
        "sl_client_id": client_id,
        "sl_cmd": "sl_logout_req",
    })
}

/// Wrap an application message in the generic data-request envelope
///
/// The inner `sl_appl_msg` carries `client`, `cmd_name`, `cseq` and any
/// command-specific fields; callers build it before wrapping.
pub(crate) fn data_req(client_id: &str, appl_msg: Value) -> Value {
    json!({
        "sl_appl_msg": appl_msg,
        "sl_appl_msg_type": "domo",
        "sl_client_id": client_id,
        "sl_cmd": "sl_data_req",
    })
}
