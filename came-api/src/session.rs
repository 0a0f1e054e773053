//! Gateway session lifecycle management
//!
//! This module owns the server-issued session token and everything needed to
//! keep it fresh: the credential vault, the expiry clock, the command
//! sequence counter, and the mutex that serializes login and renewal across
//! concurrent callers.
//!
//! All session state lives behind one async-aware lock. Every public entry
//! point acquires it exactly once; while one caller's login is suspended on
//! network I/O, every other caller waits on the lock instead of issuing a
//! competing login. Gateways of this family reject a login while another
//! session is still being established ("too many sessions"), so at most one
//! login in flight is a correctness requirement, not an optimization.

use std::time::{Duration, Instant};

use domo_client::{DomoClient, DomoError};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::ack;
use crate::envelope;
use crate::error::{CameError, Result};
use crate::vault::{CredentialBackup, CredentialVault};

/// Default timeout for gateway round-trips
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Margin subtracted from the server-declared keep-alive interval when
/// computing local expiry, so renewal happens before the gateway's own
/// timeout fires
const SAFE_ZONE_SEC: u64 = 30;

/// Session state protected by the session mutex
#[derive(Debug)]
struct SessionState {
    vault: CredentialVault,
    /// Token issued by the gateway; empty means "no active session"
    client_id: String,
    /// Local expiry instant, already including the safe zone; `None` forces
    /// a login on next use
    expires_at: Option<Instant>,
    /// Keep-alive interval declared by the gateway at login, in seconds
    keep_alive_timeout_sec: u64,
    /// Commands successfully dispatched over this session's lifetime
    cseq: u64,
    disposed: bool,
}

impl SessionState {
    fn new(vault: CredentialVault) -> Self {
        Self {
            vault,
            client_id: String::new(),
            expires_at: None,
            keep_alive_timeout_sec: 0,
            cseq: 0,
            disposed: false,
        }
    }

    /// A session is valid iff it has a token and the expiry has not passed
    fn is_valid(&self) -> bool {
        !self.client_id.is_empty() && self.expires_at.is_some_and(|t| Instant::now() < t)
    }

    /// Recompute expiry from now, keeping the safe zone
    fn refresh_expiry(&mut self) {
        let window = self.keep_alive_timeout_sec.saturating_sub(SAFE_ZONE_SEC);
        self.expires_at = Some(Instant::now() + Duration::from_secs(window));
    }

    fn invalidate(&mut self) {
        self.client_id.clear();
        self.expires_at = None;
    }
}

/// Opaque snapshot of a session's full state
///
/// Produced by [`Session::backup`] and consumed by [`Session::restore`];
/// used to roll an identity switch back when it fails partway.
#[derive(Debug, Clone)]
pub struct SessionBackup {
    credentials: CredentialBackup,
    client_id: String,
    expires_at: Option<Instant>,
    keep_alive_timeout_sec: u64,
    cseq: u64,
}

/// Authenticated session against one CAME Domotic gateway
///
/// Cheap to share behind an `Arc`; all interior state is guarded by one
/// async mutex.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> came_api::Result<()> {
/// use came_api::Session;
///
/// let session = Session::connect("192.168.1.3", "admin", "secret").await?;
/// let client_id = session.valid_client_id().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    client: DomoClient,
    state: Mutex<SessionState>,
}

impl Session {
    /// Connect to a gateway host, probing the endpoint first
    ///
    /// The probe is a plain GET against the API endpoint; any failure means
    /// the host is misconfigured and surfaces as
    /// [`CameError::ServerNotFound`]. No login happens here: the session is
    /// established lazily on first use.
    pub async fn connect(host: &str, username: &str, password: &str) -> Result<Self> {
        Self::connect_with(reqwest::Client::new(), host, username, password).await
    }

    /// Connect reusing a caller-supplied `reqwest::Client`
    pub async fn connect_with(
        http: reqwest::Client,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let client = DomoClient::with_http_client(http, host);
        client.probe(DEFAULT_TIMEOUT).await.map_err(|e| {
            CameError::ServerNotFound(format!(
                "HTTP GET of '{}' failed ({e})",
                client.endpoint_url()
            ))
        })?;

        Ok(Self {
            client,
            state: Mutex::new(SessionState::new(CredentialVault::new(username, password))),
        })
    }

    /// The gateway endpoint this session talks to
    pub fn endpoint_url(&self) -> &str {
        self.client.endpoint_url()
    }

    /// Get a valid client id, logging in first if needed
    ///
    /// This is the single gate every higher-level operation passes through
    /// before building a payload that carries a session token. Concurrent
    /// callers racing against an expired session serialize on the session
    /// mutex: the first performs the login, the rest observe the fresh token.
    pub async fn valid_client_id(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        Self::ensure_live(&state)?;
        if !state.is_valid() {
            self.perform_login(&mut state).await?;
        }
        Ok(state.client_id.clone())
    }

    /// Send a command envelope with the default timeout and ack checking
    pub async fn send_command(&self, payload: Value) -> Result<Value> {
        self.send_command_with(payload, DEFAULT_TIMEOUT, false).await
    }

    /// Send a command envelope with explicit timeout and ack-check control
    ///
    /// Any 2xx answer counts as proof the session is alive: the command
    /// sequence advances and the expiry clock is reset from the gateway's
    /// declared keep-alive interval, whatever the payload was. Failed
    /// round-trips mutate nothing.
    ///
    /// With `skip_ack_check` the caller takes over interpretation of
    /// `sl_data_ack_reason`; the login path uses this so that a rejected
    /// login is reported as an authentication error rather than a generic
    /// server error.
    pub async fn send_command_with(
        &self,
        payload: Value,
        timeout: Duration,
        skip_ack_check: bool,
    ) -> Result<Value> {
        let mut state = self.state.lock().await;
        Self::ensure_live(&state)?;
        self.send_locked(&mut state, &payload, timeout, skip_ack_check)
            .await
    }

    /// Log in, or renew the session if it is already valid
    ///
    /// Callers never need to distinguish a first login from a renewal: a
    /// valid session gets a keep-alive, an invalid one gets a fresh login.
    pub async fn login(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::ensure_live(&state)?;
        if state.is_valid() {
            self.perform_keep_alive(&mut state).await
        } else {
            self.perform_login(&mut state).await
        }
    }

    /// Keep the session alive, logging in again if it has expired
    ///
    /// Same operation as [`login`](Self::login), seen from the other side.
    pub async fn keep_alive(&self) -> Result<()> {
        self.login().await
    }

    /// Log out and discard the session token
    ///
    /// The token and expiry are cleared whatever the gateway answers; a
    /// transport failure still surfaces after the local state is gone, but
    /// no recovery is attempted.
    pub async fn logout(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::ensure_live(&state)?;
        if !state.is_valid() {
            return Ok(());
        }

        let payload = envelope::logout_req(&state.client_id);
        let result = self
            .send_locked(&mut state, &payload, DEFAULT_TIMEOUT, true)
            .await;
        state.invalidate();
        result.map(|_| ())
    }

    /// Dispose the session: best-effort logout, then scrub all secrets
    ///
    /// Never fails; a gateway that is already unreachable cannot block
    /// disposal. Every later operation on this session returns an
    /// authentication error.
    pub async fn dispose(&self) {
        let mut state = self.state.lock().await;
        if state.disposed {
            return;
        }

        if state.is_valid() {
            let payload = envelope::logout_req(&state.client_id);
            if let Err(e) = self
                .send_locked(&mut state, &payload, DEFAULT_TIMEOUT, true)
                .await
            {
                warn!(error = %e, "logout during disposal failed");
            }
        }

        state.invalidate();
        state.vault.scrub();
        state.disposed = true;
        debug!("session disposed");
    }

    /// Whether the session currently holds a non-expired token
    pub async fn is_session_valid(&self) -> bool {
        self.state.lock().await.is_valid()
    }

    /// Current command sequence counter
    ///
    /// Read-only surface for payload construction; the counter itself only
    /// advances inside [`send_command`](Self::send_command).
    pub async fn cseq(&self) -> u64 {
        self.state.lock().await.cseq
    }

    /// Snapshot the full session state, credentials included
    pub async fn backup(&self) -> SessionBackup {
        let state = self.state.lock().await;
        SessionBackup {
            credentials: state.vault.export(),
            client_id: state.client_id.clone(),
            expires_at: state.expires_at,
            keep_alive_timeout_sec: state.keep_alive_timeout_sec,
            cseq: state.cseq,
        }
    }

    /// Overwrite the session state with a prior snapshot, verbatim
    pub async fn restore(&self, backup: SessionBackup) {
        let mut state = self.state.lock().await;
        state.vault.import(backup.credentials);
        state.client_id = backup.client_id;
        state.expires_at = backup.expires_at;
        state.keep_alive_timeout_sec = backup.keep_alive_timeout_sec;
        state.cseq = backup.cseq;
    }

    /// Replace the stored credentials
    ///
    /// Changed credentials always invalidate the current token: the next
    /// operation logs in as the new identity.
    pub async fn update_credentials(&self, username: &str, password: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::ensure_live(&state)?;
        state.vault.set(username, password)?;
        state.invalidate();
        Ok(())
    }

    /// Switch the session to another identity
    ///
    /// Logs out, installs the new credentials, and logs back in. If any step
    /// fails the previous state is restored in full, credentials included,
    /// so the session keeps authenticating as the original identity.
    pub async fn switch_user(&self, username: &str, password: &str) -> Result<()> {
        let backup = self.backup().await;

        if let Err(e) = self.try_switch(username, password).await {
            warn!(user = username, error = %e, "identity switch failed, restoring previous state");
            self.restore(backup).await;
            return Err(e);
        }
        Ok(())
    }

    async fn try_switch(&self, username: &str, password: &str) -> Result<()> {
        self.logout().await?;
        self.update_credentials(username, password).await?;
        self.login().await
    }

    fn ensure_live(state: &SessionState) -> Result<()> {
        if state.disposed {
            return Err(CameError::Auth("Session has been disposed".to_string()));
        }
        Ok(())
    }

    /// One raw round-trip, refreshing cseq/expiry on any 2xx answer
    ///
    /// A decode failure still implies a 2xx status, so it refreshes too;
    /// only failed round-trips (non-2xx, timeout, network) leave the state
    /// untouched.
    async fn post_locked(
        &self,
        state: &mut SessionState,
        payload: &Value,
        timeout: Duration,
    ) -> std::result::Result<Value, DomoError> {
        let result = self.client.post(payload, timeout).await;
        match &result {
            Ok(_) | Err(DomoError::Decode(_)) => {
                state.cseq += 1;
                state.refresh_expiry();
            }
            Err(_) => {}
        }
        result
    }

    async fn send_locked(
        &self,
        state: &mut SessionState,
        payload: &Value,
        timeout: Duration,
        skip_ack_check: bool,
    ) -> Result<Value> {
        let response = match self.post_locked(state, payload, timeout).await {
            Ok(response) => response,
            Err(e) => {
                error!(command = %command_name(payload), error = %e, "error sending command");
                return Err(e.into());
            }
        };

        if !skip_ack_check {
            if let Err(e) = check_ack(&response) {
                error!(command = %command_name(payload), error = %e, "error sending command");
                return Err(e);
            }
        }

        Ok(response)
    }

    /// Login with the vault's credentials; caller holds the lock
    ///
    /// Every failure on this path is an authentication error: a rejected
    /// login, a malformed login response, and a login that never reached the
    /// gateway are indistinguishable to the caller, who can only re-check
    /// credentials and try again.
    async fn perform_login(&self, state: &mut SessionState) -> Result<()> {
        let payload = {
            let username = state.vault.username()?;
            let password = state.vault.password()?;
            envelope::registration_req(&username, &password)
        };

        let response = match self.post_locked(state, &payload, DEFAULT_TIMEOUT).await {
            Ok(response) => response,
            Err(DomoError::Decode(e)) => {
                return Err(CameError::Auth(format!(
                    "Bad login response (JSON decoding failed): {e}"
                )))
            }
            Err(DomoError::Status(code)) => {
                return Err(CameError::Auth(format!(
                    "Login failed due to HTTP {code} error"
                )))
            }
            Err(e) => return Err(CameError::Auth(format!("Login failed ({e})"))),
        };

        let ack_reason = response
            .get("sl_data_ack_reason")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        if ack_reason == 1 {
            return Err(CameError::Auth("Bad credentials.".to_string()));
        }
        if ack_reason != 0 {
            // any non-zero ack during login is an authentication failure
            return Err(CameError::Auth(format!(
                "ACK error {}: {}",
                ack_reason,
                ack::ack_error_message(ack_reason)
            )));
        }

        let client_id = response
            .get("sl_client_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CameError::Auth("Bad login response (missing sl_client_id)".to_string())
            })?;
        let keep_alive = response
            .get("sl_keep_alive_timeout_sec")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                CameError::Auth(
                    "Bad login response (missing sl_keep_alive_timeout_sec)".to_string(),
                )
            })?;

        state.client_id = client_id.to_string();
        state.keep_alive_timeout_sec = keep_alive;
        state.refresh_expiry();
        debug!(keep_alive_timeout_sec = keep_alive, "session established");
        Ok(())
    }

    /// Renew a currently-valid session; caller holds the lock
    ///
    /// The keep-alive answer itself carries no token data; the expiry
    /// advance happens through the unconditional refresh in the send path.
    async fn perform_keep_alive(&self, state: &mut SessionState) -> Result<()> {
        let payload = envelope::keep_alive_req(&state.client_id);
        self.send_locked(state, &payload, DEFAULT_TIMEOUT, false)
            .await
            .map(|_| ())
    }
}

/// Validate the ack code of a decoded response
fn check_ack(response: &Value) -> Result<()> {
    let ack_reason = response
        .get("sl_data_ack_reason")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if ack_reason != 0 {
        return Err(ack::ack_error(ack_reason));
    }
    Ok(())
}

/// Best-effort command name for log lines
fn command_name(payload: &Value) -> &str {
    payload
        .get("sl_appl_msg")
        .and_then(|m| m.get("cmd_name"))
        .and_then(Value::as_str)
        .or_else(|| payload.get("sl_cmd").and_then(Value::as_str))
        .unwrap_or("unknown")
}
