//! High-level facade over one gateway session
//!
//! Each operation asks the session for a valid client id (which may trigger
//! a login or a renewal), builds the matching request envelope, and parses
//! the response into typed entities.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::envelope;
use crate::error::{CameError, Result};
use crate::models::{
    Light, LightData, Opening, OpeningData, ServerInfo, UpdateList, User, UserData,
};
use crate::session::Session;

/// Entry point for talking to a CAME Domotic gateway
///
/// # Example
///
/// ```no_run
/// # async fn run() -> came_api::Result<()> {
/// use came_api::CameDomoticApi;
///
/// let api = CameDomoticApi::connect("192.168.1.3", "admin", "secret").await?;
/// for light in api.get_lights().await? {
///     println!("{} is {:?}", light.name(), light.status());
/// }
/// api.dispose().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CameDomoticApi {
    session: Arc<Session>,
}

impl CameDomoticApi {
    /// Connect to a gateway, probing the endpoint first
    ///
    /// Fails with [`CameError::ServerNotFound`] if the host does not answer
    /// or does not expose the API endpoint. No login happens until the first
    /// operation.
    pub async fn connect(host: &str, username: &str, password: &str) -> Result<Self> {
        let session = Session::connect(host, username, password).await?;
        Ok(Self {
            session: Arc::new(session),
        })
    }

    /// Connect reusing a caller-supplied `reqwest::Client`
    pub async fn connect_with(
        http: reqwest::Client,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let session = Session::connect_with(http, host, username, password).await?;
        Ok(Self {
            session: Arc::new(session),
        })
    }

    /// Shared handle to the underlying session, for advanced use
    pub fn session(&self) -> Arc<Session> {
        self.session.clone()
    }

    /// Dispose the underlying session; never fails
    pub async fn dispose(&self) {
        self.session.dispose().await;
    }

    /// List the users defined on the gateway
    ///
    /// A response without a user list yields an empty vec.
    pub async fn get_users(&self) -> Result<Vec<User>> {
        let client_id = self.session.valid_client_id().await?;
        let payload = json!({"sl_client_id": client_id, "sl_cmd": "sl_users_list_req"});

        let response = self.session.send_command(payload).await?;

        let users = response
            .get("sl_users_list")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        users
            .into_iter()
            .map(|raw| {
                let data: UserData = serde_json::from_value(raw)
                    .map_err(|e| malformed("sl_users_list_req", &e))?;
                Ok(User::new(data, self.session.clone()))
            })
            .collect()
    }

    /// Fetch gateway information and the supported feature list
    pub async fn get_server_info(&self) -> Result<ServerInfo> {
        let response = self.data_request("feature_list_req", json!({})).await?;
        serde_json::from_value(response).map_err(|e| malformed("feature_list_req", &e))
    }

    /// List all light devices defined on the gateway
    pub async fn get_lights(&self) -> Result<Vec<Light>> {
        let response = self
            .data_request(
                "light_list_req",
                json!({"topologic_scope": "plant", "value": 0}),
            )
            .await?;

        let lights = response
            .get("array")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        debug!(count = lights.len(), "received light list");

        lights
            .into_iter()
            .map(|raw| {
                let data: LightData =
                    serde_json::from_value(raw).map_err(|e| malformed("light_list_req", &e))?;
                Ok(Light::new(data, self.session.clone()))
            })
            .collect()
    }

    /// List all opening devices defined on the gateway
    pub async fn get_openings(&self) -> Result<Vec<Opening>> {
        let response = self
            .data_request(
                "openings_list_req",
                json!({"topologic_scope": "plant", "value": 0}),
            )
            .await?;

        let openings = response
            .get("array")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        openings
            .into_iter()
            .map(|raw| {
                let data: OpeningData = serde_json::from_value(raw)
                    .map_err(|e| malformed("openings_list_req", &e))?;
                Ok(Opening::new(data, self.session.clone()))
            })
            .collect()
    }

    /// Fetch the pending status updates
    pub async fn get_updates(&self) -> Result<UpdateList> {
        let response = self.data_request("status_update_req", json!({})).await?;
        Ok(UpdateList::from_response(&response))
    }

    /// Send one application command through the data-request envelope
    async fn data_request(&self, cmd_name: &str, extra_fields: Value) -> Result<Value> {
        let client_id = self.session.valid_client_id().await?;
        let cseq = self.session.cseq().await;

        let mut appl_msg = json!({
            "client": client_id,
            "cmd_name": cmd_name,
            "cseq": cseq,
        });
        if let (Some(msg), Value::Object(extra)) = (appl_msg.as_object_mut(), extra_fields) {
            for (key, value) in extra {
                msg.insert(key, value);
            }
        }

        self.session
            .send_command(envelope::data_req(&client_id, appl_msg))
            .await
    }
}

fn malformed(cmd_name: &str, cause: &serde_json::Error) -> CameError {
    CameError::Server(format!("Malformed {cmd_name} response ({cause})"))
}
