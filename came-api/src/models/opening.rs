//! Opening entities (shutters and similar) and control
//!
//! Openings carry two actuator IDs: commands that close go to
//! `close_act_id`, everything else goes to `open_act_id`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::envelope;
use crate::error::Result;
use crate::session::Session;

/// Movement status of an opening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "i64")]
pub enum OpeningStatus {
    Stopped = 0,
    Opening = 1,
    Closing = 2,
}

impl From<i64> for OpeningStatus {
    fn from(value: i64) -> Self {
        match value {
            1 => OpeningStatus::Opening,
            2 => OpeningStatus::Closing,
            _ => OpeningStatus::Stopped,
        }
    }
}

impl Default for OpeningStatus {
    fn default() -> Self {
        OpeningStatus::Stopped
    }
}

/// Type of an opening as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "i64")]
pub enum OpeningType {
    Shutter,
    /// Type code not recognized by this library
    Unknown,
}

impl From<i64> for OpeningType {
    fn from(value: i64) -> Self {
        match value {
            0 => OpeningType::Shutter,
            other => {
                warn!(opening_type = other, "unknown opening type, treating as Unknown");
                OpeningType::Unknown
            }
        }
    }
}

impl Default for OpeningType {
    fn default() -> Self {
        OpeningType::Unknown
    }
}

/// Raw opening fields from an `openings_list_req` response item
#[derive(Debug, Clone, Deserialize)]
pub struct OpeningData {
    pub open_act_id: i64,
    pub close_act_id: i64,
    pub name: String,
    #[serde(default)]
    pub floor_ind: Option<i64>,
    #[serde(default)]
    pub room_ind: Option<i64>,
    #[serde(default)]
    pub status: OpeningStatus,
    #[serde(rename = "type", default)]
    pub opening_type: OpeningType,
    #[serde(rename = "partial", default)]
    pub partial_positions: Vec<Value>,
}

/// An opening (shutter, awning, gate) defined on the gateway
#[derive(Debug, Clone)]
pub struct Opening {
    data: OpeningData,
    session: Arc<Session>,
}

impl Opening {
    pub(crate) fn new(data: OpeningData, session: Arc<Session>) -> Self {
        Self { data, session }
    }

    /// Name of the opening
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Actuator ID for opening movements
    pub fn open_act_id(&self) -> i64 {
        self.data.open_act_id
    }

    /// Actuator ID for closing movements
    pub fn close_act_id(&self) -> i64 {
        self.data.close_act_id
    }

    /// Floor index, when the gateway reports one
    pub fn floor_ind(&self) -> Option<i64> {
        self.data.floor_ind
    }

    /// Room index, when the gateway reports one
    pub fn room_ind(&self) -> Option<i64> {
        self.data.room_ind
    }

    /// Current movement status
    pub fn status(&self) -> OpeningStatus {
        self.data.status
    }

    /// Opening type
    pub fn opening_type(&self) -> OpeningType {
        self.data.opening_type
    }

    /// Configured partial positions, if any
    pub fn partial_positions(&self) -> &[Value] {
        &self.data.partial_positions
    }

    /// Move the opening (open, close, stop)
    ///
    /// Closing commands address the closing actuator; open and stop address
    /// the opening actuator. Local state is updated only after the gateway
    /// acknowledges the command.
    pub async fn set_status(&mut self, status: OpeningStatus) -> Result<()> {
        let client_id = self.session.valid_client_id().await?;
        let cseq = self.session.cseq().await;

        let act_id = if status == OpeningStatus::Closing {
            self.data.close_act_id
        } else {
            self.data.open_act_id
        };
        debug!(opening = self.name(), act_id, status = ?status, "sending opening_move_req");

        let appl_msg = json!({
            "act_id": act_id,
            "client": client_id,
            "cmd_name": "opening_move_req",
            "cseq": cseq + 1,
            "wanted_status": status as i64,
        });

        self.session
            .send_command(envelope::data_req(&client_id, appl_msg))
            .await?;

        self.data.status = status;
        Ok(())
    }
}
