//! Light entities and control
//!
//! Covers both plain on/off lights (`STEP_STEP`) and dimmable lights
//! (`DIMMER`). Unrecognized type strings degrade to [`LightType::Unknown`]
//! instead of failing the whole list parse; controlling such a light is
//! allowed but logged, since the gateway may reject the command.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::envelope;
use crate::error::Result;
use crate::session::Session;

/// On/off status of a light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "i64")]
pub enum LightStatus {
    Off = 0,
    On = 1,
}

impl From<i64> for LightStatus {
    fn from(value: i64) -> Self {
        match value {
            1 => LightStatus::On,
            _ => LightStatus::Off,
        }
    }
}

impl Default for LightStatus {
    fn default() -> Self {
        LightStatus::Off
    }
}

/// Type of a light as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LightType {
    /// Plain on/off light
    StepStep,
    /// Dimmable light
    Dimmer,
    /// Type string not recognized by this library
    Unknown,
}

impl From<String> for LightType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "STEP_STEP" => LightType::StepStep,
            "DIMMER" => LightType::Dimmer,
            other => {
                warn!(light_type = other, "unknown light type, treating as Unknown");
                LightType::Unknown
            }
        }
    }
}

impl Default for LightType {
    fn default() -> Self {
        LightType::Unknown
    }
}

/// Raw light fields from a `light_list_req` response item
#[derive(Debug, Clone, Deserialize)]
pub struct LightData {
    pub act_id: i64,
    pub name: String,
    #[serde(default)]
    pub floor_ind: Option<i64>,
    #[serde(default)]
    pub room_ind: Option<i64>,
    #[serde(default)]
    pub status: LightStatus,
    #[serde(rename = "type", default)]
    pub light_type: LightType,
    #[serde(default)]
    pub perc: Option<u8>,
}

/// A light defined on the gateway
#[derive(Debug, Clone)]
pub struct Light {
    data: LightData,
    session: Arc<Session>,
}

impl Light {
    pub(crate) fn new(data: LightData, session: Arc<Session>) -> Self {
        Self { data, session }
    }

    /// Actuator ID of the light
    pub fn act_id(&self) -> i64 {
        self.data.act_id
    }

    /// Name of the light
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Floor index, when the gateway reports one
    pub fn floor_ind(&self) -> Option<i64> {
        self.data.floor_ind
    }

    /// Room index, when the gateway reports one
    pub fn room_ind(&self) -> Option<i64> {
        self.data.room_ind
    }

    /// Current on/off status
    pub fn status(&self) -> LightStatus {
        self.data.status
    }

    /// Light type
    pub fn light_type(&self) -> LightType {
        self.data.light_type
    }

    /// Brightness percentage (0-100); non-dimmable lights report 100
    pub fn brightness(&self) -> u8 {
        self.data.perc.unwrap_or(100)
    }

    /// Switch the light, optionally setting brightness on dimmable lights
    ///
    /// `brightness` is clamped to 0-100 and silently ignored for lights
    /// that are not dimmers. Local state is updated only after the gateway
    /// acknowledges the command.
    pub async fn set_status(
        &mut self,
        status: LightStatus,
        brightness: Option<u8>,
    ) -> Result<()> {
        let brightness = if self.light_type() == LightType::Dimmer {
            brightness.map(|b| b.min(100))
        } else {
            if brightness.is_some() {
                debug!(
                    light = self.name(),
                    light_type = ?self.light_type(),
                    "light is not dimmable, ignoring brightness"
                );
            }
            None
        };

        if self.light_type() == LightType::Unknown {
            warn!(
                light = self.name(),
                act_id = self.act_id(),
                "setting status on a light of unknown type, the command may fail"
            );
        }

        let client_id = self.session.valid_client_id().await?;
        let cseq = self.session.cseq().await;

        let mut appl_msg = json!({
            "act_id": self.data.act_id,
            "client": client_id,
            "cmd_name": "light_switch_req",
            "cseq": cseq + 1,
            "wanted_status": status as i64,
        });
        if let Some(perc) = brightness {
            appl_msg["perc"] = json!(perc);
        }

        self.session
            .send_command(envelope::data_req(&client_id, appl_msg))
            .await?;

        self.data.status = status;
        if let Some(perc) = brightness {
            self.data.perc = Some(perc);
        }
        Ok(())
    }
}
