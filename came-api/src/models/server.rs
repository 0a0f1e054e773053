//! Server information and building topology entities

use serde::Deserialize;

/// Gateway information from a `feature_list_req` response
///
/// `keycode`, `serial` and the feature list are always present on a healthy
/// gateway; their absence means the response is malformed and the whole
/// parse fails.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    /// Keycode of the server (the MAC address, e.g. `001122AABBCC`)
    pub keycode: String,
    /// Serial number of the server
    pub serial: String,
    /// Features supported by the gateway, e.g. `"lights"`, `"openings"`,
    /// `"thermoregulation"`, `"scenarios"`, `"energy"`
    #[serde(rename = "list")]
    pub features: Vec<String>,
    /// Software version, when reported
    #[serde(default)]
    pub swver: Option<String>,
    /// Server type, when reported
    #[serde(rename = "type", default)]
    pub server_type: Option<String>,
    /// Board type, when reported
    #[serde(default)]
    pub board: Option<String>,
}

impl ServerInfo {
    /// Whether the gateway declares support for a feature
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// A floor in the building structure
#[derive(Debug, Clone, Deserialize)]
pub struct Floor {
    pub floor_ind: i64,
    pub name: String,
}

/// A room in the building structure, tied to its floor
#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    pub room_ind: i64,
    pub name: String,
    pub floor_ind: i64,
}
