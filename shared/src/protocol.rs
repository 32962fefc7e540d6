use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// The five collectible satellite parts. The server treats kinds as opaque
/// strings; this list is for clients and tools.
pub const KNOWN_COMPONENT_KINDS: [&str; 5] =
    ["Antenna", "Modem", "SolarPanel", "Battery", "OrbitStabilizer"];

/// Full registry snapshot, keyed by connection id.
pub type PlayersMap = BTreeMap<String, PlayerWire>;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "connected")]
    Connected(ConnectedMsg),
    #[serde(rename = "sync")]
    Sync(PlayersMsg),
    #[serde(rename = "joined")]
    Joined(JoinedMsg),
    #[serde(rename = "moved")]
    Moved(PlayersMsg),
    #[serde(rename = "collected")]
    Collected(CollectedMsg),
    #[serde(rename = "left")]
    Left(LeftMsg),
}

impl ServerMsg {
    /// Event name as it appears in the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMsg::Connected(_) => "connected",
            ServerMsg::Sync(_) => "sync",
            ServerMsg::Joined(_) => "joined",
            ServerMsg::Moved(_) => "moved",
            ServerMsg::Collected(_) => "collected",
            ServerMsg::Left(_) => "left",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMsg {
    pub protocol_version: u32,
    pub server_version: String,
    pub self_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
pub struct PlayersMsg {
    pub players: PlayersMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
pub struct JoinedMsg {
    pub player: PlayerWire,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
pub struct CollectedMsg {
    pub id: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
pub struct LeftMsg {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub id: String,
    pub username: String,
    pub position: Position,
    pub rotation: f64,
    #[serde(default)]
    pub is_moving: bool,
    #[serde(default)]
    pub is_jumping: bool,
    #[serde(default)]
    pub collected_components: Vec<String>,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "join")]
    Join {
        #[serde(default)]
        username: String,
    },
    #[serde(rename = "move")]
    Move {
        position: Position,
        rotation: f64,
        #[serde(rename = "isMoving")]
        is_moving: bool,
        #[serde(rename = "isJumping")]
        is_jumping: bool,
    },
    #[serde(rename = "collect")]
    Collect { kind: String },
}
