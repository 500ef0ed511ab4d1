use serde::{Deserialize, Serialize};

/// Real-time length of one fixed simulation step, in milliseconds. A step of this
/// length corresponds to a normalized `dt` of 1.0.
pub const FIXED_DT_MS: f32 = 16.666;
pub const ARENA_WIDTH: f32 = 1200.0;
pub const ARENA_HEIGHT: f32 = 800.0;

pub const MAX_SPEED: f32 = 2.5;
pub const JITTER: f32 = 0.06;
pub const STEER_GAIN: f32 = 0.0008;
pub const ENERGY_DECAY: f32 = 0.0008;

pub const NEAR_TIE_ENERGY: f32 = 0.05;
pub const WIN_IMPULSE: f32 = 0.2;

pub const AGENT_RADIUS: f32 = 3.0;
pub const AGENT_ENERGY: f32 = 1.0;
pub const SPAWN_SPREAD: f32 = 80.0;
pub const SPAWN_SPEED_MIN: f32 = 0.6;
pub const SPAWN_SPEED_MAX: f32 = 1.4;
pub const FACTION_BATCH: usize = 60;

pub const FOCUS_TTL: f32 = 2.0;
pub const FOCUS_DECAY: f32 = 0.016;
pub const CHAOS_NUDGE: f32 = 0.9;

/// Commands a connected session may send to the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    SpawnFaction {
        #[serde(default, rename = "playerId")]
        player_id: Option<String>,
    },
    #[serde(alias = "chaosNudge")]
    AddChaos,
    FocusPoint {
        #[serde(rename = "playerId")]
        player_id: String,
        x: f32,
        y: f32,
    },
}

/// Messages pushed from the server to every session.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Hello {
        #[serde(rename = "sessionId")]
        session_id: String,
        width: f32,
        height: f32,
        tick: u64,
    },
    State(WorldSnapshot),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub factions: Vec<FactionView>,
    pub agents: Vec<AgentView>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FactionView {
    pub id: String,
    pub hue: u16,
    pub owner: Option<String>,
    pub cx: f32,
    pub cy: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AgentView {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub faction: String,
}

/// Decodes an inbound text frame. Anything that is not a well-formed command
/// yields `None` and is meant to be dropped without a reply.
pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
    let message: ClientMessage = serde_json::from_str(text).ok()?;
    match message {
        ClientMessage::SpawnFaction { player_id } => Some(ClientMessage::SpawnFaction {
            player_id: player_id.filter(|id| !id.is_empty()),
        }),
        ClientMessage::FocusPoint { ref player_id, x, y } => {
            if player_id.is_empty() || !x.is_finite() || !y.is_finite() {
                None
            } else {
                Some(message)
            }
        }
        ClientMessage::AddChaos => Some(message),
    }
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}
