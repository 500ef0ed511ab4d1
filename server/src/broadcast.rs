//! Full-snapshot fan-out to every open session.

use crate::game::WorldState;
use crate::session_manager::{BroadcastReport, SessionManager};
use log::error;
use shared::{encode_server_message, ServerMessage};

/// Serializes the current world once and queues it for every session.
/// Returns `None` if there was nobody to send to or encoding failed.
pub fn broadcast_state(
    world: &WorldState,
    sessions: &mut SessionManager,
) -> Option<BroadcastReport> {
    if sessions.is_empty() {
        return None;
    }

    let message = ServerMessage::State(world.snapshot());
    match encode_server_message(&message) {
        Ok(payload) => Some(sessions.broadcast(&payload)),
        Err(e) => {
            error!("Failed to encode state at tick {}: {}", world.tick, e);
            None
        }
    }
}

/// One-time greeting for a freshly registered session.
pub fn greeting(world: &WorldState, session_id: &str) -> ServerMessage {
    ServerMessage::Hello {
        session_id: session_id.to_string(),
        width: world.width(),
        height: world.height(),
        tick: world.tick,
    }
}
