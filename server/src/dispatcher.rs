//! Maps decoded session commands onto world operations.

use crate::game::WorldState;
use log::debug;
use shared::ClientMessage;

/// Applies one inbound command. Must only be called from the server loop,
/// between simulation steps.
pub fn dispatch(world: &mut WorldState, session_id: &str, message: ClientMessage) {
    match message {
        ClientMessage::SpawnFaction { player_id } => {
            world.spawn_faction(player_id.filter(|id| !id.is_empty()));
        }
        ClientMessage::AddChaos => {
            world.apply_chaos_nudge();
        }
        ClientMessage::FocusPoint { player_id, x, y } => {
            if !world.set_player_focus(&player_id, x, y) {
                debug!("Ignoring unusable focus point from session {}", session_id);
            }
        }
    }
}
