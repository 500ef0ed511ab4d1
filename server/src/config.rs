//! Runtime tuning for the simulation and the network loop.

use shared::{ARENA_HEIGHT, ARENA_WIDTH, FACTION_BATCH, FIXED_DT_MS};
use std::time::Duration;

pub const MIN_BROADCAST_MS: u64 = 100;
pub const MAX_BROADCAST_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub width: f32,
    pub height: f32,
    /// Agents created per spawned faction, bootstrap factions included.
    pub batch_size: usize,
    /// Real-time period of one fixed step, in milliseconds.
    pub tick_ms: f32,
    pub broadcast_ms: u64,
    /// Upper bound on fixed steps run in a single poll when the loop fell behind.
    pub max_catch_up: u32,
    pub max_sessions: usize,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            batch_size: FACTION_BATCH,
            tick_ms: FIXED_DT_MS,
            broadcast_ms: MIN_BROADCAST_MS,
            max_catch_up: 5,
            max_sessions: 64,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Normalized step multiplier: one `FIXED_DT_MS` step is `1.0`.
    pub fn dt(&self) -> f32 {
        self.tick_ms / FIXED_DT_MS
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f32(self.tick_ms.max(1.0) / 1000.0)
    }

    pub fn broadcast_period(&self) -> Duration {
        Duration::from_millis(self.broadcast_ms.clamp(MIN_BROADCAST_MS, MAX_BROADCAST_MS))
    }

    /// Rejects arena sizes and step lengths the simulation cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(format!("arena width must be positive, got {}", self.width));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(format!("arena height must be positive, got {}", self.height));
        }
        if !(self.tick_ms.is_finite() && self.tick_ms > 0.0) {
            return Err(format!("tick length must be positive, got {}ms", self.tick_ms));
        }
        if self.max_sessions == 0 {
            return Err("max sessions must be at least 1".to_string());
        }
        Ok(())
    }
}
