//! Authoritative world state and the externally triggerable mutations on it.
//!
//! `WorldState` is owned by the server loop and only ever mutated from there,
//! either by the fixed-step simulation (`stepper`, `spawner`) or by commands
//! drained from sessions between steps (`dispatcher`).

use crate::config::SimConfig;
use crate::physics::Vector2;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    AgentView, FactionView, WorldSnapshot, AGENT_ENERGY, AGENT_RADIUS, CHAOS_NUDGE, FOCUS_TTL,
};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Faction {
    pub id: String,
    /// Display hue in degrees, `[0, 360)`.
    pub hue: u16,
    /// Player steering this faction through focus points, `None` for NPC factions.
    pub owner: Option<String>,
    pub center: Vector2,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u64,
    pub position: Vector2,
    pub velocity: Vector2,
    /// Key into the faction list. The faction may disappear; the agent then drifts.
    pub faction: String,
    pub radius: f32,
    pub energy: f32,
}

impl Agent {
    pub fn new(id: u64, faction: &str, position: Vector2, velocity: Vector2) -> Self {
        Self {
            id,
            position,
            velocity,
            faction: faction.to_string(),
            radius: AGENT_RADIUS,
            energy: AGENT_ENERGY,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }
}

/// Transient steering override supplied by a player.
#[derive(Debug, Clone, Copy)]
pub struct PlayerFocus {
    pub target: Vector2,
    pub ttl: f32,
}

impl PlayerFocus {
    pub fn is_active(&self) -> bool {
        self.ttl > 0.0
    }
}

pub struct WorldState {
    pub tick: u64,
    pub factions: Vec<Faction>,
    pub agents: Vec<Agent>,
    pub focus: HashMap<String, PlayerFocus>,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) batch_size: usize,
    pub(crate) rng: StdRng,
    next_agent_id: u64,
}

impl WorldState {
    pub fn new(config: &SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            tick: 0,
            factions: Vec::new(),
            agents: Vec::new(),
            focus: HashMap::new(),
            width: config.width,
            height: config.height,
            batch_size: config.batch_size,
            rng,
            next_agent_id: 1,
        }
    }

    pub fn with_seed(config: &SimConfig, seed: u64) -> Self {
        let config = SimConfig {
            seed: Some(seed),
            ..config.clone()
        };
        Self::new(&config)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn faction(&self, id: &str) -> Option<&Faction> {
        self.factions.iter().find(|faction| faction.id == id)
    }

    pub fn agents_of<'a>(&'a self, faction_id: &'a str) -> impl Iterator<Item = &'a Agent> + 'a {
        self.agents
            .iter()
            .filter(move |agent| agent.faction == faction_id)
    }

    pub(crate) fn next_agent_id(&mut self) -> u64 {
        let id = self.next_agent_id;
        self.next_agent_id += 1;
        id
    }

    /// Adds a uniformly random vector in `[-0.9, 0.9]²` to every agent's velocity.
    pub fn apply_chaos_nudge(&mut self) {
        for agent in &mut self.agents {
            agent.velocity.x += self.rng.gen_range(-CHAOS_NUDGE..=CHAOS_NUDGE);
            agent.velocity.y += self.rng.gen_range(-CHAOS_NUDGE..=CHAOS_NUDGE);
        }
        debug!("Chaos nudge applied to {} agents", self.agents.len());
    }

    /// Sets or refreshes a player's focus point. Returns false and leaves the
    /// world untouched when the input is unusable.
    pub fn set_player_focus(&mut self, player_id: &str, x: f32, y: f32) -> bool {
        if player_id.is_empty() || !x.is_finite() || !y.is_finite() {
            return false;
        }

        self.focus.insert(
            player_id.to_string(),
            PlayerFocus {
                target: Vector2::new(x, y),
                ttl: FOCUS_TTL,
            },
        );
        true
    }

    /// Read-only projection sent to viewers.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            factions: self
                .factions
                .iter()
                .map(|faction| FactionView {
                    id: faction.id.clone(),
                    hue: faction.hue,
                    owner: faction.owner.clone(),
                    cx: faction.center.x,
                    cy: faction.center.y,
                })
                .collect(),
            agents: self
                .agents
                .iter()
                .map(|agent| AgentView {
                    x: agent.position.x,
                    y: agent.position.y,
                    r: agent.radius,
                    faction: agent.faction.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn test_world() -> WorldState {
        WorldState::with_seed(&SimConfig::default(), 7)
    }

    #[test]
    fn test_new_world_is_empty() {
        let world = test_world();
        assert_eq!(world.tick, 0);
        assert!(world.factions.is_empty());
        assert!(world.agents.is_empty());
        assert!(world.focus.is_empty());
    }

    #[test]
    fn test_set_player_focus() {
        let mut world = test_world();
        assert!(world.set_player_focus("p1", 10.0, 20.0));

        let focus = world.focus["p1"];
        assert_approx_eq!(focus.target.x, 10.0);
        assert_approx_eq!(focus.target.y, 20.0);
        assert_approx_eq!(focus.ttl, FOCUS_TTL);
    }

    #[test]
    fn test_set_player_focus_overwrites_and_refreshes() {
        let mut world = test_world();
        world.set_player_focus("p1", 10.0, 20.0);
        world.focus.get_mut("p1").unwrap().ttl = 0.3;

        world.set_player_focus("p1", 50.0, 60.0);
        let focus = world.focus["p1"];
        assert_approx_eq!(focus.target.x, 50.0);
        assert_approx_eq!(focus.ttl, FOCUS_TTL);
        assert_eq!(world.focus.len(), 1);
    }

    #[test]
    fn test_set_player_focus_ignores_bad_input() {
        let mut world = test_world();
        assert!(!world.set_player_focus("", 1.0, 1.0));
        assert!(!world.set_player_focus("p1", f32::NAN, 1.0));
        assert!(!world.set_player_focus("p1", 1.0, f32::INFINITY));
        assert!(world.focus.is_empty());
    }

    #[test]
    fn test_chaos_nudge_bounds() {
        let mut world = test_world();
        for i in 0..200 {
            world.agents.push(Agent::new(
                i,
                "f",
                Vector2::new(10.0, 10.0),
                Vector2::default(),
            ));
        }

        world.apply_chaos_nudge();

        assert!(world.agents.iter().all(|agent| {
            agent.velocity.x.abs() <= CHAOS_NUDGE && agent.velocity.y.abs() <= CHAOS_NUDGE
        }));
        assert!(world
            .agents
            .iter()
            .any(|agent| agent.velocity.magnitude() > 0.0));
    }

    #[test]
    fn test_snapshot_projection() {
        let mut world = test_world();
        world.tick = 9;
        world.factions.push(Faction {
            id: "f1".to_string(),
            hue: 120,
            owner: Some("p1".to_string()),
            center: Vector2::new(300.0, 200.0),
        });
        world.agents.push(Agent::new(
            1,
            "f1",
            Vector2::new(310.0, 190.0),
            Vector2::new(1.0, 0.0),
        ));

        let snapshot = world.snapshot();
        assert_eq!(snapshot.tick, 9);
        assert_eq!(snapshot.factions.len(), 1);
        assert_eq!(snapshot.factions[0].owner.as_deref(), Some("p1"));
        assert_approx_eq!(snapshot.factions[0].cx, 300.0);
        assert_eq!(snapshot.agents.len(), 1);
        assert_eq!(snapshot.agents[0].faction, "f1");
        assert_approx_eq!(snapshot.agents[0].r, AGENT_RADIUS);
    }
}
