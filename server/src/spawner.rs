//! Faction creation and the radial agent spawn pattern.

use crate::game::{Agent, Faction, WorldState};
use crate::physics::{wrap_axis, Vector2};
use crate::utils::{generate_id, opposite_hue, random_hue};
use log::info;
use rand::Rng;
use shared::{SPAWN_SPEED_MAX, SPAWN_SPEED_MIN, SPAWN_SPREAD};
use std::f32::consts::TAU;

/// Fraction of the arena kept free when placing a new faction: both sides of
/// the x axis, only the top of the y axis.
const SPAWN_INSET: f32 = 0.2;

impl WorldState {
    /// Adds `count` agents scattered around the faction center, each launched
    /// outward along its spawn angle. Returns the number of agents created,
    /// zero if the faction does not exist.
    pub fn spawn_agents(&mut self, faction_id: &str, count: usize) -> usize {
        let center = match self.faction(faction_id) {
            Some(faction) => faction.center,
            None => return 0,
        };

        self.agents.reserve(count);
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..TAU);
            let distance = self.rng.gen_range(0.0..=SPAWN_SPREAD);
            let speed = self.rng.gen_range(SPAWN_SPEED_MIN..=SPAWN_SPEED_MAX);

            let heading = Vector2::from_angle(angle);
            let position = center.add(&heading.scale(distance));
            let position = Vector2::new(
                wrap_axis(position.x, self.width),
                wrap_axis(position.y, self.height),
            );

            let id = self.next_agent_id();
            self.agents
                .push(Agent::new(id, faction_id, position, heading.scale(speed)));
        }
        count
    }

    /// Creates a faction at a random inset position and populates it with one
    /// batch of agents. Returns the new faction's id.
    pub fn spawn_faction(&mut self, owner: Option<String>) -> String {
        let x = self
            .rng
            .gen_range(self.width * SPAWN_INSET..self.width * (1.0 - SPAWN_INSET));
        let y = self
            .rng
            .gen_range(self.height * SPAWN_INSET..self.height);
        let hue = random_hue(&mut self.rng);

        let id = self.add_faction(hue, owner, Vector2::new(x, y));
        info!(
            "Spawned faction {} (hue {}, owner {:?}) at ({:.0}, {:.0})",
            id,
            hue,
            self.faction(&id).and_then(|f| f.owner.as_deref()),
            x,
            y
        );
        id
    }

    /// Seeds two opposing NPC factions when the arena has none. No effect
    /// otherwise; returns whether a bootstrap happened.
    pub fn ensure_minimum_world(&mut self) -> bool {
        if !self.factions.is_empty() {
            return false;
        }

        let hue = random_hue(&mut self.rng);
        let mid_y = self.height / 2.0;
        self.add_faction(hue, None, Vector2::new(self.width / 3.0, mid_y));
        self.add_faction(
            opposite_hue(hue),
            None,
            Vector2::new(self.width * 2.0 / 3.0, mid_y),
        );

        info!(
            "Bootstrapped arena at tick {} with {} agents",
            self.tick,
            self.agents.len()
        );
        true
    }

    fn add_faction(&mut self, hue: u16, owner: Option<String>, center: Vector2) -> String {
        let id = generate_id(&mut self.rng);
        self.factions.push(Faction {
            id: id.clone(),
            hue,
            owner,
            center,
        });
        let batch = self.batch_size;
        self.spawn_agents(&id, batch);
        id
    }
}
