//! Fixed-timestep advancement of the arena.
//!
//! Per agent: jitter, steering toward the faction target, speed clamp, Euler
//! integration, wraparound and energy decay. Afterwards every pair of agents
//! from different factions is tested for contact and fights it out, then the
//! dead and the extinct are culled.
//!
//! The contact scan is O(n²) over living agents. That is fine for a few hundred
//! agents; anything beyond that needs a spatial index that keeps the exact
//! pairwise outcome.

use crate::game::{Agent, WorldState};
use crate::physics::{circles_overlap, wrap_axis, Vector2};
use log::info;
use rand::Rng;
use shared::{
    ENERGY_DECAY, FOCUS_DECAY, JITTER, MAX_SPEED, NEAR_TIE_ENERGY, STEER_GAIN, WIN_IMPULSE,
};
use std::collections::{HashMap, HashSet};

/// What happened during one `step` call.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StepOutcome {
    pub combats: usize,
    pub deaths: usize,
    pub extinct: Vec<String>,
}

impl WorldState {
    /// Advances the world by one fixed step. `dt` is 1.0 for a 16.666 ms step.
    /// The tick counter moves by exactly one per call.
    pub fn step(&mut self, dt: f32) -> StepOutcome {
        // Faction id -> steering target, resolved once for the whole step.
        let targets: HashMap<&str, Vector2> = self
            .factions
            .iter()
            .map(|faction| {
                let focus = faction
                    .owner
                    .as_ref()
                    .and_then(|owner| self.focus.get(owner))
                    .filter(|focus| focus.is_active());
                let target = match focus {
                    Some(focus) => focus.target,
                    None => faction.center,
                };
                (faction.id.as_str(), target)
            })
            .collect();

        let jitter = JITTER * dt;
        for agent in &mut self.agents {
            if jitter > 0.0 {
                agent.velocity.x += self.rng.gen_range(-jitter..=jitter);
                agent.velocity.y += self.rng.gen_range(-jitter..=jitter);
            }

            if let Some(target) = targets.get(agent.faction.as_str()) {
                let pull = target.sub(&agent.position).scale(STEER_GAIN * dt);
                agent.velocity = agent.velocity.add(&pull);
            }

            agent.velocity = agent.velocity.clamp_magnitude(MAX_SPEED);

            agent.position = agent.position.add(&agent.velocity.scale(dt));
            agent.position.x = wrap_axis(agent.position.x, self.width);
            agent.position.y = wrap_axis(agent.position.y, self.height);

            agent.energy -= ENERGY_DECAY * dt;
        }

        for focus in self.focus.values_mut() {
            focus.ttl -= dt * FOCUS_DECAY;
        }
        self.focus.retain(|_, focus| focus.is_active());

        let combats = resolve_collisions(&mut self.agents, &mut self.rng);

        let before = self.agents.len();
        self.agents.retain(Agent::is_alive);
        let deaths = before - self.agents.len();

        let living: HashSet<&str> = self.agents.iter().map(|a| a.faction.as_str()).collect();
        let mut extinct = Vec::new();
        self.factions.retain(|faction| {
            let alive = living.contains(faction.id.as_str());
            if !alive {
                extinct.push(faction.id.clone());
            }
            alive
        });
        for id in &extinct {
            info!("Faction {} went extinct at tick {}", id, self.tick);
        }

        self.tick += 1;

        StepOutcome {
            combats,
            deaths,
            extinct,
        }
    }
}

/// Resolves every contact between agents of different factions. The higher
/// energy wins, near ties are a coin flip. The loser drops to zero energy and
/// takes no part in later comparisons. Returns the number of fights.
pub fn resolve_collisions<R: Rng + ?Sized>(agents: &mut [Agent], rng: &mut R) -> usize {
    let alive: Vec<usize> = (0..agents.len())
        .filter(|&i| agents[i].is_alive())
        .collect();

    let mut combats = 0;
    for (n, &i) in alive.iter().enumerate() {
        for &j in &alive[n + 1..] {
            if !agents[i].is_alive() {
                break;
            }
            if !agents[j].is_alive() || agents[i].faction == agents[j].faction {
                continue;
            }
            if !circles_overlap(
                agents[i].position,
                agents[i].radius,
                agents[j].position,
                agents[j].radius,
            ) {
                continue;
            }

            let (winner, loser) = if first_wins(agents[i].energy, agents[j].energy, rng) {
                (i, j)
            } else {
                (j, i)
            };
            fight(agents, winner, loser);
            combats += 1;
        }
    }
    combats
}

fn first_wins<R: Rng + ?Sized>(a: f32, b: f32, rng: &mut R) -> bool {
    if (a - b).abs() < NEAR_TIE_ENERGY {
        rng.gen_bool(0.5)
    } else {
        a > b
    }
}

fn fight(agents: &mut [Agent], winner: usize, loser: usize) {
    let spoils = agents[loser].energy * 0.5;
    agents[loser].energy = 0.0;

    // Coincident agents normalize to zero: no push.
    let push = agents[winner]
        .position
        .sub(&agents[loser].position)
        .normalize()
        .scale(WIN_IMPULSE);

    let victor = &mut agents[winner];
    victor.energy += spoils;
    victor.velocity = victor.velocity.add(&push);
}
