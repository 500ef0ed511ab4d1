//! # Arena Server Library
//!
//! Authoritative server for a real-time swarm arena. Autonomous agents grouped
//! into factions drift, steer and fight inside a wraparound arena, and every
//! connected viewer receives periodic full snapshots of the world.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server owns the only copy of the world. A fixed-timestep stepper moves
//! every agent (jitter, spring-like steering toward its faction's target, speed
//! clamp, Euler integration, wraparound, energy decay), then resolves contacts
//! between agents of different factions and culls the dead. Factions with no
//! agents left go extinct and the arena re-seeds itself when empty.
//!
//! ### Commands
//! Sessions may spawn factions (optionally owned by a player), nudge every agent
//! with random chaos, or set a temporary focus point that the player's factions
//! steer toward. Commands are queued and applied between steps.
//!
//! ### State Broadcasting
//! A broadcast cadence independent of the simulation rate serializes the world
//! to JSON and queues it for every session. Slow sessions are skipped, closed
//! ones are pruned.
//!
//! ## Architecture Design
//!
//! ### Single Mutation Timeline
//! Connection tasks only decode frames and forward events over a channel. The
//! server loop owns the `WorldState` and the session registry and processes
//! events and fixed steps sequentially inside one `tokio::select!`, so world
//! mutations never interleave.
//!
//! ### Drift-Free Scheduling
//! The simulation clock and the broadcast cadence both advance their last-fired
//! instant by whole periods. The simulation catches up on missed steps up to a
//! bounded backlog.
//!
//! ## Module Organization
//!
//! - `config`: runtime tuning (`SimConfig`)
//! - `game`: world state, factions, agents, focus points, command operations
//! - `spawner`: faction creation, radial agent spawning, bootstrap
//! - `stepper`: the fixed-timestep update and contact resolution
//! - `physics`: vector math, wraparound, overlap tests
//! - `scheduler`: fixed-step clock and broadcast cadence
//! - `session_manager`: open sessions and non-blocking fan-out
//! - `broadcast`: snapshot serialization and greeting
//! - `dispatcher`: inbound command to world operation mapping
//! - `network`: WebSocket transport and the server loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::SimConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut server = Server::new("127.0.0.1:8080", SimConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod dispatcher;
pub mod game;
pub mod network;
pub mod physics;
pub mod scheduler;
pub mod session_manager;
pub mod spawner;
pub mod stepper;
pub mod utils;
