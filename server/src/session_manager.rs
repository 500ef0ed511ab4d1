//! Connected session bookkeeping for the arena server
//!
//! This module tracks every open viewer/player connection:
//! - Session lifecycle (register, unregister, capacity limit)
//! - Bounded outbound queues feeding each session's writer task
//! - Non-blocking fan-out of serialized messages
//!
//! The registry is owned by the server loop. Connection tasks never touch it
//! directly; they report opens and closes as events.

use log::{debug, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Outbound messages a session may have queued before it is considered slow
pub const OUTBOUND_QUEUE: usize = 32;

/// Represents one connected session and its outbound queue
#[derive(Debug)]
pub struct Session {
    /// Random token assigned when the connection was accepted
    pub id: String,
    /// Peer address, for logging
    pub addr: SocketAddr,
    /// When the session was registered
    pub connected_at: Instant,
    /// Serialized messages waiting for the writer task
    sender: mpsc::Sender<String>,
}

impl Session {
    pub fn new(id: String, addr: SocketAddr, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        }
    }

    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Queues a payload without waiting
    pub fn try_send(&self, payload: String) -> Delivery {
        match self.sender.try_send(payload) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => Delivery::Skipped,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Result of queueing one payload for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Queue full, the session is too slow for this message
    Skipped,
    /// Writer is gone, the session is dead
    Closed,
}

/// Per-broadcast delivery counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
    pub pruned: usize,
}

/// Manages all open sessions
///
/// Enforces the capacity limit and fans messages out. A session that cannot
/// take a message is skipped for that message only; one whose queue is closed
/// is dropped from the registry.
pub struct SessionManager {
    /// Open sessions indexed by id
    sessions: HashMap<String, Session>,
    /// Maximum number of concurrent sessions allowed
    max_sessions: usize,
}

impl SessionManager {
    /// Creates an empty registry with the given capacity
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            max_sessions,
        }
    }

    /// Registers a session. Returns false if the server is full or the id is
    /// already taken.
    pub fn add_session(&mut self, session: Session) -> bool {
        if self.sessions.len() >= self.max_sessions || self.sessions.contains_key(&session.id) {
            return false;
        }

        info!("Session {} connected from {}", session.id, session.addr);
        self.sessions.insert(session.id.clone(), session);
        true
    }

    /// Removes a session. Returns true if it was registered.
    pub fn remove_session(&mut self, session_id: &str) -> bool {
        if let Some(session) = self.sessions.remove(session_id) {
            info!(
                "Session {} disconnected after {:.1}s",
                session.id,
                session.age().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Queues a payload for a single session. Unknown ids count as closed.
    pub fn send_to(&mut self, session_id: &str, payload: String) -> Delivery {
        let delivery = match self.sessions.get(session_id) {
            Some(session) => session.try_send(payload),
            None => return Delivery::Closed,
        };
        if delivery == Delivery::Closed {
            self.remove_session(session_id);
        }
        delivery
    }

    /// Queues the same payload for every session without blocking.
    pub fn broadcast(&mut self, payload: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut dead = Vec::new();

        for (id, session) in &self.sessions {
            match session.try_send(payload.to_string()) {
                Delivery::Sent => report.delivered += 1,
                Delivery::Skipped => {
                    debug!("Session {} is backed up, skipping message", id);
                    report.skipped += 1;
                }
                Delivery::Closed => dead.push(id.clone()),
            }
        }

        for id in &dead {
            self.remove_session(id);
        }
        report.pruned = dead.len();
        report
    }

    /// Returns the number of open sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no sessions are open
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
