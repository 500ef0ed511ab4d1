//! Server network layer handling WebSocket sessions and the simulation loop

use crate::broadcast::{broadcast_state, greeting};
use crate::config::SimConfig;
use crate::dispatcher::dispatch;
use crate::game::WorldState;
use crate::scheduler::{Cadence, FixedStepClock};
use crate::session_manager::{Delivery, Session, SessionManager, OUTBOUND_QUEUE};
use crate::utils::generate_id;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{decode_client_message, encode_server_message, ClientMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Messages sent from connection tasks to the server loop
#[derive(Debug)]
pub enum NetworkEvent {
    SessionOpened {
        session_id: String,
        addr: SocketAddr,
        sender: mpsc::Sender<String>,
    },
    SessionClosed {
        session_id: String,
    },
    Command {
        session_id: String,
        message: ClientMessage,
    },
    Shutdown,
}

/// Main server owning the world and coordinating sessions with the simulation
pub struct Server {
    listener: Arc<TcpListener>,
    sessions: SessionManager,
    world: WorldState,
    config: SimConfig,

    event_tx: mpsc::UnboundedSender<NetworkEvent>,
    event_rx: mpsc::UnboundedReceiver<NetworkEvent>,
}

impl Server {
    pub async fn new(addr: &str, config: SimConfig) -> ServerResult<Self> {
        config.validate()?;

        let listener = Arc::new(TcpListener::bind(addr).await?);
        info!("Server listening on ws://{}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            sessions: SessionManager::new(config.max_sessions),
            world: WorldState::new(&config),
            config,
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for injecting events, `NetworkEvent::Shutdown` in particular.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<NetworkEvent> {
        self.event_tx.clone()
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Spawns task that accepts connections and hands each one its own task
    fn spawn_acceptor(&self) -> JoinHandle<()> {
        let listener = Arc::clone(&self.listener);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let event_tx = event_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = Self::handle_connection(stream, addr, event_tx).await {
                                debug!("Connection from {} ended with error: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Runs one session: a writer task drains the outbound queue while this
    /// task decodes inbound frames and forwards commands to the server loop.
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        event_tx: mpsc::UnboundedSender<NetworkEvent>,
    ) -> ServerResult<()> {
        let ws_stream = accept_async(stream).await?;
        let (mut write, mut read) = ws_stream.split();

        let session_id = generate_id(&mut rand::thread_rng());
        let (sender, mut outbound) = mpsc::channel::<String>(OUTBOUND_QUEUE);

        event_tx.send(NetworkEvent::SessionOpened {
            session_id: session_id.clone(),
            addr,
            sender,
        })?;

        let writer = tokio::spawn(async move {
            while let Some(payload) = outbound.recv().await {
                if let Err(e) = write.send(Message::Text(payload)).await {
                    debug!("Write to {} failed: {}", addr, e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => match decode_client_message(&text) {
                    Some(message) => {
                        let command = NetworkEvent::Command {
                            session_id: session_id.clone(),
                            message,
                        };
                        if event_tx.send(command).is_err() {
                            break;
                        }
                    }
                    None => debug!("Dropping malformed message from session {}", session_id),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Read from session {} failed: {}", session_id, e);
                    break;
                }
            }
        }

        let _ = event_tx.send(NetworkEvent::SessionClosed { session_id });
        writer.abort();
        Ok(())
    }

    /// Applies one event to the sessions or the world. Returns false on shutdown.
    fn handle_event(&mut self, event: NetworkEvent) -> bool {
        match event {
            NetworkEvent::SessionOpened {
                session_id,
                addr,
                sender,
            } => {
                let session = Session::new(session_id.clone(), addr, sender);
                if !self.sessions.add_session(session) {
                    // Dropping the sender ends the writer, which closes the socket.
                    warn!("Rejecting session from {}: server full", addr);
                    return true;
                }

                match encode_server_message(&greeting(&self.world, &session_id)) {
                    Ok(payload) => {
                        if self.sessions.send_to(&session_id, payload) != Delivery::Sent {
                            warn!("Could not greet session {}", session_id);
                        }
                    }
                    Err(e) => error!("Failed to encode greeting: {}", e),
                }
            }
            NetworkEvent::SessionClosed { session_id } => {
                self.sessions.remove_session(&session_id);
            }
            NetworkEvent::Command {
                session_id,
                message,
            } => {
                if self.sessions.contains(&session_id) {
                    dispatch(&mut self.world, &session_id, message);
                }
            }
            NetworkEvent::Shutdown => {
                info!("Server shutting down");
                return false;
            }
        }
        true
    }

    /// Runs the owed fixed steps, bootstrapping first if the arena is empty
    fn simulate(&mut self, steps: u32) {
        if steps == 0 {
            return;
        }

        self.world.ensure_minimum_world();

        let dt = self.config.dt();
        let start_tick = self.world.tick;
        for _ in 0..steps {
            self.world.step(dt);
        }

        if self.world.tick / 60 != start_tick / 60 {
            debug!(
                "Tick {}: {} factions, {} agents, {} sessions",
                self.world.tick,
                self.world.factions.len(),
                self.world.agents.len(),
                self.sessions.len()
            );
        }
    }

    /// Main server loop: inbound events and fixed steps on one timeline
    pub async fn run(&mut self) -> ServerResult<()> {
        let acceptor = self.spawn_acceptor();

        let mut ticker = interval(self.config.tick_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let now = Instant::now();
        let mut sim_clock =
            FixedStepClock::new(self.config.tick_period(), self.config.max_catch_up, now);
        let mut broadcast_cadence = Cadence::new(self.config.broadcast_period(), now);

        info!(
            "Simulation running: {:?} per step, broadcast every {:?}",
            sim_clock.period(),
            broadcast_cadence.period()
        );

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    let keep_running = match event {
                        Some(event) => self.handle_event(event),
                        None => false,
                    };
                    if !keep_running {
                        break;
                    }
                },

                _ = ticker.tick() => {
                    let now = Instant::now();

                    let budget = sim_clock.due_steps(now);
                    if budget.dropped > 0 {
                        warn!(
                            "Simulation fell behind, dropped {} steps at tick {}",
                            budget.dropped, self.world.tick
                        );
                    }
                    self.simulate(budget.steps);

                    if broadcast_cadence.poll(now) {
                        if let Some(report) = broadcast_state(&self.world, &mut self.sessions) {
                            if report.skipped > 0 || report.pruned > 0 {
                                debug!(
                                    "Broadcast tick {}: {} delivered, {} skipped, {} pruned",
                                    self.world.tick, report.delivered, report.skipped, report.pruned
                                );
                            }
                        }
                    }
                },
            }
        }

        acceptor.abort();
        Ok(())
    }
}
