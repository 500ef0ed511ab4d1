use clap::Parser;
use log::{error, info};
use server::config::SimConfig;
use server::network::{NetworkEvent, Server, ServerResult};
use shared::{ARENA_HEIGHT, ARENA_WIDTH, FACTION_BATCH, FIXED_DT_MS};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "Real-time multiplayer swarm arena server")]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Fixed simulation step, in milliseconds
    #[clap(long, default_value_t = FIXED_DT_MS)]
    tick_ms: f32,
    /// State broadcast period in milliseconds (clamped to 100-250)
    #[clap(long, default_value = "100")]
    broadcast_ms: u64,
    /// Arena width
    #[clap(long, default_value_t = ARENA_WIDTH)]
    width: f32,
    /// Arena height
    #[clap(long, default_value_t = ARENA_HEIGHT)]
    height: f32,
    /// Agents spawned per faction
    #[clap(long, default_value_t = FACTION_BATCH)]
    batch: usize,
    /// Maximum concurrent sessions
    #[clap(long, default_value = "64")]
    max_sessions: usize,
    /// Seed for the simulation RNG
    #[clap(long)]
    seed: Option<u64>,
}

impl From<Args> for SimConfig {
    fn from(args: Args) -> Self {
        SimConfig {
            width: args.width,
            height: args.height,
            batch_size: args.batch,
            tick_ms: args.tick_ms,
            broadcast_ms: args.broadcast_ms,
            max_sessions: args.max_sessions,
            seed: args.seed,
            ..SimConfig::default()
        }
    }
}

/// Parses arguments, binds the server and runs it until Ctrl+C.
#[tokio::main]
async fn main() -> ServerResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let mut server = Server::new(&address, SimConfig::from(args)).await?;
    let shutdown = server.event_sender();

    let server_handle = tokio::spawn(async move { server.run().await });

    tokio::select! {
        result = server_handle => {
            match result {
                Ok(Err(e)) => error!("Server stopped with error: {}", e),
                Err(e) => error!("Server task panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            let _ = shutdown.send(NetworkEvent::Shutdown);
        }
    }

    Ok(())
}
