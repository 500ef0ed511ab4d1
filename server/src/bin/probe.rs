//! Headless client for poking at a running arena server.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use shared::{ClientMessage, ServerMessage};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Connects to an arena server and prints what it sees")]
struct Args {
    /// Server WebSocket URL
    #[clap(short, long, default_value = "ws://127.0.0.1:8080")]
    url: String,
    /// Player id used for spawned factions and focus points
    #[clap(long, default_value = "probe")]
    player: String,
    /// Spawn an owned faction after connecting
    #[clap(long)]
    spawn: bool,
    /// Send a chaos nudge after connecting
    #[clap(long)]
    chaos: bool,
    /// Focus point as X,Y
    #[clap(long, value_delimiter = ',')]
    focus: Vec<f32>,
    /// Number of state messages to print before exiting
    #[clap(short = 'n', long, default_value = "20")]
    count: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("Connected to {}", args.url);
    let (mut write, mut read) = ws_stream.split();

    let mut commands = Vec::new();
    if args.spawn {
        commands.push(ClientMessage::SpawnFaction {
            player_id: Some(args.player.clone()),
        });
    }
    if args.chaos {
        commands.push(ClientMessage::AddChaos);
    }
    if let [x, y] = args.focus.as_slice() {
        commands.push(ClientMessage::FocusPoint {
            player_id: args.player.clone(),
            x: *x,
            y: *y,
        });
    }
    for command in &commands {
        write.send(Message::Text(serde_json::to_string(command)?)).await?;
        println!("Sent {:?}", command);
    }

    let mut states = 0;
    while let Some(frame) = read.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ServerMessage>(&text) {
            Ok(ServerMessage::Hello {
                session_id,
                width,
                height,
                tick,
            }) => {
                println!(
                    "Hello: session {} arena {}x{} at tick {}",
                    session_id, width, height, tick
                );
            }
            Ok(ServerMessage::State(snapshot)) => {
                let owned = snapshot
                    .factions
                    .iter()
                    .filter(|f| f.owner.as_deref() == Some(args.player.as_str()))
                    .count();
                println!(
                    "Tick {:>6}: {:>3} factions ({} owned), {:>4} agents",
                    snapshot.tick,
                    snapshot.factions.len(),
                    owned,
                    snapshot.agents.len()
                );
                states += 1;
                if states >= args.count {
                    break;
                }
            }
            Err(e) => println!("Unreadable message: {}", e),
        }
    }

    let _ = write.send(Message::Close(None)).await;
    Ok(())
}
