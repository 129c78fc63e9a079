//! Command-line client for poker rooms.
//!
//! Loads this device's player identity, creates or joins a room, then
//! prints the room's change feed while reading commands from stdin.

use anyhow::{Context, Result};
use pico_args::Arguments;
use poker_room::{NewPlayer, PlayerIdentity, game::Seat};
use std::io::{self, Write};
use std::path::PathBuf;

use pr_client::{api_client::ApiClient, websocket_client::WebSocketClient};

const HELP: &str = "\
Join or host a poker room

USAGE:
  pr_client [OPTIONS]

OPTIONS:
  --server URL          Server URL  [default: http://localhost:6969]
  --room CODE           Room to join or resume
  --create              Create a new room and host it
  --name NAME           Display name  [default: system username]
  --avatar EMOJI        Avatar  [default: 🙂]
  --seat N              Seat to take (0-8)
  --buy-in CHIPS        Buy-in when taking a seat  [default: 1000]
  --identity PATH       Identity file  [default: .poker_room_identity]

FLAGS:
  -h, --help            Print help information
";

struct Args {
    server_url: String,
    room: Option<String>,
    create: bool,
    name: Option<String>,
    avatar: String,
    seat: Option<Seat>,
    buy_in: i64,
    identity: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server_url: pargs
            .opt_value_from_str("--server")?
            .unwrap_or_else(|| "http://localhost:6969".to_string()),
        room: pargs.opt_value_from_str("--room")?,
        create: pargs.contains("--create"),
        name: pargs.opt_value_from_str("--name")?,
        avatar: pargs
            .opt_value_from_str("--avatar")?
            .unwrap_or_else(|| "🙂".to_string()),
        seat: pargs.opt_value_from_str("--seat")?,
        buy_in: pargs.opt_value_from_str("--buy-in")?.unwrap_or(1000),
        identity: pargs
            .opt_value_from_str("--identity")?
            .unwrap_or_else(|| PathBuf::from(".poker_room_identity")),
    };

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let identity = PlayerIdentity::load_or_create(&args.identity)
        .with_context(|| format!("Failed to load identity from {}", args.identity.display()))?;
    println!("Playing as {}", identity.player_id);

    let api = ApiClient::new(args.server_url.clone(), identity.player_id);

    let room_id = if args.create {
        let snapshot = api.create_room().await.context("Failed to create room")?;
        println!("Created room {}. Share this code with the table.", snapshot.room.room_id);
        snapshot.room.room_id
    } else {
        let room_id = match args.room.as_deref() {
            Some(room) => room.to_uppercase(),
            None => prompt("Room code: ")?.to_uppercase(),
        };
        enter_room(&api, &room_id, &args).await?;
        room_id
    };

    WebSocketClient::new(api, room_id).connect_and_play().await?;

    println!("\nDisconnected from room.");
    Ok(())
}

/// Resume a saved seat or take a new one.
async fn enter_room(api: &ApiClient, room_id: &str, args: &Args) -> Result<()> {
    let check = api.check_room(room_id).await?;
    if !check.exists {
        anyhow::bail!("Room {} does not exist", room_id);
    }

    if check.is_member {
        let player = api.resume(room_id).await?;
        if player.is_host {
            println!("Welcome back, host of {}", room_id);
        } else {
            println!(
                "Welcome back {} (seat {}, balance {})",
                player.name,
                player.seat.map_or_else(|| "-".to_string(), |s| s.to_string()),
                player.balance
            );
        }
        return Ok(());
    }

    println!("Occupied seats: {:?}", check.occupied_seats);
    let seat = match args.seat {
        Some(seat) => seat,
        None => prompt("Seat (0-8): ")?.parse().context("Invalid seat number")?,
    };
    let name = args.name.clone().unwrap_or_else(whoami::username);
    if check.taken_names.contains(&name) {
        println!("Note: another player is already called {}", name);
    }

    let player = api
        .join_room(
            room_id,
            &NewPlayer {
                name,
                avatar: args.avatar.clone(),
                seat,
                buy_in: args.buy_in,
                color: None,
            },
        )
        .await?;
    println!("Seated {} at seat {} with {}", player.name, seat, player.balance);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
