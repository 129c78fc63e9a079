//! Room session: prints the change feed and sends typed commands.
//!
//! Row updates and animation hints arrive over the WebSocket; commands go
//! out over HTTP. Staged amounts shown to the user come from a reconciled
//! view, since a stage hint can arrive before the row that persists it.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use poker_room::{
    game::{Player, RoomSnapshot, RoomState},
    room::{HintKind, RoomEvent, StagedBets},
};
use serde_json::Value;
use tokio::io::AsyncBufReadExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
    api_client::ApiClient,
    commands::{Command, HELP_TEXT, HostCommand, parse_command},
};

/// Locally rendered state of one room
#[derive(Debug, Default)]
pub struct RoomView {
    pub room: Option<RoomState>,
    pub players: Vec<Player>,
    pub staged: StagedBets,
}

impl RoomView {
    pub fn from_snapshot(snapshot: RoomSnapshot) -> Self {
        let mut staged = StagedBets::new();
        staged.reconcile_all(&snapshot.players);
        Self {
            room: Some(snapshot.room),
            players: snapshot.players,
            staged,
        }
    }

    /// Fold an event into the view. Returns a line worth printing, if any.
    pub fn apply(&mut self, event: &RoomEvent) -> Option<String> {
        if let Some(hint) = event.bet_increase() {
            self.staged.apply_hint(&hint);
        }

        match event {
            RoomEvent::PlayerChanged { old, new } => {
                let shown = self.staged.reconcile(new);
                let line = describe_player_change(old.as_ref(), new, shown);
                match self.players.iter_mut().find(|p| p.player_id == new.player_id) {
                    Some(existing) => *existing = new.clone(),
                    None => self.players.push(new.clone()),
                }
                line
            }
            RoomEvent::RoomChanged { old, new } => {
                let line = describe_room_change(old.as_ref(), new);
                self.room = Some(new.clone());
                line
            }
            RoomEvent::StageAnimation { hint } => {
                let shown = self.staged.apply_hint(hint);
                match hint.kind {
                    HintKind::Stage => Some(format!(
                        "{} stages {} (showing {})",
                        self.name_of(&hint.player_id),
                        hint.amount,
                        shown
                    )),
                    HintKind::Bet => None,
                }
            }
        }
    }

    fn name_of<'a>(&'a self, player_id: &'a str) -> &'a str {
        self.players
            .iter()
            .find(|p| p.player_id == player_id)
            .map_or(player_id, |p| p.name.as_str())
    }

    /// Table summary for the `show` command
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(room) = &self.room {
            out.push_str(&format!(
                "Room {} | {} | pot {} | highest {} | dealer {} | turn {}\n",
                room.room_id,
                room.status,
                room.pot,
                room.current_highest_bet,
                seat_label(room.dealer_seat),
                seat_label(room.current_turn_seat),
            ));
        }

        let mut seated: Vec<&Player> = self.players.iter().filter(|p| p.is_seated()).collect();
        seated.sort_by_key(|p| p.seat);
        for p in seated {
            out.push_str(&format!(
                "  [{}] {} {} bal {} bet {} staged {}{}{}\n",
                seat_label(p.seat),
                p.avatar,
                p.name,
                p.balance,
                p.current_bet,
                self.staged.get(&p.player_id),
                if p.is_folded { " (folded)" } else { "" },
                match p.last_action.as_db() {
                    Some(action) => format!(" last: {action}"),
                    None => String::new(),
                },
            ));
        }
        out
    }
}

fn seat_label(seat: Option<u8>) -> String {
    seat.map_or_else(|| "-".to_string(), |s| s.to_string())
}

fn describe_player_change(old: Option<&Player>, new: &Player, staged: i64) -> Option<String> {
    let Some(old) = old else {
        return Some(format!("{} joined at seat {}", new.name, seat_label(new.seat)));
    };
    if (new.last_action != old.last_action || new.current_bet != old.current_bet)
        && let Some(action) = new.last_action.as_db()
    {
        return Some(format!(
            "{} {} (bet {}, balance {})",
            new.name, action, new.current_bet, new.balance
        ));
    }
    if new.staged_bet != old.staged_bet {
        return Some(format!("{} staged {}", new.name, staged));
    }
    if new.balance > old.balance && new.current_bet == old.current_bet {
        return Some(format!("{} now has {}", new.name, new.balance));
    }
    None
}

fn describe_room_change(old: Option<&RoomState>, new: &RoomState) -> Option<String> {
    let Some(old) = old else {
        return Some(format!("Room {} opened", new.room_id));
    };
    if new.status != old.status {
        return Some(format!("Stage: {}", new.status));
    }
    if new.pot != old.pot {
        return Some(format!("Pot: {}", new.pot));
    }
    if new.current_turn_seat != old.current_turn_seat {
        return Some(match new.current_turn_seat {
            Some(seat) => format!("Action on seat {seat}"),
            None if new.betting_round_complete => "Betting round complete".to_string(),
            None => "No one to act".to_string(),
        });
    }
    if new.dealer_seat != old.dealer_seat {
        return Some(format!("Dealer button at seat {}", seat_label(new.dealer_seat)));
    }
    None
}

/// Interactive session in one room
pub struct WebSocketClient {
    api: ApiClient,
    room_id: String,
}

impl WebSocketClient {
    pub fn new(api: ApiClient, room_id: String) -> Self {
        Self { api, room_id }
    }

    /// Connect to the feed and run the prompt until `quit` or EOF
    pub async fn connect_and_play(self) -> Result<()> {
        let ws_url = self.api.websocket_url(&self.room_id);
        println!("Connecting to {}...", ws_url);

        let (mut feed, _) = connect_async(&ws_url)
            .await
            .context("Failed to connect to WebSocket")?;

        let snapshot = self.api.snapshot(&self.room_id).await?;
        let mut view = RoomView::from_snapshot(snapshot);
        println!("Connected!\n{}\n{}", view.render(), HELP_TEXT);

        let mut stdin = tokio::io::BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                frame = feed.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(line) = handle_frame(&mut view, text.as_str()) {
                            println!("{line}");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        println!("Server closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        eprintln!("WebSocket error: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {}
                },
                line = stdin.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_command(&line) {
                        Ok(Command::Quit) => {
                            println!("Disconnecting...");
                            break;
                        }
                        Ok(Command::Help) => println!("{HELP_TEXT}"),
                        Ok(Command::Show) => {
                            match self.api.snapshot(&self.room_id).await {
                                Ok(snapshot) => {
                                    view = RoomView::from_snapshot(snapshot);
                                    print!("{}", view.render());
                                }
                                Err(e) => eprintln!("Error: {}", e),
                            }
                        }
                        Ok(command) => {
                            if let Err(e) = self.send(command).await {
                                eprintln!("Error: {}", e);
                            }
                        }
                        Err(e) => eprintln!("{}", e),
                    }
                }
            }
        }

        Ok(())
    }

    async fn send(&self, command: Command) -> Result<()> {
        let room_id = &self.room_id;
        match command {
            Command::Act(action) => {
                self.api.act(room_id, action).await?;
            }
            Command::Stage(amount) => {
                // A typed command has no gesture; use a steady pace.
                self.api.stage(room_id, amount, Some(1.0)).await?;
            }
            Command::Clear => {
                self.api.clear(room_id).await?;
            }
            Command::Confirm => {
                self.api.confirm(room_id).await?;
            }
            Command::Host(host) => {
                let reply = match &host {
                    HostCommand::Distribute(winner) => self.api.distribute(room_id, winner).await?,
                    HostCommand::Dealer(seat) => self.api.set_dealer(room_id, *seat).await?,
                    HostCommand::Status(status) => self.api.set_status(room_id, *status).await?,
                    other => self.api.host(room_id, other.route(), None).await?,
                };
                println!("{}: {}", host.route(), reply);
            }
            Command::Show | Command::Help | Command::Quit => {}
        }
        Ok(())
    }
}

/// Apply one text frame. Replies from the server are shown as-is.
pub fn handle_frame(view: &mut RoomView, text: &str) -> Option<String> {
    if let Ok(event) = serde_json::from_str::<RoomEvent>(text) {
        return view.apply(&event);
    }

    let reply: Value = serde_json::from_str(text).ok()?;
    match reply["type"].as_str() {
        Some("error") => Some(format!("Server: {}", reply["message"].as_str().unwrap_or("error"))),
        Some("resync") => Some("Fell behind the feed; type 'show' to reload".to_string()),
        _ => None,
    }
}
