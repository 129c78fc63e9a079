use poker_room::game::{Action, Chips, GameStatus, PlayerId, Seat};
use std::fmt;

/// Host-only commands
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    Collect,
    Distribute(PlayerId),
    Advance,
    NewRound,
    Dealer(Seat),
    MoveButton,
    Status(GameStatus),
    StartRound,
}

impl HostCommand {
    /// Route segment under `/rooms/{room_id}/host/`
    pub fn route(&self) -> &'static str {
        match self {
            Self::Collect => "collect",
            Self::Distribute(_) => "distribute",
            Self::Advance => "advance",
            Self::NewRound => "new-round",
            Self::Dealer(_) => "dealer",
            Self::MoveButton => "move-button",
            Self::Status(_) => "status",
            Self::StartRound => "start-round",
        }
    }
}

/// Commands typed at the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Act(Action),
    Stage(Chips),
    Clear,
    Confirm,
    Host(HostCommand),
    Show,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Amount is missing or not a positive number.
    InvalidAmount(String),
    InvalidSeat(String),
    InvalidStatus(String),
    /// `pay` needs the winner's player id.
    MissingWinner,
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAmount(value) => write!(
                f,
                "Invalid amount '{}'. Must be a positive number (e.g., 'bet 100')",
                value
            ),
            Self::InvalidSeat(value) => write!(f, "Invalid seat '{}'", value),
            Self::InvalidStatus(value) => write!(
                f,
                "Invalid stage '{}'. Use waiting, pre-flop, flop, turn, river or showdown",
                value
            ),
            Self::MissingWinner => write!(f, "Pay requires a player id (e.g., 'pay player_x')"),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP_TEXT: &str = "\
Player: fold, check, call, bet <total>, stage <total>, clear, confirm
Host:   collect, pay <player_id>, advance, new-round, dealer <seat>,
        button, status <stage>, start-round
Other:  show, help, quit";

/// Parse a command line.
///
/// # Examples
///
/// ```
/// use pr_client::commands::{Command, HostCommand, parse_command};
/// use poker_room::game::Action;
///
/// assert_eq!(parse_command("call"), Ok(Command::Act(Action::Call)));
/// assert_eq!(parse_command("raise 200"), Ok(Command::Act(Action::BetRaise(200))));
/// assert_eq!(parse_command("dealer 3"), Ok(Command::Host(HostCommand::Dealer(3))));
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();
    let lowered = trimmed.to_lowercase();
    let parts: Vec<&str> = lowered.split_ascii_whitespace().collect();

    let command = match parts.as_slice() {
        ["fold"] => Command::Act(Action::Fold),
        ["check"] => Command::Act(Action::Check),
        ["call"] => Command::Act(Action::Call),
        ["bet" | "raise", amount] => Command::Act(Action::BetRaise(parse_amount(amount)?)),
        ["bet" | "raise"] => return Err(ParseError::InvalidAmount(String::new())),
        ["stage", amount] => Command::Stage(parse_amount(amount)?),
        ["clear"] => Command::Clear,
        ["confirm"] => Command::Confirm,

        ["collect"] => Command::Host(HostCommand::Collect),
        ["pay"] => return Err(ParseError::MissingWinner),
        ["pay", _] => {
            // Player ids are case sensitive; take the original token.
            let winner = trimmed.split_ascii_whitespace().nth(1).unwrap_or_default();
            Command::Host(HostCommand::Distribute(winner.to_string()))
        }
        ["advance"] => Command::Host(HostCommand::Advance),
        ["new-round"] => Command::Host(HostCommand::NewRound),
        ["dealer", seat] => Command::Host(HostCommand::Dealer(
            seat.parse()
                .map_err(|_| ParseError::InvalidSeat(seat.to_string()))?,
        )),
        ["button"] => Command::Host(HostCommand::MoveButton),
        ["status", stage] => Command::Host(HostCommand::Status(
            stage
                .parse()
                .map_err(|_| ParseError::InvalidStatus(stage.to_string()))?,
        )),
        ["start-round"] => Command::Host(HostCommand::StartRound),

        ["show"] => Command::Show,
        ["help" | "?"] => Command::Help,
        ["quit" | "exit"] => Command::Quit,
        _ => return Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    };
    Ok(command)
}

fn parse_amount(value: &str) -> Result<Chips, ParseError> {
    value
        .parse::<Chips>()
        .ok()
        .filter(|amount| *amount > 0)
        .ok_or_else(|| ParseError::InvalidAmount(value.to_string()))
}
