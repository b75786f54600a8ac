// Line-oriented input adapter: text commands become pointer events and user commands.
//
//   down <x> <y> [primary|secondary]
//   move <x> <y>
//   up <x> <y> [primary|secondary]
//   select <x> <y> <w> <h>     drag from (x, y) to (x + w, y + h)
//   order <x> <y>              secondary click at (x, y)
//   start | refresh | quit

use crate::domain::Position;
use crate::use_cases::{PointerButton, PointerEvent, SessionEvent, UserCommand};
use std::fmt;
use std::io::BufRead;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidNumber(String),
    UnknownButton(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            InputError::MissingArgument(name) => write!(f, "missing argument: {name}"),
            InputError::InvalidNumber(value) => write!(f, "not a finite number: {value}"),
            InputError::UnknownButton(value) => write!(f, "unknown button: {value}"),
        }
    }
}

impl std::error::Error for InputError {}

/// Parses one input line. Blank lines and `#` comments yield no events.
pub fn parse_line(line: &str) -> Result<Vec<SessionEvent>, InputError> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(Vec::new());
    };
    if command.starts_with('#') {
        return Ok(Vec::new());
    }

    let events = match command.to_ascii_lowercase().as_str() {
        "down" => {
            let at = position(&mut parts)?;
            let button = button(parts.next())?;
            vec![pointer(PointerEvent::Down { at, button })]
        }
        "move" => vec![pointer(PointerEvent::Move {
            at: position(&mut parts)?,
        })],
        "up" => {
            let at = position(&mut parts)?;
            let button = button(parts.next())?;
            vec![pointer(PointerEvent::Up { at, button })]
        }
        "select" => {
            let from = position(&mut parts)?;
            let width = number(parts.next(), "width")?;
            let height = number(parts.next(), "height")?;
            let to = Position::new(from.x + width, from.y + height);
            vec![
                pointer(PointerEvent::Down {
                    at: from,
                    button: PointerButton::Primary,
                }),
                pointer(PointerEvent::Move { at: to }),
                pointer(PointerEvent::Up {
                    at: to,
                    button: PointerButton::Primary,
                }),
            ]
        }
        "order" => {
            let at = position(&mut parts)?;
            vec![
                pointer(PointerEvent::Down {
                    at,
                    button: PointerButton::Secondary,
                }),
                pointer(PointerEvent::Up {
                    at,
                    button: PointerButton::Secondary,
                }),
            ]
        }
        "start" => vec![SessionEvent::Command(UserCommand::StartGame)],
        "refresh" => vec![SessionEvent::Command(UserCommand::RefreshState)],
        "quit" | "exit" => vec![SessionEvent::Command(UserCommand::Quit)],
        _ => return Err(InputError::UnknownCommand(command.to_string())),
    };
    Ok(events)
}

/// Forwards parsed lines to the session until input ends or the session stops listening.
///
/// Blocks the calling thread on every read.
pub fn read_input_lines<R>(reader: R, events_tx: mpsc::Sender<SessionEvent>)
where
    R: BufRead,
{
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "failed to read input");
                return;
            }
        };

        match parse_line(&line) {
            Ok(events) => {
                for event in events {
                    if events_tx.blocking_send(event).is_err() {
                        return;
                    }
                }
            }
            Err(err) => warn!(error = %err, "input line ignored"),
        }
    }
    debug!("input closed");
}

fn pointer(event: PointerEvent) -> SessionEvent {
    SessionEvent::Pointer(event)
}

fn number(value: Option<&str>, name: &'static str) -> Result<f64, InputError> {
    let value = value.ok_or(InputError::MissingArgument(name))?;
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(InputError::InvalidNumber(value.to_string())),
    }
}

fn position<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Position, InputError> {
    let x = number(parts.next(), "x")?;
    let y = number(parts.next(), "y")?;
    Ok(Position::new(x, y))
}

fn button(value: Option<&str>) -> Result<PointerButton, InputError> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None | Some("primary") | Some("left") => Ok(PointerButton::Primary),
        Some("secondary") | Some("right") => Ok(PointerButton::Secondary),
        Some(other) => Err(InputError::UnknownButton(other.to_string())),
    }
}
