// Use-case level inputs/outputs for the client session loop.

use crate::domain::{Civilization, EntityId, PlayerId, Position, WorldSnapshot};
use std::collections::BTreeSet;

/// Who the local participant is, as announced in the Join message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinIdentity {
    pub player_id: PlayerId,
    pub name: String,
    pub civilization: Civilization,
}

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Join(JoinIdentity),
    // Ask the server to broadcast a fresh snapshot.
    RequestState,
    StartGame,
    SelectUnits {
        unit_ids: BTreeSet<EntityId>,
        owner: PlayerId,
    },
    MoveUnit {
        unit_id: EntityId,
        target: Position,
    },
}

/// Decoded server messages the session acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    GameState(WorldSnapshot),
    // Relay of a `unit_select` message; authoritative for the viewer's selection.
    SelectionEcho {
        player_id: PlayerId,
        unit_ids: BTreeSet<EntityId>,
    },
    // Recognized kind with no client-side effect (relayed joins, moves, ...).
    Ignored { kind: String },
}

/// Lifecycle and payload events produced by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Message(Inbound),
    Closed { reason: Option<String> },
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { at: Position, button: PointerButton },
    Move { at: Position },
    Up { at: Position, button: PointerButton },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    StartGame,
    RefreshState,
    Quit,
}

/// Everything the session loop reacts to, serialized through one queue.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Transport(TransportEvent),
    Pointer(PointerEvent),
    Command(UserCommand),
}
