// Wire protocol DTOs and conversions for the room WebSocket.
// Every message is a JSON object `{"type": <kind>, "data": <payload>}`.

use crate::domain::{
    Building, BuildingKind, Entity, EntityId, EntityKind, Health, Phase, PlayerId, PlayerInfo,
    Position, Resources, Unit, UnitKind, WorldSnapshot,
};
use crate::use_cases::{Inbound, Outbound};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    // First message after the socket opens.
    PlayerJoin(PlayerJoinPayload),
    StartGame(EmptyPayload),
    UnitSelect(UnitSelectPayload),
    UnitMove(UnitMovePayload),
    // Asks the server to broadcast the room state.
    GetGameState(EmptyPayload),
}

/// Messages the server sends to the client. The server relays every client message to the
/// whole room, so client kinds show up here too.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    GameState(GameStateDto),
    UnitSelect(UnitSelectPayload),
    PlayerJoin(IgnoredAny),
    StartGame(IgnoredAny),
    UnitMove(IgnoredAny),
    GetGameState(IgnoredAny),
}

impl ServerMessage {
    fn kind(&self) -> &'static str {
        match self {
            ServerMessage::GameState(_) => "game_state",
            ServerMessage::UnitSelect(_) => "unit_select",
            ServerMessage::PlayerJoin(_) => "player_join",
            ServerMessage::StartGame(_) => "start_game",
            ServerMessage::UnitMove(_) => "unit_move",
            ServerMessage::GetGameState(_) => "get_game_state",
        }
    }
}

/// Serializes to `{}` so empty payloads still carry a `data` object.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyPayload {}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerJoinPayload {
    pub player_id: String,
    pub name: String,
    pub civilization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSelectPayload {
    pub unit_ids: Vec<String>,
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitMovePayload {
    pub unit_id: String,
    pub target_x: f64,
    pub target_y: f64,
}

impl From<Outbound> for ClientMessage {
    fn from(outbound: Outbound) -> Self {
        match outbound {
            Outbound::Join(identity) => ClientMessage::PlayerJoin(PlayerJoinPayload {
                player_id: identity.player_id.to_string(),
                name: identity.name,
                civilization: identity.civilization.as_wire().to_string(),
            }),
            Outbound::RequestState => ClientMessage::GetGameState(EmptyPayload::default()),
            Outbound::StartGame => ClientMessage::StartGame(EmptyPayload::default()),
            Outbound::SelectUnits { unit_ids, owner } => {
                ClientMessage::UnitSelect(UnitSelectPayload {
                    unit_ids: unit_ids.iter().map(|id| id.to_string()).collect(),
                    player_id: owner.to_string(),
                })
            }
            Outbound::MoveUnit { unit_id, target } => ClientMessage::UnitMove(UnitMovePayload {
                unit_id: unit_id.to_string(),
                target_x: target.x,
                target_y: target.y,
            }),
        }
    }
}

/// Full room state as broadcast by the server.
///
/// Missing or `null` collections decode as empty, matching wholesale replacement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameStateDto {
    #[serde(default)]
    pub units: Option<HashMap<String, UnitDto>>,
    #[serde(default)]
    pub buildings: Option<HashMap<String, BuildingDto>>,
    #[serde(default)]
    pub resources: Option<HashMap<String, ResourcesDto>>,
    #[serde(default)]
    pub players: Option<HashMap<String, PlayerDto>>,
    #[serde(default)]
    // Phase tag; unrecognised values fall back to the default phase.
    pub game_state: Option<String>,
}

/// Unit as serialized by the server. Extra fields (attack, armor, speed, task, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitDto {
    pub player_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub health: i64,
    pub max_health: i64,
    #[serde(default)]
    pub target_x: Option<f64>,
    #[serde(default)]
    pub target_y: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingDto {
    pub player_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub health: i64,
    pub max_health: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcesDto {
    #[serde(default)]
    pub food: i64,
    #[serde(default)]
    pub wood: i64,
    #[serde(default)]
    pub gold: i64,
    #[serde(default)]
    pub stone: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub civilization: String,
}

fn non_negative(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

fn health(current: i64, max: i64) -> Health {
    Health::new(non_negative(current), non_negative(max))
}

impl From<ResourcesDto> for Resources {
    fn from(dto: ResourcesDto) -> Self {
        Self {
            food: non_negative(dto.food),
            wood: non_negative(dto.wood),
            gold: non_negative(dto.gold),
            stone: non_negative(dto.stone),
        }
    }
}

fn phase(tag: Option<&str>) -> Phase {
    let Some(tag) = tag else {
        return Phase::default();
    };
    Phase::from_wire(tag).unwrap_or_else(|| {
        debug!(phase = %tag, "unknown phase; using default");
        Phase::default()
    })
}

fn unit_entity(id: String, dto: UnitDto) -> Option<Entity> {
    let Some(kind) = UnitKind::from_wire(&dto.kind) else {
        debug!(unit_id = %id, kind = %dto.kind, "dropping unit of unknown kind");
        return None;
    };
    let target = match (dto.target_x, dto.target_y) {
        (Some(x), Some(y)) => Some(Position::new(x, y)),
        _ => None,
    };
    Some(Entity {
        id: EntityId::new(id),
        owner: PlayerId::new(dto.player_id),
        position: Position::new(dto.x, dto.y),
        health: health(dto.health, dto.max_health),
        kind: EntityKind::Unit(Unit { kind, target }),
    })
}

fn building_entity(id: String, dto: BuildingDto) -> Option<Entity> {
    let Some(kind) = BuildingKind::from_wire(&dto.kind) else {
        debug!(building_id = %id, kind = %dto.kind, "dropping building of unknown kind");
        return None;
    };
    Some(Entity {
        id: EntityId::new(id),
        owner: PlayerId::new(dto.player_id),
        position: Position::new(dto.x, dto.y),
        health: health(dto.health, dto.max_health),
        kind: EntityKind::Building(Building { kind }),
    })
}

impl From<GameStateDto> for WorldSnapshot {
    fn from(dto: GameStateDto) -> Self {
        // Map keys are the canonical ids.
        let units = dto
            .units
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(id, unit)| unit_entity(id, unit));
        let buildings = dto
            .buildings
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(id, building)| building_entity(id, building));

        Self {
            entities: units
                .chain(buildings)
                .map(|entity| (entity.id.clone(), entity))
                .collect(),
            resources: dto
                .resources
                .unwrap_or_default()
                .into_iter()
                .map(|(player, counters)| (PlayerId::new(player), counters.into()))
                .collect(),
            players: dto
                .players
                .unwrap_or_default()
                .into_iter()
                .map(|(player, info)| {
                    (
                        PlayerId::new(player),
                        PlayerInfo {
                            name: info.name,
                            civilization: info.civilization,
                        },
                    )
                })
                .collect(),
            phase: phase(dto.game_state.as_deref()),
        }
    }
}

impl From<ServerMessage> for Inbound {
    fn from(message: ServerMessage) -> Self {
        let kind = message.kind();
        match message {
            ServerMessage::GameState(state) => Inbound::GameState(state.into()),
            ServerMessage::UnitSelect(payload) => Inbound::SelectionEcho {
                player_id: PlayerId::new(payload.player_id),
                unit_ids: payload
                    .unit_ids
                    .into_iter()
                    .map(EntityId::new)
                    .collect::<BTreeSet<_>>(),
            },
            ServerMessage::PlayerJoin(_)
            | ServerMessage::StartGame(_)
            | ServerMessage::UnitMove(_)
            | ServerMessage::GetGameState(_) => Inbound::Ignored {
                kind: kind.to_string(),
            },
        }
    }
}

/// Reasons an inbound frame could not be turned into an [`Inbound`] message.
#[derive(Debug)]
pub enum DecodeError {
    // Well-formed envelope with a kind this client does not know.
    UnknownKind(String),
    Malformed(serde_json::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownKind(kind) => write!(f, "unknown message kind: {kind}"),
            DecodeError::Malformed(err) => write!(f, "malformed message: {err}"),
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

const KNOWN_KINDS: [&str; 6] = [
    "game_state",
    "unit_select",
    "player_join",
    "start_game",
    "unit_move",
    "get_game_state",
];

pub fn decode_server_message(text: &str) -> Result<Inbound, DecodeError> {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => Ok(message.into()),
        Err(err) => match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) if !KNOWN_KINDS.contains(&envelope.kind.as_str()) => {
                Err(DecodeError::UnknownKind(envelope.kind))
            }
            _ => Err(DecodeError::Malformed(err)),
        },
    }
}

pub fn encode_client_message(message: &ClientMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}
