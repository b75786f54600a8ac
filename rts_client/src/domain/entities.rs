// Domain-level world model: entities, per-participant counters and the snapshot that owns them.

use std::collections::HashMap;
use std::fmt;

/// Opaque entity identifier, unique within a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a participant in the match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Continuous 2D coordinate in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current and maximum hit points. `current <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    current: u32,
    max: u32,
}

impl Health {
    /// Builds a health value, clamping `current` into `0..=max`.
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Remaining health as a fraction in `0.0..=1.0`; zero when `max` is zero.
    pub fn fraction(&self) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f64 / self.max as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Villager,
    Archer,
    Knight,
    Spearman,
}

impl UnitKind {
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "villager" => Some(Self::Villager),
            "archer" => Some(Self::Archer),
            "knight" => Some(Self::Knight),
            "spearman" => Some(Self::Spearman),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Villager => "Villager",
            Self::Archer => "Archer",
            Self::Knight => "Knight",
            Self::Spearman => "Spearman",
        }
    }

    /// Drawn radius of the unit disc.
    pub fn radius(&self) -> f64 {
        match self {
            Self::Knight => 10.0,
            Self::Villager | Self::Archer | Self::Spearman => 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildingKind {
    TownCenter,
    Barracks,
    ArcheryRange,
    Stable,
}

impl BuildingKind {
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "town_center" => Some(Self::TownCenter),
            "barracks" => Some(Self::Barracks),
            "archery_range" => Some(Self::ArcheryRange),
            "stable" => Some(Self::Stable),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TownCenter => "Town Center",
            Self::Barracks => "Barracks",
            Self::ArcheryRange => "Archery Range",
            Self::Stable => "Stable",
        }
    }

    /// Fixed footprint as `(width, height)`.
    pub fn footprint(&self) -> (f64, f64) {
        match self {
            Self::TownCenter => (60.0, 60.0),
            Self::Barracks | Self::ArcheryRange | Self::Stable => (40.0, 40.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub kind: UnitKind,
    // Pending move destination, if the server reports one.
    pub target: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub kind: BuildingKind,
}

/// Closed set of entity variants; every render and selection site matches exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Unit(Unit),
    Building(Building),
}

/// A unit or building as last reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub owner: PlayerId,
    pub position: Position,
    pub health: Health,
    pub kind: EntityKind,
}

impl Entity {
    pub fn as_unit(&self) -> Option<&Unit> {
        match &self.kind {
            EntityKind::Unit(unit) => Some(unit),
            EntityKind::Building(_) => None,
        }
    }

    pub fn is_owned_by(&self, owner: &PlayerId) -> bool {
        &self.owner == owner
    }
}

/// Per-participant resource counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resources {
    pub food: u32,
    pub wood: u32,
    pub gold: u32,
    pub stone: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Civilization {
    Britons,
    Franks,
    Goths,
    Celts,
    Vikings,
    Teutons,
}

impl Civilization {
    pub const ALL: [Civilization; 6] = [
        Self::Britons,
        Self::Franks,
        Self::Goths,
        Self::Celts,
        Self::Vikings,
        Self::Teutons,
    ];

    pub fn from_wire(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|civ| civ.as_wire() == value)
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Britons => "britons",
            Self::Franks => "franks",
            Self::Goths => "goths",
            Self::Celts => "celts",
            Self::Vikings => "vikings",
            Self::Teutons => "teutons",
        }
    }
}

/// Lobby roster entry. Civilization is kept as reported, the server may use values outside
/// the client's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub name: String,
    pub civilization: String,
}

/// Coarse match phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Lobby,
    Playing,
    Finished,
}

impl Phase {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "lobby" => Some(Self::Lobby),
            "playing" => Some(Self::Playing),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

/// Complete world state at one instant. Never patched in place; a newer snapshot replaces it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorldSnapshot {
    pub entities: HashMap<EntityId, Entity>,
    pub resources: HashMap<PlayerId, Resources>,
    pub players: HashMap<PlayerId, PlayerInfo>,
    pub phase: Phase,
}

impl WorldSnapshot {
    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn units(&self) -> impl Iterator<Item = (&Entity, &Unit)> {
        self.entities
            .values()
            .filter_map(|entity| entity.as_unit().map(|unit| (entity, unit)))
    }

    /// Counters for `player`; all zeros when the snapshot carries none.
    pub fn resources_for(&self, player: &PlayerId) -> Resources {
        self.resources.get(player).copied().unwrap_or_default()
    }

    /// True if `id` names a unit owned by `owner` in this snapshot.
    pub fn is_owned_unit(&self, id: &EntityId, owner: &PlayerId) -> bool {
        self.entities
            .get(id)
            .is_some_and(|entity| entity.as_unit().is_some() && entity.is_owned_by(owner))
    }
}
