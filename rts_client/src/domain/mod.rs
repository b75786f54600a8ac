// Domain layer: world model, snapshot store and selection rules.

pub mod entities;
pub mod selection;
pub mod store;

pub use entities::{
    Building, BuildingKind, Civilization, Entity, EntityId, EntityKind, Health, Phase, PlayerId,
    PlayerInfo, Position, Resources, Unit, UnitKind, WorldSnapshot,
};
pub use selection::{Rect, SelectionRect, SelectionSet, select_in_region};
pub use store::EntityStore;
