// Local selection state and the region filter that feeds it.

use crate::domain::entities::{EntityId, EntityKind, PlayerId, Position, WorldSnapshot};
use std::collections::BTreeSet;

/// Axis-aligned rectangle kept as its edge coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Rectangle with top-left corner `(x, y)`; negative extents are normalized.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_corners(Position::new(x, y), Position::new(x + width, y + height))
    }

    /// Builds a rectangle from any two corners. The corners' own coordinates become the edges.
    pub fn from_corners(a: Position, b: Position) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Closed-bounds containment, inclusive on all four edges.
    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

/// Drag rectangle between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub anchor: Position,
    pub current: Position,
}

impl SelectionRect {
    pub fn start(at: Position) -> Self {
        Self {
            anchor: at,
            current: at,
        }
    }

    pub fn drag_to(&mut self, to: Position) {
        self.current = to;
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_corners(self.anchor, self.current)
    }
}

/// Ids of the units the local participant currently controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<EntityId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selection. Returns true if the contents changed.
    pub fn set(&mut self, ids: BTreeSet<EntityId>) -> bool {
        if self.ids == ids {
            return false;
        }
        self.ids = ids;
        true
    }

    /// Keeps only ids that resolve to units owned by `owner`. Returns true if anything was removed.
    pub fn retain_owned_units(&mut self, snapshot: &WorldSnapshot, owner: &PlayerId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| snapshot.is_owned_unit(id, owner));
        self.ids.len() != before
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.ids.iter()
    }

    pub fn ids(&self) -> &BTreeSet<EntityId> {
        &self.ids
    }
}

/// Ids of the units owned by `owner` whose position lies inside `region`.
///
/// Buildings are never region-selectable. A zero-area region selects only units exactly on
/// its point.
pub fn select_in_region(
    snapshot: &WorldSnapshot,
    region: Rect,
    owner: &PlayerId,
) -> BTreeSet<EntityId> {
    snapshot
        .entities
        .values()
        .filter(|entity| match entity.kind {
            EntityKind::Unit(_) => entity.is_owned_by(owner) && region.contains(entity.position),
            EntityKind::Building(_) => false,
        })
        .map(|entity| entity.id.clone())
        .collect()
}
