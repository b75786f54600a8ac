// Render Loop: builds a frame description from the snapshot and local interaction state.
// Pure function of its inputs; presenters decide how to put the commands on screen.

use crate::domain::{
    BuildingKind, Entity, EntityKind, Phase, PlayerId, PlayerInfo, Position, Rect, Resources,
    SelectionRect, SelectionSet, Unit, WorldSnapshot,
};

const SELECTION_RING_GAP: f64 = 5.0;
const UNIT_BAR_WIDTH: f64 = 16.0;
const UNIT_BAR_HEIGHT: f64 = 3.0;
const UNIT_BAR_OFFSET: f64 = 15.0;
const BUILDING_BAR_HEIGHT: f64 = 5.0;
const BUILDING_BAR_OFFSET: f64 = 10.0;
const BUILDING_LABEL_OFFSET: f64 = 15.0;

/// Drawable area and background grid spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub grid_spacing: f64,
}

/// Semantic paint; mapping to concrete colours is up to the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Grid,
    Building(BuildingKind),
    Friendly,
    Enemy,
    HealthHigh,
    HealthMid,
    HealthLow,
    SelectionRing,
    TargetLine,
    SelectionBox,
    Label,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        from: Position,
        to: Position,
        paint: Paint,
        width: f64,
    },
    FillRect {
        rect: Rect,
        paint: Paint,
    },
    StrokeRect {
        rect: Rect,
        paint: Paint,
    },
    FillCircle {
        center: Position,
        radius: f64,
        paint: Paint,
    },
    StrokeCircle {
        center: Position,
        radius: f64,
        paint: Paint,
        width: f64,
    },
    Text {
        at: Position,
        text: String,
        paint: Paint,
    },
}

/// Heads-up data drawn outside the canvas.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hud {
    pub phase: Phase,
    pub resources: Resources,
    pub selected: usize,
    // Roster sorted by player id.
    pub players: Vec<(PlayerId, PlayerInfo)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub commands: Vec<DrawCommand>,
    pub hud: Hud,
    pub units: usize,
    pub buildings: usize,
}

/// Everything one frame is computed from.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub snapshot: &'a WorldSnapshot,
    pub selection: &'a SelectionSet,
    pub drag: Option<&'a SelectionRect>,
    pub viewer: &'a PlayerId,
}

/// Health bar paint: above 60% high, above 30% mid, otherwise low.
pub fn health_paint(fraction: f64) -> Paint {
    if fraction > 0.6 {
        Paint::HealthHigh
    } else if fraction > 0.3 {
        Paint::HealthMid
    } else {
        Paint::HealthLow
    }
}

pub fn render(viewport: &Viewport, input: FrameInput<'_>) -> Frame {
    let mut frame = Frame::default();
    draw_grid(viewport, &mut frame.commands);

    // Stable draw order regardless of map iteration order.
    let mut entities: Vec<&Entity> = input.snapshot.entities.values().collect();
    entities.sort_by(|a, b| a.id.cmp(&b.id));

    // Buildings first so units stay visible on top of them.
    for entity in &entities {
        if let EntityKind::Building(building) = &entity.kind {
            draw_building(entity, building.kind, &mut frame.commands);
            frame.buildings += 1;
        }
    }
    for entity in &entities {
        match &entity.kind {
            EntityKind::Unit(unit) => {
                draw_unit(entity, unit, &input, &mut frame.commands);
                frame.units += 1;
            }
            EntityKind::Building(_) => {}
        }
    }

    if let Some(drag) = input.drag {
        frame.commands.push(DrawCommand::StrokeRect {
            rect: drag.bounds(),
            paint: Paint::SelectionBox,
        });
    }

    let mut players: Vec<(PlayerId, PlayerInfo)> = input
        .snapshot
        .players
        .iter()
        .map(|(id, info)| (id.clone(), info.clone()))
        .collect();
    players.sort_by(|a, b| a.0.cmp(&b.0));

    frame.hud = Hud {
        phase: input.snapshot.phase,
        resources: input.snapshot.resources_for(input.viewer),
        selected: input
            .selection
            .iter()
            .filter(|id| input.snapshot.entity(id).is_some())
            .count(),
        players,
    };
    frame
}

fn draw_grid(viewport: &Viewport, commands: &mut Vec<DrawCommand>) {
    if viewport.grid_spacing <= 0.0 {
        return;
    }

    let mut x = 0.0;
    while x <= viewport.width {
        commands.push(DrawCommand::Line {
            from: Position::new(x, 0.0),
            to: Position::new(x, viewport.height),
            paint: Paint::Grid,
            width: 1.0,
        });
        x += viewport.grid_spacing;
    }
    let mut y = 0.0;
    while y <= viewport.height {
        commands.push(DrawCommand::Line {
            from: Position::new(0.0, y),
            to: Position::new(viewport.width, y),
            paint: Paint::Grid,
            width: 1.0,
        });
        y += viewport.grid_spacing;
    }
}

fn draw_building(entity: &Entity, kind: BuildingKind, commands: &mut Vec<DrawCommand>) {
    let (width, height) = kind.footprint();
    let Position { x, y } = entity.position;
    let fraction = entity.health.fraction();

    commands.push(DrawCommand::FillRect {
        rect: Rect::new(x, y, width, height),
        paint: Paint::Building(kind),
    });
    commands.push(DrawCommand::FillRect {
        rect: Rect::new(
            x,
            y - BUILDING_BAR_OFFSET,
            width * fraction,
            BUILDING_BAR_HEIGHT,
        ),
        paint: health_paint(fraction),
    });
    commands.push(DrawCommand::Text {
        at: Position::new(x, y - BUILDING_LABEL_OFFSET),
        text: kind.name().to_string(),
        paint: Paint::Label,
    });
}

fn draw_unit(
    entity: &Entity,
    unit: &Unit,
    input: &FrameInput<'_>,
    commands: &mut Vec<DrawCommand>,
) {
    let center = entity.position;
    let radius = unit.kind.radius();
    let fraction = entity.health.fraction();

    commands.push(DrawCommand::FillCircle {
        center,
        radius,
        paint: if entity.is_owned_by(input.viewer) {
            Paint::Friendly
        } else {
            Paint::Enemy
        },
    });
    if input.selection.contains(&entity.id) {
        commands.push(DrawCommand::StrokeCircle {
            center,
            radius: radius + SELECTION_RING_GAP,
            paint: Paint::SelectionRing,
            width: 2.0,
        });
    }
    commands.push(DrawCommand::FillRect {
        rect: Rect::new(
            center.x - UNIT_BAR_WIDTH / 2.0,
            center.y - UNIT_BAR_OFFSET,
            UNIT_BAR_WIDTH * fraction,
            UNIT_BAR_HEIGHT,
        ),
        paint: health_paint(fraction),
    });
    if let Some(target) = unit.target {
        commands.push(DrawCommand::Line {
            from: center,
            to: target,
            paint: Paint::TargetLine,
            width: 1.0,
        });
    }
}
