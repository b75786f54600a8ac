// Log-backed frame presenter for headless runs.

use crate::domain::{Phase, Resources};
use crate::use_cases::{Frame, FramePresenter};
use tracing::{debug, info, trace};

#[derive(Debug, Clone, PartialEq)]
struct FrameSummary {
    phase: Phase,
    resources: Resources,
    units: usize,
    buildings: usize,
    selected: usize,
    players: usize,
}

impl FrameSummary {
    fn of(frame: &Frame) -> Self {
        Self {
            phase: frame.hud.phase,
            resources: frame.hud.resources,
            units: frame.units,
            buildings: frame.buildings,
            selected: frame.hud.selected,
            players: frame.hud.players.len(),
        }
    }
}

/// Writes frames to the tracing output: a summary at info when it changes,
/// a line per frame at debug and every draw command at trace.
#[derive(Debug, Default)]
pub struct LogPresenter {
    presented: u64,
    last: Option<FrameSummary>,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl FramePresenter for LogPresenter {
    fn present(&mut self, frame: &Frame) {
        self.presented += 1;
        let summary = FrameSummary::of(frame);

        if self.last.as_ref() != Some(&summary) {
            info!(
                phase = ?summary.phase,
                food = summary.resources.food,
                wood = summary.resources.wood,
                gold = summary.resources.gold,
                stone = summary.resources.stone,
                units = summary.units,
                buildings = summary.buildings,
                selected = summary.selected,
                players = summary.players,
                "world"
            );
            self.last = Some(summary);
        }

        debug!(
            frame = self.presented,
            commands = frame.commands.len(),
            "frame presented"
        );
        for command in &frame.commands {
            trace!(?command, "draw");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::Hud;

    fn frame(units: usize, selected: usize) -> Frame {
        Frame {
            commands: Vec::new(),
            hud: Hud {
                selected,
                ..Hud::default()
            },
            units,
            buildings: 0,
        }
    }

    #[test]
    fn when_summary_changes_then_it_is_remembered() {
        let mut presenter = LogPresenter::new();

        presenter.present(&frame(3, 0));
        presenter.present(&frame(3, 0));
        assert_eq!(presenter.last, Some(FrameSummary::of(&frame(3, 0))));

        presenter.present(&frame(3, 2));
        assert_eq!(presenter.presented(), 3);
        assert_eq!(presenter.last.as_ref().map(|s| s.selected), Some(2));
    }
}
