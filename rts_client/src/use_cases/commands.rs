// Command Encoder: turns local intents into outbound protocol messages.

use super::types::Outbound;
use crate::domain::{PlayerId, Position, SelectionSet};

/// Selection announcement sent once per resolved click or drag.
pub fn announce_selection(selection: &SelectionSet, owner: &PlayerId) -> Outbound {
    Outbound::SelectUnits {
        unit_ids: selection.ids().clone(),
        owner: owner.clone(),
    }
}

/// One move order per selected unit, all towards the same target.
///
/// An empty selection yields no orders.
pub fn move_orders(selection: &SelectionSet, target: Position) -> Vec<Outbound> {
    selection
        .iter()
        .map(|unit_id| Outbound::MoveUnit {
            unit_id: unit_id.clone(),
            target,
        })
        .collect()
}
