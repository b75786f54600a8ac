// Client session: the single event loop that owns the store and the local selection.
// Transport events, pointer input and user commands are applied one at a time.

use super::channel::{ChannelState, Delivery, SyncChannel};
use super::commands::{announce_selection, move_orders};
use super::render::{Frame, FrameInput, Viewport, render};
use super::types::{
    JoinIdentity, Outbound, PointerButton, PointerEvent, SessionEvent, TransportEvent, UserCommand,
};
use crate::domain::{
    EntityId, EntityStore, PlayerId, Position, SelectionRect, SelectionSet, WorldSnapshot,
    select_in_region,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Output port for finished frames.
pub trait FramePresenter {
    fn present(&mut self, frame: &Frame);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Disconnect,
}

/// Counters reported when the session loop exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub events: u64,
    pub frames: u64,
    pub snapshots: u64,
}

pub struct Session {
    viewer: PlayerId,
    viewport: Viewport,
    channel: SyncChannel,
    store: EntityStore,
    selection: SelectionSet,
    drag: Option<SelectionRect>,
    // Snapshots actually applied to the store.
    snapshots: u64,
    // Set whenever the snapshot, selection or drag rectangle changes.
    dirty: bool,
}

impl Session {
    pub fn new(
        identity: JoinIdentity,
        outbound_tx: mpsc::Sender<Outbound>,
        viewport: Viewport,
    ) -> Self {
        Self {
            viewer: identity.player_id.clone(),
            viewport,
            channel: SyncChannel::new(identity, outbound_tx),
            store: EntityStore::new(),
            selection: SelectionSet::new(),
            drag: None,
            snapshots: 0,
            dirty: true,
        }
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        self.store.get()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn drag(&self) -> Option<&SelectionRect> {
        self.drag.as_ref()
    }

    pub fn handle(&mut self, event: SessionEvent) -> LoopControl {
        match event {
            SessionEvent::Transport(event) => self.handle_transport(event),
            SessionEvent::Pointer(event) => {
                self.handle_pointer(event);
                LoopControl::Continue
            }
            SessionEvent::Command(command) => self.handle_command(command),
        }
    }

    /// Current frame, computed from the state as it is now.
    pub fn frame(&self) -> Frame {
        let snapshot = self.store.get();
        render(
            &self.viewport,
            FrameInput {
                snapshot: &snapshot,
                selection: &self.selection,
                drag: self.drag.as_ref(),
                viewer: &self.viewer,
            },
        )
    }

    /// Returns a frame only if something visible changed since the last call.
    pub fn take_frame(&mut self) -> Option<Frame> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.frame())
    }

    /// Drives the session until the channel closes or every event source is gone.
    pub async fn run(
        mut self,
        mut events_rx: mpsc::Receiver<SessionEvent>,
        presenter: &mut impl FramePresenter,
    ) -> SessionSummary {
        let mut summary = SessionSummary::default();
        if let Some(frame) = self.take_frame() {
            presenter.present(&frame);
            summary.frames += 1;
        }

        loop {
            let Some(event) = events_rx.recv().await else {
                debug!("event sources closed");
                self.channel.close();
                break;
            };
            summary.events += 1;

            let control = self.handle(event);
            if let Some(frame) = self.take_frame() {
                presenter.present(&frame);
                summary.frames += 1;
            }
            if control == LoopControl::Disconnect {
                break;
            }
        }

        summary.snapshots = self.snapshots;
        info!(
            events = summary.events,
            frames = summary.frames,
            snapshots = summary.snapshots,
            "session ended"
        );
        summary
    }

    fn handle_transport(&mut self, event: TransportEvent) -> LoopControl {
        match event {
            TransportEvent::Opened => {
                self.channel.on_open();
                LoopControl::Continue
            }
            TransportEvent::Message(inbound) => {
                match self.channel.on_message(inbound, &mut self.store) {
                    Delivery::Replaced => {
                        self.snapshots += 1;
                        let snapshot = self.store.get();
                        if self.selection.retain_owned_units(&snapshot, &self.viewer) {
                            debug!(
                                remaining = self.selection.len(),
                                "pruned stale selection ids"
                            );
                        }
                        self.dirty = true;
                    }
                    Delivery::SelectionEcho {
                        player_id,
                        unit_ids,
                    } => self.apply_selection_echo(player_id, unit_ids),
                    Delivery::Dropped => {}
                }
                LoopControl::Continue
            }
            TransportEvent::Closed { reason } => {
                self.channel.on_closed(reason.as_deref());
                LoopControl::Disconnect
            }
            TransportEvent::Failed(reason) => {
                warn!(%reason, "transport failed");
                self.channel.on_closed(Some(&reason));
                LoopControl::Disconnect
            }
        }
    }

    fn apply_selection_echo(&mut self, player_id: PlayerId, unit_ids: BTreeSet<EntityId>) {
        if player_id != self.viewer {
            return;
        }
        let snapshot = self.store.get();
        let confirmed: BTreeSet<EntityId> = unit_ids
            .into_iter()
            .filter(|id| snapshot.is_owned_unit(id, &self.viewer))
            .collect();
        if self.selection.set(confirmed) {
            debug!(selected = self.selection.len(), "selection replaced by server echo");
            self.dirty = true;
        }
    }

    fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                at,
                button: PointerButton::Primary,
            } => {
                self.drag = Some(SelectionRect::start(at));
                self.dirty = true;
            }
            PointerEvent::Down {
                button: PointerButton::Secondary,
                ..
            } => {}
            PointerEvent::Move { at } => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.drag_to(at);
                    self.dirty = true;
                }
            }
            PointerEvent::Up {
                at,
                button: PointerButton::Primary,
            } => self.finish_drag(at),
            PointerEvent::Up {
                at,
                button: PointerButton::Secondary,
            } => self.order_move(at),
        }
    }

    fn finish_drag(&mut self, at: Position) {
        let Some(mut drag) = self.drag.take() else {
            return;
        };
        drag.drag_to(at);
        self.dirty = true;

        let snapshot = self.store.get();
        let ids = select_in_region(&snapshot, drag.bounds(), &self.viewer);
        self.selection.set(ids);
        debug!(selected = self.selection.len(), "selection resolved");

        self.channel
            .send(announce_selection(&self.selection, &self.viewer));
    }

    fn order_move(&mut self, target: Position) {
        let orders = move_orders(&self.selection, target);
        if orders.is_empty() {
            return;
        }
        let sent = self.channel.send_all(orders);
        debug!(sent, x = target.x, y = target.y, "move orders issued");
    }

    fn handle_command(&mut self, command: UserCommand) -> LoopControl {
        match command {
            UserCommand::StartGame => {
                self.channel.send(Outbound::StartGame);
                LoopControl::Continue
            }
            UserCommand::RefreshState => {
                self.channel.send(Outbound::RequestState);
                LoopControl::Continue
            }
            UserCommand::Quit => {
                self.channel.close();
                LoopControl::Disconnect
            }
        }
    }
}
