// Sync Channel: connection lifecycle and message gating for one room session.

use super::types::{Inbound, JoinIdentity, Outbound};
use crate::domain::{EntityId, EntityStore, PlayerId};
use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

/// Connection lifecycle. Transitions are driven only by transport events or a local close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    // Transport handshake in progress.
    Connecting,
    // Join sent; waiting for the first snapshot.
    Joining,
    Ready,
    // Terminal.
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelState::Connecting => "connecting",
            ChannelState::Joining => "joining",
            ChannelState::Ready => "ready",
            ChannelState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// What an inbound message did once the channel accepted it.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    // The Entity Store now holds a new snapshot.
    Replaced,
    // Server-confirmed selection for some participant.
    SelectionEcho {
        player_id: PlayerId,
        unit_ids: BTreeSet<EntityId>,
    },
    Dropped,
}

pub struct SyncChannel {
    state: ChannelState,
    identity: JoinIdentity,
    // Queue to the transport writer; dropped on close so the writer shuts the socket.
    outbound_tx: Option<mpsc::Sender<Outbound>>,
    msgs_in: u64,
    msgs_out: u64,
    dropped_out: u64,
    last_outbound_full_log: Instant,
}

impl SyncChannel {
    pub fn new(identity: JoinIdentity, outbound_tx: mpsc::Sender<Outbound>) -> Self {
        Self {
            state: ChannelState::Connecting,
            identity,
            outbound_tx: Some(outbound_tx),
            msgs_in: 0,
            msgs_out: 0,
            dropped_out: 0,
            last_outbound_full_log: Instant::now() - LOG_THROTTLE,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn identity(&self) -> &JoinIdentity {
        &self.identity
    }

    /// Transport is open: announce ourselves and ask for the room state.
    pub fn on_open(&mut self) {
        if self.state != ChannelState::Connecting {
            warn!(state = %self.state, "transport open outside connecting state ignored");
            return;
        }

        self.transition(ChannelState::Joining);
        self.transmit(Outbound::Join(self.identity.clone()));
        self.transmit(Outbound::RequestState);
    }

    /// Applies an inbound message. Snapshots replace the store wholesale; the first one
    /// completes the join.
    pub fn on_message(&mut self, inbound: Inbound, store: &mut EntityStore) -> Delivery {
        match self.state {
            ChannelState::Connecting | ChannelState::Closed => {
                debug!(state = %self.state, "inbound message outside session dropped");
                return Delivery::Dropped;
            }
            ChannelState::Joining | ChannelState::Ready => {}
        }
        self.msgs_in += 1;

        match inbound {
            Inbound::GameState(snapshot) => {
                store.replace(snapshot);
                if self.state == ChannelState::Joining {
                    self.transition(ChannelState::Ready);
                }
                Delivery::Replaced
            }
            Inbound::SelectionEcho {
                player_id,
                unit_ids,
            } => {
                if self.state != ChannelState::Ready {
                    debug!("selection echo before first snapshot dropped");
                    return Delivery::Dropped;
                }
                Delivery::SelectionEcho {
                    player_id,
                    unit_ids,
                }
            }
            Inbound::Ignored { kind } => {
                debug!(%kind, "relayed message ignored");
                Delivery::Dropped
            }
        }
    }

    /// Transport closed by the peer or failed. The store keeps its last snapshot.
    pub fn on_closed(&mut self, reason: Option<&str>) {
        if self.state == ChannelState::Closed {
            return;
        }
        info!(reason = reason.unwrap_or("none"), "transport closed");
        self.shutdown();
    }

    /// Local close request.
    pub fn close(&mut self) {
        if self.state == ChannelState::Closed {
            return;
        }
        info!("closing channel");
        self.shutdown();
    }

    /// Sends a user command. Only possible while `Ready`; otherwise the command is dropped.
    pub fn send(&mut self, outbound: Outbound) -> bool {
        if self.state != ChannelState::Ready {
            debug!(state = %self.state, "command dropped; channel not ready");
            return false;
        }
        self.transmit(outbound)
    }

    /// Sends each command in order. Returns how many were handed to the transport.
    pub fn send_all(&mut self, batch: Vec<Outbound>) -> usize {
        batch
            .into_iter()
            .map(|outbound| self.send(outbound))
            .filter(|sent| *sent)
            .count()
    }

    fn shutdown(&mut self) {
        self.transition(ChannelState::Closed);
        // Dropping the sender lets the writer flush and close the socket.
        self.outbound_tx = None;
        debug!(
            msgs_in = self.msgs_in,
            msgs_out = self.msgs_out,
            dropped_out = self.dropped_out,
            "channel stats"
        );
    }

    fn transition(&mut self, next: ChannelState) {
        debug!(from = %self.state, to = %next, "channel state change");
        self.state = next;
    }

    fn transmit(&mut self, outbound: Outbound) -> bool {
        let Some(tx) = self.outbound_tx.as_ref() else {
            return false;
        };

        match tx.try_send(outbound) {
            Ok(()) => {
                self.msgs_out += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                self.dropped_out += 1;
                if self.last_outbound_full_log.elapsed() >= LOG_THROTTLE {
                    self.last_outbound_full_log = Instant::now();
                    warn!(dropped = self.dropped_out, "outbound queue full; dropping message");
                }
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("transport writer gone; dropping message");
                false
            }
        }
    }
}
