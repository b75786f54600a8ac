// WebSocket transport for the room channel.
// Owns the socket; turns frames into session events and drains the outbound queue.

use crate::interface_adapters::protocol::{
    ClientMessage, DecodeError, decode_server_message, encode_client_message,
};
use crate::use_cases::{Outbound, SessionEvent, TransportEvent};

use futures_util::{SinkExt, StreamExt};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum NetError {
    // Handshake with the server failed.
    Connect(tungstenite::Error),
    Ws(tungstenite::Error),
    Serialization(serde_json::Error),
    // The session loop stopped listening.
    EventsClosed,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Connect(err) => write!(f, "connect failed: {err}"),
            NetError::Ws(err) => write!(f, "websocket error: {err}"),
            NetError::Serialization(err) => write!(f, "failed to serialize message: {err}"),
            NetError::EventsClosed => write!(f, "session event queue closed"),
        }
    }
}

impl std::error::Error for NetError {}

enum LoopControl {
    Continue,
    // Server sent a close frame.
    Closed(Option<String>),
}

#[derive(Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    unknown_kinds: u32,
}

/// Connects to `url` and runs the socket until either side closes.
///
/// Every outcome is reported to the session as a [`TransportEvent`]; the returned error is
/// only for the caller's logs.
pub async fn run_transport(
    url: String,
    events_tx: mpsc::Sender<SessionEvent>,
    mut outbound_rx: mpsc::Receiver<Outbound>,
) -> Result<(), NetError> {
    debug!(%url, "connecting");
    let socket = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(err) => {
            warn!(%url, error = %err, "websocket handshake failed");
            let _ = events_tx
                .send(transport(TransportEvent::Failed(err.to_string())))
                .await;
            return Err(NetError::Connect(err));
        }
    };
    info!(%url, "connected");
    send_event(&events_tx, TransportEvent::Opened).await?;

    let (mut write, mut read) = socket.split();
    let mut stats = ConnStats::default();
    let mut last_invalid_log = Instant::now() - LOG_THROTTLE;
    let mut fatal: Option<NetError> = None;
    let mut closed_event: Option<TransportEvent> = None;

    loop {
        let disconnect = tokio::select! {
            // Incoming frame from the server
            incoming = read.next() => {
                match incoming {
                    Some(Ok(message)) => {
                        match handle_incoming(message, &events_tx, &mut stats, &mut last_invalid_log).await {
                            Ok(LoopControl::Continue) => false,
                            Ok(LoopControl::Closed(reason)) => {
                                closed_event = Some(TransportEvent::Closed { reason });
                                true
                            }
                            Err(err) => {
                                fatal = Some(err);
                                true
                            }
                        }
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "websocket recv error");
                        closed_event = Some(TransportEvent::Failed(err.to_string()));
                        fatal = Some(NetError::Ws(err));
                        true
                    }
                    None => {
                        info!("websocket closed by server");
                        closed_event = Some(TransportEvent::Closed { reason: None });
                        true
                    }
                }
            }

            // Outgoing command from the session
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(outbound) => {
                        match send_outbound(&mut write, outbound, &mut stats).await {
                            Ok(()) => false,
                            Err(err) => {
                                warn!(error = %err, "failed to send message");
                                closed_event = Some(TransportEvent::Failed(err.to_string()));
                                fatal = Some(err);
                                true
                            }
                        }
                    }
                    None => {
                        // The channel dropped its sender: local close.
                        debug!("outbound queue closed; closing socket");
                        if let Err(err) = write.send(Message::Close(None)).await {
                            debug!(error = %err, "close frame not sent");
                        }
                        true
                    }
                }
            }
        };

        if disconnect {
            break;
        }
    }

    if let Err(err) = write.close().await {
        debug!(error = %err, "socket close error");
    }

    debug!(
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        unknown_kinds = stats.unknown_kinds,
        "connection stats"
    );

    if let Some(event) = closed_event {
        // The session may already be gone after a local close.
        let _ = events_tx.send(transport(event)).await;
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn transport(event: TransportEvent) -> SessionEvent {
    SessionEvent::Transport(event)
}

async fn send_event(
    events_tx: &mpsc::Sender<SessionEvent>,
    event: TransportEvent,
) -> Result<(), NetError> {
    events_tx
        .send(transport(event))
        .await
        .map_err(|_| NetError::EventsClosed)
}

async fn handle_incoming(
    message: Message,
    events_tx: &mpsc::Sender<SessionEvent>,
    stats: &mut ConnStats,
    last_invalid_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match message {
        Message::Text(text) => {
            stats.msgs_in += 1;
            stats.bytes_in += text.len() as u64;

            match decode_server_message(text.as_str()) {
                Ok(inbound) => {
                    send_event(events_tx, TransportEvent::Message(inbound)).await?;
                }
                Err(DecodeError::UnknownKind(kind)) => {
                    stats.unknown_kinds += 1;
                    debug!(%kind, "unknown message kind ignored");
                }
                Err(err @ DecodeError::Malformed(_)) => {
                    stats.invalid_json += 1;
                    if should_log(last_invalid_log) {
                        warn!(
                            bytes = text.len(),
                            invalid = stats.invalid_json,
                            error = %err,
                            "failed to parse server message"
                        );
                    }
                }
            }
            Ok(LoopControl::Continue)
        }
        Message::Binary(bytes) => {
            debug!(bytes = bytes.len(), "binary frame ignored");
            Ok(LoopControl::Continue)
        }
        // Pongs are queued by tungstenite itself.
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(LoopControl::Continue),
        Message::Close(frame) => {
            let reason = frame.map(|frame| String::from(&*frame.reason));
            info!(reason = reason.as_deref().unwrap_or("none"), "server sent close");
            Ok(LoopControl::Closed(reason))
        }
    }
}

async fn send_outbound<S>(
    write: &mut S,
    outbound: Outbound,
    stats: &mut ConnStats,
) -> Result<(), NetError>
where
    S: futures_util::Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let message = ClientMessage::from(outbound);
    let text = encode_client_message(&message).map_err(NetError::Serialization)?;
    let bytes = text.len();
    write
        .send(Message::text(text))
        .await
        .map_err(NetError::Ws)?;
    stats.msgs_out += 1;
    stats.bytes_out += bytes as u64;
    Ok(())
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}
