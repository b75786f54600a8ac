// Scripted room server for integration tests.
// Behaves like the authoritative server: answers `get_game_state` with a fixed snapshot and
// relays every received message back to the room.
use axum::{
    // `Router` wires the single WebSocket route.
    Router,
    // Extractors for the room id, shared room state and the upgrade request.
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use serde_json::{Value, json};
use std::{
    // Blocking reads for the scripted input source.
    io::{BufReader, Cursor, Read},
    sync::{Arc, mpsc as std_mpsc},
    time::Duration,
};
use tokio::sync::mpsc;

// Upper bound for any single wait in a test.
const WAIT: Duration = Duration::from_secs(5);

// What the fake room does besides relaying.
#[derive(Clone)]
pub struct RoomScript {
    // Payload of every `game_state` reply.
    pub game_state: Value,
    // Send a close frame right after the first `game_state` reply.
    pub close_after_state: bool,
}

// Everything the fake room observed, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Received(Value),
    Disconnected,
}

struct Room {
    script: RoomScript,
    events_tx: mpsc::UnboundedSender<RoomEvent>,
}

pub struct FakeRoom {
    // `http://127.0.0.1:<port>`; the client maps it to `ws://`.
    pub base_url: String,
    events_rx: mpsc::UnboundedReceiver<RoomEvent>,
}

impl FakeRoom {
    // Wait for the next thing the room observed.
    pub async fn next_event(&mut self) -> RoomEvent {
        tokio::time::timeout(WAIT, self.events_rx.recv())
            .await
            .expect("room event should arrive in time")
            .expect("room server should still be running")
    }

    // Wait for the next message the client sent.
    pub async fn next_message(&mut self) -> Value {
        match self.next_event().await {
            RoomEvent::Received(value) => value,
            RoomEvent::Disconnected => panic!("client disconnected while a message was expected"),
        }
    }
}

// Start a room server on an ephemeral port inside the current test runtime.
pub async fn spawn_room(script: RoomScript) -> FakeRoom {
    // Bind first so the port is accepting before the client dials it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    // Capture the exact address that was assigned by the OS.
    let addr = listener.local_addr().expect("get local addr");

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let room = Arc::new(Room { script, events_tx });
    let app = Router::new()
        .route("/ws/{room_id}", get(ws_handler))
        .with_state(room);

    // Serve until the test runtime shuts down.
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake room server failed");
    });

    FakeRoom {
        base_url: format!("http://{addr}"),
        events_rx,
    }
}

// A default three-unit world: two units for `p1`, one for `p2`, one building.
pub fn skirmish_state() -> Value {
    json!({
        "game_state": "playing",
        "players": {
            "p1": { "name": "Ada", "civilization": "britons", "color": "blue" },
            "p2": { "name": "Bo", "civilization": "franks", "color": "red" }
        },
        "resources": {
            "p1": { "food": 200, "wood": 200, "gold": 100, "stone": 100 }
        },
        "units": {
            "u1": { "id": "u1", "player_id": "p1", "type": "villager", "x": 100.0, "y": 100.0,
                    "health": 25, "max_health": 25, "attack": 3, "armor": 0, "speed": 1.0,
                    "selected": false, "task": "idle" },
            "u2": { "id": "u2", "player_id": "p1", "type": "archer", "x": 110.0, "y": 110.0,
                    "health": 30, "max_health": 30 },
            "u3": { "id": "u3", "player_id": "p2", "type": "knight", "x": 115.0, "y": 115.0,
                    "health": 100, "max_health": 100 }
        },
        "buildings": {
            "b1": { "id": "b1", "player_id": "p1", "type": "town_center", "x": 40.0, "y": 40.0,
                    "health": 2400, "max_health": 2400, "armor": 0 }
        }
    })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(_room_id): Path<String>,
    State(room): State<Arc<Room>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, room))
}

async fn handle_socket(mut socket: WebSocket, room: Arc<Room>) {
    let mut state_sent = false;
    while let Some(Ok(message)) = socket.recv().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let value: Value = serde_json::from_str(text.as_str()).expect("client sent valid json");
        let is_state_request = value["type"] == "get_game_state";
        let _ = room.events_tx.send(RoomEvent::Received(value));

        // Answer state requests before relaying, like the real server does.
        if is_state_request {
            let reply = json!({ "type": "game_state", "data": room.script.game_state });
            if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
                break;
            }
            if room.script.close_after_state && !state_sent {
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: 1000,
                        reason: "match over".into(),
                    })))
                    .await;
                break;
            }
            state_sent = true;
        }

        // Relay the raw message back to the room.
        if socket.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
    let _ = room.events_tx.send(RoomEvent::Disconnected);
}

// Blocking line source for the client's input thread.
// Reads wait until the test pushes a line, and end once the test drops its sender.
pub struct ScriptedInput {
    lines: std_mpsc::Receiver<String>,
    pending: Cursor<Vec<u8>>,
}

impl Read for ScriptedInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            // Hand out what is left of the current line first.
            let read = self.pending.read(buf)?;
            if read > 0 || buf.is_empty() {
                return Ok(read);
            }
            // Block for the next line; a dropped sender reads as end of input.
            match self.lines.recv() {
                Ok(line) => self.pending = Cursor::new(format!("{line}\n").into_bytes()),
                Err(_) => return Ok(0),
            }
        }
    }
}

// Create an input source plus the sender the test types into.
pub fn scripted_input() -> (std_mpsc::Sender<String>, BufReader<ScriptedInput>) {
    let (lines_tx, lines) = std_mpsc::channel();
    let input = ScriptedInput {
        lines,
        pending: Cursor::new(Vec::new()),
    };
    (lines_tx, BufReader::new(input))
}
