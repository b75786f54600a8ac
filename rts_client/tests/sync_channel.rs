mod support;

use rts_client::ClientConfig;
use rts_client::domain::{Civilization, EntityId, Phase, PlayerId, Position};
use rts_client::frameworks::config::{VIEWPORT, socket_url};
use rts_client::interface_adapters::net::{NetError, run_transport};
use rts_client::use_cases::{
    ChannelState, JoinIdentity, LoopControl, Outbound, PointerButton, PointerEvent, Session,
    SessionEvent, TransportEvent,
};
use serde_json::json;
use std::time::Duration;
use support::{RoomEvent, RoomScript, scripted_input, spawn_room};
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(5);

fn identity() -> JoinIdentity {
    JoinIdentity {
        player_id: PlayerId::from("p1"),
        name: "Ada".to_string(),
        civilization: Civilization::Celts,
    }
}

fn client_config(base_url: &str) -> ClientConfig {
    let room_id = format!("test-{}", uuid::Uuid::new_v4());
    ClientConfig {
        socket_url: socket_url(base_url, &room_id).expect("socket url"),
        room_id,
        identity: identity(),
    }
}

struct Harness {
    session: Session,
    events_rx: mpsc::Receiver<SessionEvent>,
    transport: tokio::task::JoinHandle<Result<(), NetError>>,
}

// Wire the real transport to a session the test drives by hand.
fn connect(base_url: &str) -> Harness {
    let url = client_config(base_url).socket_url;
    let (events_tx, events_rx) = mpsc::channel(64);
    let (outbound_tx, outbound_rx) = mpsc::channel::<Outbound>(64);
    let transport = tokio::spawn(run_transport(url.to_string(), events_tx, outbound_rx));
    Harness {
        session: Session::new(identity(), outbound_tx, VIEWPORT),
        events_rx,
        transport,
    }
}

impl Harness {
    // Feed transport events to the session until `done` holds or the session disconnects.
    async fn pump_until(&mut self, done: impl Fn(&Session) -> bool) -> LoopControl {
        while !done(&self.session) {
            let event = tokio::time::timeout(WAIT, self.events_rx.recv())
                .await
                .expect("session event should arrive in time")
                .expect("transport should still be running");
            if self.session.handle(event) == LoopControl::Disconnect {
                return LoopControl::Disconnect;
            }
        }
        LoopControl::Continue
    }

    fn pointer(&mut self, event: PointerEvent) {
        assert_eq!(
            self.session.handle(SessionEvent::Pointer(event)),
            LoopControl::Continue
        );
    }
}

#[tokio::test]
async fn when_connected_then_join_is_sent_first_and_snapshot_makes_channel_ready() {
    let mut room = spawn_room(RoomScript {
        game_state: support::skirmish_state(),
        close_after_state: false,
    })
    .await;
    let mut harness = connect(&room.base_url);

    harness
        .pump_until(|session| session.channel_state() == ChannelState::Ready)
        .await;

    assert_eq!(
        room.next_message().await,
        json!({
            "type": "player_join",
            "data": { "player_id": "p1", "name": "Ada", "civilization": "celts" }
        })
    );
    assert_eq!(
        room.next_message().await,
        json!({ "type": "get_game_state", "data": {} })
    );

    let snapshot = harness.session.snapshot();
    assert_eq!(snapshot.phase, Phase::Playing);
    assert_eq!(snapshot.entities.len(), 4);
    assert_eq!(snapshot.resources_for(&PlayerId::from("p1")).food, 200);
    assert_eq!(snapshot.resources_for(&PlayerId::from("p2")).food, 0);
}

#[tokio::test]
async fn when_units_are_dragged_and_ordered_then_server_receives_select_and_moves() {
    let mut room = spawn_room(RoomScript {
        game_state: support::skirmish_state(),
        close_after_state: false,
    })
    .await;
    let mut harness = connect(&room.base_url);
    harness
        .pump_until(|session| session.channel_state() == ChannelState::Ready)
        .await;
    // player_join, get_game_state
    room.next_message().await;
    room.next_message().await;

    harness.pointer(PointerEvent::Down {
        at: Position::new(90.0, 90.0),
        button: PointerButton::Primary,
    });
    harness.pointer(PointerEvent::Move {
        at: Position::new(120.0, 120.0),
    });
    harness.pointer(PointerEvent::Up {
        at: Position::new(120.0, 120.0),
        button: PointerButton::Primary,
    });
    harness.pointer(PointerEvent::Down {
        at: Position::new(400.0, 300.0),
        button: PointerButton::Secondary,
    });
    harness.pointer(PointerEvent::Up {
        at: Position::new(400.0, 300.0),
        button: PointerButton::Secondary,
    });

    assert_eq!(
        room.next_message().await,
        json!({ "type": "unit_select", "data": { "unit_ids": ["u1", "u2"], "player_id": "p1" } })
    );
    let mut moved = Vec::new();
    for _ in 0..2 {
        let message = room.next_message().await;
        assert_eq!(message["type"], "unit_move");
        assert_eq!(message["data"]["target_x"], 400.0);
        assert_eq!(message["data"]["target_y"], 300.0);
        moved.push(message["data"]["unit_id"].as_str().map(str::to_string));
    }
    moved.sort();
    assert_eq!(moved, vec![Some("u1".to_string()), Some("u2".to_string())]);

    // Drain the relays (get_game_state, unit_select, two unit_move); the echoed selection
    // matches the local one.
    let expected = [EntityId::from("u1"), EntityId::from("u2")];
    for _ in 0..4 {
        let event = tokio::time::timeout(WAIT, harness.events_rx.recv())
            .await
            .expect("relay should arrive in time")
            .expect("transport should still be running");
        assert_eq!(harness.session.handle(event), LoopControl::Continue);
    }
    assert_eq!(harness.session.selection().len(), 2);
    assert!(expected.iter().all(|id| harness.session.selection().contains(id)));
    assert!(!harness.session.selection().contains(&EntityId::from("u3")));
}

#[tokio::test]
async fn when_server_closes_then_channel_is_closed_and_commands_go_nowhere() {
    let mut room = spawn_room(RoomScript {
        game_state: support::skirmish_state(),
        close_after_state: true,
    })
    .await;
    let mut harness = connect(&room.base_url);

    let control = harness
        .pump_until(|session| session.channel_state() == ChannelState::Closed)
        .await;
    assert_eq!(control, LoopControl::Disconnect);
    assert_eq!(harness.session.channel_state(), ChannelState::Closed);
    // The snapshot received before the close is kept.
    assert_eq!(harness.session.snapshot().entities.len(), 4);

    // Input after the close changes nothing on the wire.
    harness.pointer(PointerEvent::Down {
        at: Position::new(90.0, 90.0),
        button: PointerButton::Primary,
    });
    harness.pointer(PointerEvent::Up {
        at: Position::new(120.0, 120.0),
        button: PointerButton::Primary,
    });

    assert_eq!(room.next_message().await["type"], "player_join");
    assert_eq!(room.next_message().await["type"], "get_game_state");
    assert_eq!(room.next_event().await, RoomEvent::Disconnected);

    let result = tokio::time::timeout(WAIT, harness.transport)
        .await
        .expect("transport should stop")
        .expect("transport task should not panic");
    assert!(result.is_ok());
}

#[tokio::test]
async fn when_server_is_unreachable_then_session_disconnects_closed() {
    // Reserve a port and release it so nothing listens there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    drop(listener);

    let mut harness = connect(&format!("http://{addr}"));
    let control = harness
        .pump_until(|session| session.channel_state() == ChannelState::Closed)
        .await;

    assert_eq!(control, LoopControl::Disconnect);
    let result = harness.transport.await.expect("transport task should not panic");
    assert!(matches!(result, Err(NetError::Connect(_))));
}

#[tokio::test]
async fn when_client_quits_then_room_sees_the_socket_close() {
    let mut room = spawn_room(RoomScript {
        game_state: support::skirmish_state(),
        close_after_state: false,
    })
    .await;
    let (input_tx, input) = scripted_input();
    let client = tokio::spawn(rts_client::run(client_config(&room.base_url), input));

    assert_eq!(room.next_message().await["type"], "player_join");
    assert_eq!(room.next_message().await["type"], "get_game_state");

    input_tx.send("quit".to_string()).expect("write input");

    // Nothing else is sent before the socket closes.
    loop {
        match room.next_event().await {
            RoomEvent::Disconnected => break,
            RoomEvent::Received(message) => {
                panic!("unexpected message after quit: {message}")
            }
        }
    }

    let summary = tokio::time::timeout(WAIT, client)
        .await
        .expect("client should stop")
        .expect("client task should not panic")
        .expect("client run");
    assert!(summary.events >= 2);
    assert!(summary.frames >= 1);
}

#[test]
fn when_server_closes_while_input_is_idle_then_client_and_runtime_stop() {
    let (done_tx, done_rx) = std::sync::mpsc::channel();
    // Held open and silent for the whole test.
    let (input_tx, input) = scripted_input();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        let summary = runtime.block_on(async move {
            let room = spawn_room(RoomScript {
                game_state: support::skirmish_state(),
                close_after_state: true,
            })
            .await;
            rts_client::run(client_config(&room.base_url), input)
                .await
                .expect("client run")
        });
        // Runtime teardown must not wait on the input reader.
        drop(runtime);
        let _ = done_tx.send(summary);
    });

    let summary = done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("client and runtime should stop with input idle");
    assert_eq!(summary.snapshots, 1);
    drop(input_tx);
}

#[tokio::test]
async fn when_transport_event_is_failed_then_session_disconnects() {
    let (outbound_tx, _outbound_rx) = mpsc::channel::<Outbound>(4);
    let mut session = Session::new(identity(), outbound_tx, VIEWPORT);

    let control = session.handle(SessionEvent::Transport(TransportEvent::Failed(
        "reset".to_string(),
    )));

    assert_eq!(control, LoopControl::Disconnect);
    assert_eq!(session.channel_state(), ChannelState::Closed);
}
