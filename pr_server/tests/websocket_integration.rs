//! WebSocket feed tests against a live listener.

use futures_util::{SinkExt, StreamExt};
use poker_room::{
    InMemoryRoomRepository, NewPlayer, RoomConfig, RoomController,
    room::{HintKind, RoomEvent},
};
use pr_server::api::{AppState, create_router, websocket::ServerResponse};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const HOST: &str = "player_host00001";
const ALICE: &str = "player_alice0001";

async fn spawn_server() -> (SocketAddr, Arc<RoomController>) {
    let controller = Arc::new(RoomController::new(
        Arc::new(InMemoryRoomRepository::new()),
        RoomConfig::default(),
    ));
    let app = create_router(AppState {
        controller: controller.clone(),
        database: None,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, controller)
}

async fn room_with_alice(controller: &RoomController) -> String {
    let room_id = controller.create_room(HOST).await.unwrap().room.room_id;
    controller
        .join_room(
            &room_id,
            ALICE,
            NewPlayer {
                name: "Alice".to_string(),
                avatar: "🦊".to_string(),
                seat: 3,
                buy_in: 300,
                color: None,
            },
        )
        .await
        .unwrap();
    room_id
}

/// Next text frame, parsed as JSON
async fn next_json<S>(stream: &mut S) -> serde_json::Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_non_member_is_refused() {
    let (addr, controller) = spawn_server().await;
    let room_id = room_with_alice(&controller).await;

    let url = format!("ws://{addr}/ws/{room_id}?player_id=player_stranger1");
    assert!(connect_async(url).await.is_err());
}

#[tokio::test]
async fn test_row_updates_are_streamed() {
    let (addr, controller) = spawn_server().await;
    let room_id = room_with_alice(&controller).await;

    let url = format!("ws://{addr}/ws/{room_id}?player_id={HOST}");
    let (mut ws, _) = connect_async(url).await.unwrap();
    // Give the handler a moment to subscribe before mutating.
    tokio::time::sleep(Duration::from_millis(100)).await;

    controller.stage_bet(&room_id, ALICE, 40, None).await.unwrap();

    let event: RoomEvent = serde_json::from_value(next_json(&mut ws).await).unwrap();
    match event {
        RoomEvent::PlayerChanged { old, new } => {
            assert_eq!(old.unwrap().staged_bet, 0);
            assert_eq!(new.staged_bet, 40);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_stage_gesture_is_relayed() {
    let (addr, controller) = spawn_server().await;
    let room_id = room_with_alice(&controller).await;

    let (mut host_ws, _) = connect_async(format!("ws://{addr}/ws/{room_id}?player_id={HOST}"))
        .await
        .unwrap();
    let (mut alice_ws, _) = connect_async(format!("ws://{addr}/ws/{room_id}?player_id={ALICE}"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    alice_ws
        .send(Message::Text(
            r#"{"type":"stage_animation","amount":25,"velocity":2.0}"#.into(),
        ))
        .await
        .unwrap();

    let event: RoomEvent = serde_json::from_value(next_json(&mut host_ws).await).unwrap();
    let RoomEvent::StageAnimation { hint } = event else {
        panic!("expected a stage animation");
    };
    assert_eq!(hint.kind, HintKind::Stage);
    assert_eq!(hint.player_id, ALICE);
    assert_eq!(hint.amount, 25);
}

#[tokio::test]
async fn test_bad_message_gets_error_reply() {
    let (addr, controller) = spawn_server().await;
    let room_id = room_with_alice(&controller).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws/{room_id}?player_id={ALICE}"))
        .await
        .unwrap();
    ws.send(Message::Text(r#"{"type":"deal_cards"}"#.into()))
        .await
        .unwrap();

    let reply: ServerResponse = serde_json::from_value(next_json(&mut ws).await).unwrap();
    assert_eq!(
        reply,
        ServerResponse::Error {
            message: "Invalid message format".to_string()
        }
    );
}

#[tokio::test]
async fn test_closed_connection_releases_room_channel() {
    let (addr, controller) = spawn_server().await;
    let room_id = room_with_alice(&controller).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws/{room_id}?player_id={ALICE}"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(controller.hub().subscriber_count(&room_id).await, 1);

    ws.send(Message::Close(None)).await.unwrap();
    timeout(Duration::from_secs(2), async {
        while controller.hub().subscriber_count(&room_id).await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscriber never went away");
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The handler already dropped the channel on its way out.
    assert_eq!(controller.hub().prune().await, 0);
}
