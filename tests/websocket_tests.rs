//! Integration tests for the websocket transport against a fake gateway

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

use poker_realtime::protocol::{FrameMethod, OutboundFrame, PushEvent, RpcCall, RpcResponse};
use poker_realtime::{ClientConfig, RpcError, Session, Story, Transport, TransportConfig};

const WAIT: Duration = Duration::from_secs(5);

struct Accepted {
    socket: WebSocket,
    params: HashMap<String, String>,
}

type Connections = mpsc::UnboundedReceiver<Accepted>;

async fn upgrade(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    State(accepted): State<mpsc::UnboundedSender<Accepted>>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let _ = accepted.send(Accepted { socket, params });
    })
}

/// Start a gateway on an ephemeral port; returns its ws url and accepted sockets
async fn start_gateway() -> (String, Connections) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route("/ws", get(upgrade)).with_state(tx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("ws://{addr}/ws"), rx)
}

async fn accept(connections: &mut Connections) -> Accepted {
    timeout(WAIT, connections.recv()).await.unwrap().unwrap()
}

async fn next_frame(socket: &mut WebSocket) -> OutboundFrame {
    loop {
        let message = timeout(WAIT, socket.recv()).await.unwrap().unwrap().unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send_json(socket: &mut WebSocket, value: impl serde::Serialize) {
    let text = serde_json::to_string(&value).unwrap();
    socket.send(Message::Text(text)).await.unwrap();
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

fn fast_reconnect() -> TransportConfig {
    TransportConfig::default().with_reconnect_delay(Duration::from_millis(50))
}

#[tokio::test]
async fn test_rpc_round_trip() {
    let (url, mut connections) = start_gateway().await;
    let transport = Transport::websocket(TransportConfig::default());
    transport.init(url);
    let mut gateway = accept(&mut connections).await;
    timeout(WAIT, transport.until_connected()).await.unwrap();

    let caller = transport.clone();
    let call = tokio::spawn(async move {
        caller
            .send_and_wait(RpcCall::new("story_service", "retrieve", json!({"entity_id": "s1"})))
            .await
    });

    let frame = next_frame(&mut gateway.socket).await;
    assert_eq!(frame.correlation_id, "gateway_service");
    assert_eq!(frame.method, FrameMethod::Request);
    let request = frame.rpc_request().unwrap();
    assert_eq!(request.service, "story_service");

    let story = Story::new("s1", "p1", "Login");
    let response = RpcResponse::ok(&request.transaction_id, serde_json::to_value(&story).unwrap())
        .for_call("story_service", "retrieve");
    send_json(&mut gateway.socket, response.into_frame()).await;

    let response = timeout(WAIT, call).await.unwrap().unwrap().unwrap();
    assert!(response.success);
    assert_eq!(response.result["name"], "Login");
}

#[tokio::test]
async fn test_rejected_rpc_surfaces_server_error() {
    let (url, mut connections) = start_gateway().await;
    let transport = Transport::websocket(TransportConfig::default());
    transport.init(url);
    let mut gateway = accept(&mut connections).await;
    timeout(WAIT, transport.until_connected()).await.unwrap();

    let caller = transport.clone();
    let call = tokio::spawn(async move {
        caller
            .send_and_wait(RpcCall::new("poker_service", "delete", json!({"entity_id": "p1"})))
            .await
    });
    let request = next_frame(&mut gateway.socket).await.rpc_request().unwrap();
    send_json(
        &mut gateway.socket,
        RpcResponse::failure(&request.transaction_id, json!("not allowed")).into_frame(),
    )
    .await;

    let err = timeout(WAIT, call).await.unwrap().unwrap().unwrap_err();
    assert!(matches!(err, RpcError::Rejected(_)));
}

#[tokio::test]
async fn test_push_events_reach_session() {
    let (url, mut connections) = start_gateway().await;
    let transport = Transport::websocket(TransportConfig::default());
    let session = Session::new(&transport);
    transport.init(url);
    let mut gateway = accept(&mut connections).await;
    timeout(WAIT, transport.until_connected()).await.unwrap();

    let story = Story::new("s1", "p1", "Login");
    send_json(
        &mut gateway.socket,
        PushEvent::new("story_created", serde_json::to_value(&story).unwrap()).into_frame(),
    )
    .await;
    send_json(
        &mut gateway.socket,
        PushEvent::new("poker_selected_story", serde_json::to_value(&story).unwrap()).into_frame(),
    )
    .await;

    let stories = session.stories.clone();
    wait_until(move || stories.active_story().get().is_some()).await;
    assert_eq!(session.stories.snapshot().len(), 1);

    let frame = next_frame(&mut gateway.socket).await;
    assert_eq!(frame.method, FrameMethod::Subscribe);
    assert_eq!(frame.channel(), Some("story:s1"));
}

#[tokio::test]
async fn test_token_is_sent_as_query_parameter() {
    let (url, mut connections) = start_gateway().await;
    let config = ClientConfig {
        gateway_url: url,
        ..ClientConfig::default()
    }
    .with_token("s3cr3t token");
    let transport = Transport::websocket(config.transport());
    transport.init(config.connection_url());

    let gateway = accept(&mut connections).await;
    assert_eq!(gateway.params.get("token").map(String::as_str), Some("s3cr3t token"));
}

#[tokio::test]
async fn test_unclean_close_reconnects() {
    let (url, mut connections) = start_gateway().await;
    let transport = Transport::websocket(fast_reconnect());
    transport.init(url);
    let first = accept(&mut connections).await;
    timeout(WAIT, transport.until_connected()).await.unwrap();

    // Dropping the socket ends the TCP stream without a close handshake
    drop(first);

    let _second = accept(&mut connections).await;
    let watched = transport.clone();
    wait_until(move || watched.is_connected()).await;
}

#[tokio::test]
async fn test_clean_close_does_not_reconnect() {
    let (url, mut connections) = start_gateway().await;
    let transport = Transport::websocket(fast_reconnect());
    transport.init(url);
    let mut gateway = accept(&mut connections).await;
    timeout(WAIT, transport.until_connected()).await.unwrap();

    gateway
        .socket
        .send(Message::Close(Some(CloseFrame {
            code: 1000,
            reason: "bye".into(),
        })))
        .await
        .unwrap();

    let watched = transport.clone();
    wait_until(move || !watched.is_connected()).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(connections.try_recv().is_err());
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_client_close_sends_close_frame() {
    let (url, mut connections) = start_gateway().await;
    let transport = Transport::websocket(fast_reconnect());
    transport.init(url);
    let mut gateway = accept(&mut connections).await;
    timeout(WAIT, transport.until_connected()).await.unwrap();

    transport.close();

    let closed = timeout(WAIT, async {
        loop {
            match gateway.socket.recv().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(connections.try_recv().is_err());
}
