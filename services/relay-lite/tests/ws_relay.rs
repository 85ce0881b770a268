//! WebSocket経由のエンドツーエンドテスト
//!
//! 実ソケットでサーバーを起動し、tokio-tungstenite クライアントで NIP-01 フレームを送受信する。

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use relay_lite::domain::{Event, EventTemplate, SignatureService};
use relay_lite::infrastructure::{AppState, RelayConfig, RelayInfoConfig, serve_with_listener};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start(max_events: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = RelayConfig::new("127.0.0.1".to_string(), addr.port(), max_events);
        let state = AppState::new(&config, RelayInfoConfig::default());
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            serve_with_listener(listener, state, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            addr,
            shutdown: Some(tx),
        }
    }

    async fn connect(&self) -> Client {
        let (ws, _) = connect_async(format!("ws://{}/ws", self.addr)).await.unwrap();
        ws
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

async fn recv(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// 指定時間内にフレームが届かないことを確認
async fn assert_silent(ws: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "unexpected frame: {:?}", result);
}

fn signed(kind: u64, created_at: u64, content: &str) -> Event {
    SignatureService::sign_template(
        EventTemplate {
            created_at,
            kind,
            tags: vec![],
            content: content.to_string(),
        },
        &SignatureService::generate_key(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_submit_event_is_acknowledged() {
    let server = TestServer::start(100).await;
    let mut ws = server.connect().await;
    let event = signed(1, 1_000, "hello");

    send(&mut ws, json!(["EVENT", event])).await;

    assert_eq!(recv(&mut ws).await, json!(["OK", event.id, true, ""]));
}

#[tokio::test]
async fn test_missing_sig_is_rejected() {
    let server = TestServer::start(100).await;
    let mut ws = server.connect().await;
    let mut event = serde_json::to_value(signed(1, 1_000, "hello")).unwrap();
    let id = event["id"].clone();
    event.as_object_mut().unwrap().remove("sig");

    send(&mut ws, json!(["EVENT", event])).await;

    assert_eq!(recv(&mut ws).await, json!(["OK", id, false, "invalid event"]));
}

#[tokio::test]
async fn test_req_returns_latest_backlog_then_eose() {
    let server = TestServer::start(100).await;
    let mut ws = server.connect().await;
    let a = signed(1, 100, "a");
    let b = signed(1, 200, "b");
    for event in [&a, &b] {
        send(&mut ws, json!(["EVENT", event])).await;
        recv(&mut ws).await;
    }

    send(&mut ws, json!(["REQ", "s1", {"kinds": [1], "limit": 1}])).await;

    assert_eq!(recv(&mut ws).await, json!(["EVENT", "s1", b]));
    assert_eq!(recv(&mut ws).await, json!(["EOSE", "s1"]));
}

#[tokio::test]
async fn test_live_event_reaches_other_connection() {
    let server = TestServer::start(100).await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    send(&mut bob, json!(["REQ", "feed", {"kinds": [1]}])).await;
    assert_eq!(recv(&mut bob).await, json!(["EOSE", "feed"]));

    let note = signed(1, 1_000, "hi bob");
    send(&mut alice, json!(["EVENT", note])).await;

    assert_eq!(recv(&mut alice).await, json!(["OK", note.id, true, ""]));
    assert_eq!(recv(&mut bob).await, json!(["EVENT", "feed", note]));

    // kind不一致は届かない
    let reaction = signed(7, 1_001, "+");
    send(&mut alice, json!(["EVENT", reaction])).await;
    recv(&mut alice).await;
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_close_stops_live_delivery() {
    let server = TestServer::start(100).await;
    let mut ws = server.connect().await;
    send(&mut ws, json!(["REQ", "s", {}])).await;
    recv(&mut ws).await;
    send(&mut ws, json!(["CLOSE", "s"])).await;

    let event = signed(1, 1_000, "after close");
    send(&mut ws, json!(["EVENT", event])).await;

    assert_eq!(recv(&mut ws).await, json!(["OK", event.id, true, ""]));
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let server = TestServer::start(100).await;
    let mut ws = server.connect().await;

    ws.send(Message::Text("{not json".into())).await.unwrap();
    assert_eq!(recv(&mut ws).await, json!(["NOTICE", "invalid json"]));

    send(&mut ws, json!(["AUTH", "challenge"])).await;
    assert_eq!(recv(&mut ws).await, json!(["NOTICE", "unknown type: AUTH"]));

    send(&mut ws, json!(["REQ", "s", {}])).await;
    assert_eq!(recv(&mut ws).await, json!(["EOSE", "s"]));
}

#[tokio::test]
async fn test_binary_frames_are_ignored() {
    let server = TestServer::start(100).await;
    let mut ws = server.connect().await;

    ws.send(Message::Binary(vec![1u8, 2, 3].into())).await.unwrap();
    send(&mut ws, json!(["REQ", "s", {}])).await;

    assert_eq!(recv(&mut ws).await, json!(["EOSE", "s"]));
}

#[tokio::test]
async fn test_store_evicts_oldest_beyond_capacity() {
    let server = TestServer::start(2).await;
    let mut ws = server.connect().await;
    let events: Vec<_> = (0..3).map(|n| signed(1, 100 + n, "x")).collect();
    for event in &events {
        send(&mut ws, json!(["EVENT", event])).await;
        recv(&mut ws).await;
    }

    send(&mut ws, json!(["REQ", "s", {}])).await;

    assert_eq!(recv(&mut ws).await, json!(["EVENT", "s", events[1]]));
    assert_eq!(recv(&mut ws).await, json!(["EVENT", "s", events[2]]));
    assert_eq!(recv(&mut ws).await, json!(["EOSE", "s"]));
}

#[tokio::test]
async fn test_subscriptions_do_not_survive_reconnect() {
    let server = TestServer::start(100).await;
    let mut first = server.connect().await;
    send(&mut first, json!(["REQ", "s", {}])).await;
    recv(&mut first).await;
    first.close(None).await.unwrap();
    drop(first);

    let mut second = server.connect().await;
    let event = signed(1, 1_000, "later");
    send(&mut second, json!(["EVENT", event])).await;

    // 新しい接続にはサブスクリプションがないのでOKのみ
    assert_eq!(recv(&mut second).await, json!(["OK", event.id, true, ""]));
    assert_silent(&mut second).await;
}
