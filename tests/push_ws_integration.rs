//! Integration tests for the push WebSocket transport.
//!
//! Each test spins up an Axum server on a random port, connects via
//! tokio-tungstenite, and exercises the real WS contract.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use mail_digest::hub::ws::push_routes;
use mail_digest::hub::{PushHub, PushUpdate};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Start the push server on a random port, return (port, hub).
async fn start_server() -> (u16, Arc<PushHub>) {
    let hub = PushHub::new();
    let app = push_routes(Arc::clone(&hub), "dashboard");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, hub)
}

fn make_update(subject: &str) -> PushUpdate {
    PushUpdate {
        date: "Mon, 1 Apr 2024 09:00:00 +0000".to_string(),
        from: "alice@example.com".to_string(),
        subject: subject.to_string(),
        message: "<ul><li>summary</li></ul>".to_string(),
        original: "<p>original text</p>".to_string(),
    }
}

/// Parse a WS text frame into a serde_json::Value.
fn parse_ws_json(msg: &Message) -> Value {
    match msg {
        Message::Text(txt) => serde_json::from_str(txt).expect("invalid JSON from server"),
        other => panic!("expected Text frame, got {other:?}"),
    }
}

/// Wait until the hub reports `expected` subscribers (registration happens
/// on the server task after the upgrade completes).
async fn wait_for_subscribers(hub: &PushHub, expected: usize) {
    timeout(TEST_TIMEOUT, async {
        while hub.subscriber_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("never reached {expected} subscribers"));
}

#[tokio::test]
async fn ws_client_receives_published_update() {
    timeout(TEST_TIMEOUT, async {
        let (port, hub) = start_server().await;

        let (mut ws, _resp) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .expect("WS connect failed");
        wait_for_subscribers(&hub, 1).await;

        hub.publish(make_update("Standup")).await;

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);

        assert_eq!(json["Subject"], "Standup");
        assert_eq!(json["From"], "alice@example.com");
        assert_eq!(json["Date"], "Mon, 1 Apr 2024 09:00:00 +0000");
        assert_eq!(json["Message"], "<ul><li>summary</li></ul>");
        assert_eq!(json["Original"], "<p>original text</p>");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn every_connected_client_receives_the_update() {
    timeout(TEST_TIMEOUT, async {
        let (port, hub) = start_server().await;

        let (mut a, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        let (mut b, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        wait_for_subscribers(&hub, 2).await;

        hub.publish(make_update("Planning")).await;

        for ws in [&mut a, &mut b] {
            let msg = ws.next().await.unwrap().unwrap();
            assert_eq!(parse_ws_json(&msg)["Subject"], "Planning");
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn disconnected_client_is_removed_and_publish_continues() {
    timeout(TEST_TIMEOUT, async {
        let (port, hub) = start_server().await;

        let (ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        let (mut survivor, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        wait_for_subscribers(&hub, 2).await;

        drop(ws);
        wait_for_subscribers(&hub, 1).await;

        // Publishing after the disconnect must not error or stall, and the
        // surviving client still gets the update.
        hub.publish(make_update("Retro")).await;
        let msg = survivor.next().await.unwrap().unwrap();
        assert_eq!(parse_ws_json(&msg)["Subject"], "Retro");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn health_reports_subscriber_count() {
    timeout(TEST_TIMEOUT, async {
        let (port, hub) = start_server().await;

        let body: Value = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["subscribers"], 0);

        let (_ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        wait_for_subscribers(&hub, 1).await;

        let body: Value = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["subscribers"], 1);
    })
    .await
    .expect("test timed out");
}
