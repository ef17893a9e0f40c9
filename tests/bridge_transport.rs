//! End-to-end checks of the reqwest transport against a canned HTTP bridge.

use smartfeed_driver::bridge::{BridgeClient, ReqwestTransport};
use smartfeed_driver::config::DriverConfig;
use smartfeed_driver::device::{Device, DevicePreferences, DeviceStateStore, SwitchState};
use smartfeed_driver::driver::{DeviceLifecycle, FeederDriver, TokioScheduler};
use smartfeed_driver::error::BridgeError;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Serve `responses` in order, one per connection, reporting each request line.
async fn serve(responses: Vec<(u16, &'static str)>) -> (u16, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let request = String::from_utf8_lossy(&request);
            let request_line = request.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(request_line);

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });

    (port, rx)
}

fn device_on(port: u16) -> Device {
    Device::new("smartfeed_0001", "Kitchen Feeder").with_preferences(DevicePreferences {
        bridge_host: Some("127.0.0.1".to_string()),
        bridge_port: Some(port),
        portions: Some(2),
    })
}

fn client() -> BridgeClient {
    let transport = ReqwestTransport::new(Some(Duration::from_secs(5))).unwrap();
    BridgeClient::new(Arc::new(transport))
}

#[tokio::test]
async fn test_fetch_status_over_http() {
    let (port, mut requests) = serve(vec![(
        200,
        r#"{"battery": 5.25, "connected": true, "food_low": false, "food_level": 40.0}"#,
    )])
    .await;

    let payload = client().fetch_status(&device_on(port)).await.unwrap();

    assert_eq!(payload.battery, Some(5.25));
    assert_eq!(payload.connected, Some(true));
    assert_eq!(payload.food_level, Some(40.0));
    assert_eq!(
        requests.recv().await.unwrap(),
        "GET /status/smartfeed_0001 HTTP/1.1"
    );
}

#[tokio::test]
async fn test_feed_over_http() {
    let (port, mut requests) = serve(vec![(200, r#"{"status": "success"}"#)]).await;

    let result = client().trigger_feed(&device_on(port), 2).await.unwrap();

    assert!(result.is_success());
    assert_eq!(
        requests.recv().await.unwrap(),
        "POST /feed/smartfeed_0001?portions=2 HTTP/1.1"
    );
}

#[tokio::test]
async fn test_http_500_is_failure() {
    let (port, _requests) = serve(vec![(500, r#"{"error": "token expired"}"#)]).await;

    let err = client().fetch_status(&device_on(port)).await.unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert_eq!(
        err.url(),
        format!("http://127.0.0.1:{}/status/smartfeed_0001", port)
    );
}

#[tokio::test]
async fn test_connection_refused_is_failure() {
    // Grab a free port, then close it again.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = client().fetch_status(&device_on(port)).await.unwrap_err();

    assert!(matches!(err, BridgeError::Connect { .. }), "{err:?}");
    assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn test_health_over_http() {
    let (port, mut requests) = serve(vec![(200, r#"{"status": "healthy"}"#)]).await;
    let prefs = DevicePreferences {
        bridge_port: Some(port),
        ..Default::default()
    };

    let health = client().health(&prefs).await.unwrap();

    assert!(health.is_healthy());
    assert_eq!(requests.recv().await.unwrap(), "GET /health HTTP/1.1");
}

#[tokio::test]
async fn test_lifecycle_against_bridge() {
    let (port, _requests) = serve(vec![
        // do_configure
        (200, r#"{"connected": true}"#),
        // init refresh
        (200, r#"{"battery": 6.0, "connected": true, "food_low": true}"#),
        // feed
        (200, r#"{"status": "success"}"#),
    ])
    .await;

    let store = Arc::new(DeviceStateStore::new());
    let scheduler = Arc::new(TokioScheduler::new());
    let driver = FeederDriver::new(
        client(),
        store.clone(),
        scheduler.clone(),
        DriverConfig::default(),
    );
    let lifecycle = DeviceLifecycle::new(driver);
    let device = device_on(port);

    assert!(lifecycle.do_configure(&device).await);
    lifecycle.added(&device).await;

    let state = store.get("smartfeed_0001").unwrap();
    assert_eq!(state.battery, Some(100));
    assert_eq!(state.online, Some(true));
    assert_eq!(state.switch, Some(SwitchState::Off));

    let outcome = lifecycle.driver().feed(&device).await;
    assert!(outcome.is_dispensed());
    assert_eq!(
        store.get("smartfeed_0001").unwrap().switch,
        Some(SwitchState::On)
    );

    // Recurring poll plus the two feed follow-ups.
    assert_eq!(scheduler.pending("smartfeed_0001"), 3);
    lifecycle.removed(&device);
    assert_eq!(scheduler.pending("smartfeed_0001"), 0);
    assert!(!lifecycle.is_active(&device));
}
