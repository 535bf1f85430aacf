#![allow(clippy::unwrap_used)]
// Integration tests for `NetwatchClient` using wiremock.

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netwatch_api::{Error, NetwatchClient, WireTimestamp};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, NetwatchClient) {
    let server = MockServer::start().await;
    let client = NetwatchClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn device(ip: &str, network: &str) -> serde_json::Value {
    json!({ "ip": ip, "mac": null, "hostname": null, "ok": true, "network": network })
}

// ── Monitor tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_monitors() {
    let (server, client) = setup().await;

    let body = json!({
        "count": 2,
        "results": [
            {
                "host": "192.168.1.1", "name": "Gateway", "ok": true, "rtt_ms": 1.4,
                "raw": "64 bytes from 192.168.1.1", "timestamp": "2026-03-01T10:00:00.123456"
            },
            { "host": "8.8.8.8", "name": "Google DNS", "ok": false, "rtt_ms": null }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/monitors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let monitors = client.list_monitors().await.unwrap();

    assert_eq!(monitors.len(), 2);
    assert_eq!(monitors[0].name.as_deref(), Some("Gateway"));
    assert_eq!(monitors[0].rtt_ms, Some(1.4));
    assert_eq!(
        monitors[0].timestamp,
        Some(WireTimestamp::Iso("2026-03-01T10:00:00.123456".into()))
    );
    assert!(!monitors[1].ok);
    assert!(monitors[1].rtt_ms.is_none());
}

#[tokio::test]
async fn test_list_monitors_missing_results_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 0 })))
        .mount(&server)
        .await;

    let monitors = assert_ok!(client.list_monitors().await);
    assert!(monitors.is_empty());
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_sends_page_params() {
    let (server, client) = setup().await;

    let body = json!({
        "devices": [device("192.168.1.10", "2.4G"), device("192.168.1.11", "2.4G")],
        "total": 7,
        "page": 2,
        "per": 5
    });

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("page", "2"))
        .and(query_param("per", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let page = client.list_devices(2, 5).await.unwrap();

    assert_eq!(page.total, 7);
    assert_eq!(page.page, 2);
    assert_eq!(page.per, 5);
    assert_eq!(page.devices.len(), 2);
    assert_eq!(page.devices[1].ip, "192.168.1.11");
}

#[tokio::test]
async fn test_list_devices_raises_zero_page_to_one() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("page", "1"))
        .and(query_param("per", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "devices": [], "total": 0, "page": 1, "per": 1 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = client.list_devices(0, 0).await.unwrap();
    assert!(page.devices.is_empty());
}

#[tokio::test]
async fn test_list_all_devices_walks_pages() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [device("192.168.1.2", "2.4G"), device("192.168.1.3", "2.4G")],
            "total": 5, "page": 1, "per": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [device("192.168.2.2", "5G"), device("192.168.2.3", "5G")],
            "total": 5, "page": 2, "per": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [device("192.168.2.4", "5G")],
            "total": 5, "page": 3, "per": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let all = client.list_all_devices(2).await.unwrap();

    assert_eq!(all.len(), 5);
    assert_eq!(all[0].ip, "192.168.1.2");
    assert_eq!(all[4].ip, "192.168.2.4");
}

#[tokio::test]
async fn test_trigger_rescan() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/devices/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "started": true })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.trigger_rescan().await.unwrap());
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_carries_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitors"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let result = client.list_monitors().await;

    match result {
        Err(Error::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_devices(1, 5).await;

    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body == "<html>oops</html>"),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Bind then drop a listener so the port is closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}");
    let client = NetwatchClient::from_reqwest(&uri, reqwest::Client::new()).unwrap();

    let err = assert_err!(client.list_monitors().await);
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
}
