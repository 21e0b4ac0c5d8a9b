//! visor HTTP APIクライアントの結合テスト

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vpn_monitor::health::{ProbeTimings, Prober};
use vpn_monitor::visor::{RpcVisor, Visor, VpnClientError};
use vpn_monitor_common::error::MonitorError;

use crate::support::pk;

#[tokio::test]
async fn test_bootstrap_succeeds_when_visor_answers_overview() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/overview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "local_pk": pk(9).as_hex(),
        })))
        .expect(1)
        .mount(&mock)
        .await;

    RpcVisor::bootstrap(&mock.uri()).await.unwrap();
}

#[tokio::test]
async fn test_bootstrap_fails_when_visor_is_unhealthy() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/overview"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let err = RpcVisor::bootstrap(&mock.uri()).await.unwrap_err();
    assert!(matches!(err, MonitorError::Visor(_)));
}

#[tokio::test]
async fn test_open_transport_posts_dmsg_request_and_parses_id() {
    let mock = MockServer::start().await;
    let remote = pk(5);

    Mock::given(method("POST"))
        .and(path("/api/transports"))
        .and(body_json(json!({
            "remote_pk": remote.as_hex(),
            "transport_type": "dmsg",
            "timeout_secs": 10,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "3b1f1e2a",
        })))
        .mount(&mock)
        .await;

    let visor = RpcVisor::new(&mock.uri()).unwrap();
    let id = visor
        .open_transport(&remote, Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(id.to_string(), "3b1f1e2a");
}

#[tokio::test]
async fn test_open_transport_failure_is_transport_error() {
    let mock = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/transports"))
        .respond_with(ResponseTemplate::new(504))
        .mount(&mock)
        .await;

    let visor = RpcVisor::new(&mock.uri()).unwrap();
    let err = visor
        .open_transport(&pk(5), Duration::from_secs(10))
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::Transport(_)));
}

#[tokio::test]
async fn test_app_error_maps_known_strings_to_closed_enum() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/apps/vpn-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "last_error": "setup node",
        })))
        .mount(&mock)
        .await;

    let visor = RpcVisor::new(&mock.uri()).unwrap();
    let err = visor.app_error("vpn-client").await.unwrap();
    assert_eq!(err, Some(VpnClientError::SetupNode));
}

#[tokio::test]
async fn test_app_error_absent_means_no_error() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/apps/vpn-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "last_error": null,
        })))
        .mount(&mock)
        .await;

    let visor = RpcVisor::new(&mock.uri()).unwrap();
    assert_eq!(visor.app_error("vpn-client").await.unwrap(), None);
}

#[tokio::test]
async fn test_connection_summaries_parse_latency() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/apps/vpn-client/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"latency": 1500000},
        ])))
        .mount(&mock)
        .await;

    let visor = RpcVisor::new(&mock.uri()).unwrap();
    let summaries = visor.connection_summaries("vpn-client").await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].latency(), Duration::from_nanos(1_500_000));
}

/// モックvisor API越しにプローブ1周分を通す
#[tokio::test]
async fn test_full_probe_through_rpc_visor() {
    let mock = MockServer::start().await;
    let remote = pk(7);

    Mock::given(method("POST"))
        .and(path("/api/transports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "tp-7"})))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/apps/vpn-client"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/apps/vpn-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"last_error": null})))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/apps/vpn-client/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"latency": 2000000}])))
        .mount(&mock)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/transports/tp-7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock)
        .await;

    let visor = Arc::new(RpcVisor::new(&mock.uri()).unwrap());
    let prober = Prober::new(visor, ProbeTimings::zero());

    let verdict = prober.probe(&remote).await;
    assert!(verdict.is_alive());
}
