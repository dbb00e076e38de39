//! IP discovery against a mock trace endpoint

use cfsync_core::{IpResolution, IpSource, UNKNOWN_IP_SENTINEL};
use cfsync_ip_trace::TraceIpSource;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn trace_server(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cdn-cgi/trace"))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("content-type", "text/plain")
                .set_body_string(body),
        )
        .expect(1)
        .mount(&server)
        .await;

    server
}

fn source(server: &MockServer) -> TraceIpSource {
    TraceIpSource::new(format!("{}/cdn-cgi/trace", server.uri()))
}

#[tokio::test]
async fn resolves_ip_line() {
    let server = trace_server(200, "fl=1\nip=203.0.113.5\nloc=XX\n").await;

    let resolution = source(&server).resolve().await;
    assert_eq!(resolution, IpResolution::Known("203.0.113.5".to_string()));
}

#[tokio::test]
async fn missing_ip_line_is_unknown() {
    let server = trace_server(200, "warp=off").await;

    let resolution = source(&server).resolve().await;
    assert!(!resolution.is_known());
    assert_eq!(resolution.as_str(), UNKNOWN_IP_SENTINEL);
    match resolution {
        IpResolution::Unknown { reason } => assert!(reason.contains("ip=")),
        other => panic!("expected unknown, got {:?}", other),
    }
}

#[tokio::test]
async fn error_status_is_unknown() {
    let server = trace_server(503, "ip=203.0.113.5").await;

    let resolution = source(&server).resolve().await;
    match resolution {
        IpResolution::Unknown { reason } => assert!(reason.contains("503")),
        other => panic!("expected unknown, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_unknown() {
    let source = TraceIpSource::new("http://127.0.0.1:1/cdn-cgi/trace");

    let resolution = source.resolve().await;
    assert_eq!(resolution.to_string(), "Unknown IP");
}
