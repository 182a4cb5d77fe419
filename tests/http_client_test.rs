//! HTTP transport error mapping and request shape

use wiremock::matchers::{body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chp::error::ChpError;

mod common;

fn api_status(err: &anyhow::Error) -> Option<u16> {
    err.downcast_ref::<ChpError>().and_then(ChpError::status)
}

#[tokio::test]
async fn test_get_json_returns_body_and_sends_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thing"))
        .and(header("accept", "application/json"))
        .and(header("x-extra", "yes"))
        .and(header_regex("user-agent", r"^chp-cli/\d+\.\d+\.\d+"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let (config, _tmp) = common::temp_config();
    let body = common::http_client(&config)
        .get_json(&format!("{}/thing", server.uri()), &[("X-Extra", "yes")])
        .await
        .unwrap();
    assert_eq!(body, br#"{"ok":true}"#);
}

#[tokio::test]
async fn test_post_form_encodes_params() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("a=1&b=two+words"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let (config, _tmp) = common::temp_config();
    common::http_client(&config)
        .post_form(&server.uri(), &[("a", "1"), ("b", "two words")], &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_message_from_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(serde_json::json!({"error": "forbidden"})),
        )
        .mount(&server)
        .await;

    let (config, _tmp) = common::temp_config();
    let err = common::http_client(&config)
        .post_json(&server.uri(), &serde_json::json!({}), &[])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "HTTP 403: forbidden");
    assert_eq!(api_status(&err), Some(403));
}

#[tokio::test]
async fn test_error_message_from_msg_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"code": "not_found", "msg": "no such recipe"})),
        )
        .mount(&server)
        .await;

    let (config, _tmp) = common::temp_config();
    let err = common::http_client(&config)
        .get_json(&server.uri(), &[])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP 404: no such recipe");
}

#[tokio::test]
async fn test_error_message_falls_back_to_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let (config, _tmp) = common::temp_config();
    let err = common::http_client(&config)
        .get_json(&server.uri(), &[])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    assert_eq!(api_status(&err), Some(502));
}

#[tokio::test]
async fn test_connection_failure_has_no_status() {
    let (config, _tmp) = common::temp_config();
    let err = common::http_client(&config)
        .get_json("http://127.0.0.1:1/unreachable", &[])
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.starts_with("Connection failed:"), "{msg}");
    assert!(
        msg.contains("Check your network and base URL: http://127.0.0.1:1/unreachable"),
        "{msg}"
    );
    assert!(matches!(
        err.downcast_ref::<ChpError>(),
        Some(ChpError::Api { status: None, .. })
    ));
}
