//! Local redirect listener on the fixed callback port
//!
//! These tests bind 127.0.0.1:9876 and therefore run serially.

use serial_test::serial;

use chp::auth::{CallbackServer, REDIRECT_URI};

#[tokio::test]
#[serial]
async fn test_callback_delivers_code_and_state() {
    let (rx, server) = CallbackServer::start().await.expect("bind callback port");

    let resp = reqwest::get(format!("{REDIRECT_URI}?code=abc&state=xyz"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Logged in!"), "{body}");

    let result = rx.recv().await.unwrap();
    assert_eq!(result.code, "abc");
    assert_eq!(result.state, "xyz");

    server.shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_callback_reports_authorization_error() {
    let (rx, server) = CallbackServer::start().await.expect("bind callback port");

    let resp = reqwest::get(format!(
        "{REDIRECT_URI}?error=access_denied&error_description=User+denied"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().contains("User denied"));

    let result = rx.recv().await.unwrap();
    assert!(result.code.is_empty());
    assert_eq!(result.error, "access_denied");
    assert_eq!(result.error_description, "User denied");

    server.shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_second_start_fails_while_listening() {
    let (_rx, server) = CallbackServer::start().await.expect("bind callback port");

    let err = CallbackServer::start().await.unwrap_err();
    assert!(err.to_string().contains("port 9876"), "{err}");

    server.shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_port_is_released_after_drop() {
    {
        let (_rx, _server) = CallbackServer::start().await.expect("bind callback port");
    }
    // Dropping aborts the accept task; the runtime drops it on its next turn.
    let mut restarted = None;
    for _ in 0..20 {
        if let Ok(pair) = CallbackServer::start().await {
            restarted = Some(pair);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let (_rx, server) = restarted.expect("port should be free after the guard is dropped");
    server.shutdown().await;
}
