//! Integration tests for the session lifecycle
//!
//! These tests drive the full stack (session manager, envelope builders,
//! HTTP client) against a mocked gateway endpoint and verify the session
//! contract: one login per expiry window no matter how many callers race,
//! state refresh on every successful round-trip, no mutation on failure,
//! and exact acknowledgement-code classification.

use std::sync::Arc;
use std::time::Duration;

use came_api::{CameError, Session};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(5);

fn host_of(server: &ServerGuard) -> String {
    server.url().trim_start_matches("http://").to_string()
}

fn login_body(username: &str, password: &str) -> String {
    json!({
        "sl_cmd": "sl_registration_req",
        "sl_login": username,
        "sl_pwd": password,
    })
    .to_string()
}

async fn mock_probe(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/domo/")
        .with_status(200)
        .create_async()
        .await
}

/// Mock a successful login for the given credentials
async fn mock_login(
    server: &mut ServerGuard,
    username: &str,
    password: &str,
    client_id: &str,
    keep_alive_sec: u64,
    expected_hits: usize,
) -> Mock {
    server
        .mock("POST", "/domo/")
        .match_body(Matcher::UrlEncoded(
            "command".into(),
            login_body(username, password),
        ))
        .with_status(200)
        .with_body(
            json!({
                "sl_cmd": "sl_registration_ack",
                "sl_client_id": client_id,
                "sl_keep_alive_timeout_sec": keep_alive_sec,
                "sl_data_ack_reason": 0,
            })
            .to_string(),
        )
        .expect(expected_hits)
        .create_async()
        .await
}

/// Mock a login answered with the given ack code
async fn mock_login_ack(server: &mut ServerGuard, username: &str, ack_reason: i64) -> Mock {
    server
        .mock("POST", "/domo/")
        .match_body(Matcher::Regex(format!("sl_login%22%3A%22{username}")))
        .with_status(200)
        .with_body(json!({"sl_data_ack_reason": ack_reason}).to_string())
        .create_async()
        .await
}

async fn connect(server: &ServerGuard, username: &str, password: &str) -> Session {
    Session::connect(&host_of(server), username, password)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_connect_probes_the_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let probe = mock_probe(&mut server).await;

    let session = connect(&server, "admin", "s3cret").await;

    probe.assert_async().await;
    assert!(!session.is_session_valid().await);
    assert_eq!(session.cseq().await, 0);
    assert_eq!(
        session.endpoint_url(),
        format!("{}/domo/", server.url())
    );
}

#[tokio::test]
async fn test_connect_fails_when_endpoint_missing() {
    let mut server = mockito::Server::new_async().await;
    let _probe = server
        .mock("GET", "/domo/")
        .with_status(404)
        .create_async()
        .await;

    let result = Session::connect(&host_of(&server), "admin", "s3cret").await;

    match result.unwrap_err() {
        CameError::ServerNotFound(msg) => assert!(msg.contains("404")),
        other => panic!("Expected ServerNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_valid_client_id_logs_in_once_within_expiry_window() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let login = mock_login(&mut server, "admin", "s3cret", "T1", 900, 1).await;

    let session = connect(&server, "admin", "s3cret").await;

    // first call logs in, second call hits the cached session
    assert_eq!(session.valid_client_id().await.unwrap(), "T1");
    assert_eq!(session.valid_client_id().await.unwrap(), "T1");
    assert!(session.is_session_valid().await);

    login.assert_async().await;
}

#[tokio::test]
async fn test_expired_session_triggers_second_login() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;

    // a keep-alive interval equal to the 30s safe zone leaves a zero-length
    // validity window: the session expires the moment it is established
    let login = mock_login(&mut server, "admin", "s3cret", "T1", 30, 2).await;

    let session = connect(&server, "admin", "s3cret").await;

    assert_eq!(session.valid_client_id().await.unwrap(), "T1");
    assert!(!session.is_session_valid().await);
    assert_eq!(session.valid_client_id().await.unwrap(), "T1");

    login.assert_async().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_login() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let login = mock_login(&mut server, "admin", "s3cret", "T1", 900, 1).await;

    let session = Arc::new(connect(&server, "admin", "s3cret").await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            session.valid_client_id().await.unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), "T1");
    }

    // eight racing callers, exactly one login on the wire
    login.assert_async().await;
}

#[tokio::test]
async fn test_send_command_success_advances_state() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _login = mock_login(&mut server, "admin", "s3cret", "T1", 900, 1).await;

    let session = connect(&server, "admin", "s3cret").await;
    session.valid_client_id().await.unwrap();
    assert_eq!(session.cseq().await, 1);

    let _cmd = server
        .mock("POST", "/domo/")
        .match_body(Matcher::Regex("sl_keep_alive_req".into()))
        .with_status(200)
        .with_body(json!({"sl_data_ack_reason": 0}).to_string())
        .create_async()
        .await;

    let response = session
        .send_command(json!({"sl_client_id": "T1", "sl_cmd": "sl_keep_alive_req"}))
        .await
        .unwrap();

    assert_eq!(response["sl_data_ack_reason"], 0);
    assert_eq!(session.cseq().await, 2);
    assert!(session.is_session_valid().await);
}

#[tokio::test]
async fn test_send_command_bad_ack_still_refreshes_state() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _cmd = server
        .mock("POST", "/domo/")
        .with_status(200)
        .with_body(json!({"sl_data_ack_reason": 1}).to_string())
        .create_async()
        .await;

    let session = connect(&server, "admin", "s3cret").await;
    let err = session
        .send_command(json!({"sl_cmd": "test"}))
        .await
        .unwrap_err();

    match err {
        CameError::Auth(msg) => assert_eq!(msg, "ACK error 1: Invalid user."),
        other => panic!("Expected Auth, got {other:?}"),
    }
    // the round-trip itself succeeded, so the sequence still advances
    assert_eq!(session.cseq().await, 1);
}

#[tokio::test]
async fn test_send_command_ack_classification() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let session = connect(&server, "admin", "s3cret").await;

    let cases: [(i64, &str, bool); 3] = [
        (11, "ACK error 11: Wrong application data.", false),
        (42, "ACK error 42: Unknown error code: 42", false),
        (3, "ACK error 3: Too many sessions during login.", true),
    ];

    for (ack_code, expected_message, is_auth) in cases {
        let _cmd = server
            .mock("POST", "/domo/")
            .match_body(Matcher::Regex(format!("case_{ack_code}")))
            .with_status(200)
            .with_body(json!({"sl_data_ack_reason": ack_code}).to_string())
            .create_async()
            .await;

        let err = session
            .send_command(json!({"sl_cmd": format!("case_{ack_code}")}))
            .await
            .unwrap_err();

        match err {
            CameError::Auth(msg) if is_auth => assert_eq!(msg, expected_message),
            CameError::Server(msg) if !is_auth => assert_eq!(msg, expected_message),
            other => panic!("Wrong kind for ack {ack_code}: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_send_command_failure_mutates_nothing() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _cmd = server
        .mock("POST", "/domo/")
        .with_status(500)
        .create_async()
        .await;

    let session = connect(&server, "admin", "s3cret").await;
    let err = session
        .send_command(json!({"sl_cmd": "test"}))
        .await
        .unwrap_err();

    assert!(matches!(err, CameError::Server(_)));
    assert_eq!(session.cseq().await, 0);
    assert!(!session.is_session_valid().await);
}

#[tokio::test]
async fn test_send_command_skip_ack_check_returns_raw_response() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _cmd = server
        .mock("POST", "/domo/")
        .with_status(200)
        .with_body(json!({"sl_data_ack_reason": 4}).to_string())
        .create_async()
        .await;

    let session = connect(&server, "admin", "s3cret").await;
    let response = session
        .send_command_with(json!({"sl_cmd": "test"}), TIMEOUT, true)
        .await
        .unwrap();

    assert_eq!(response["sl_data_ack_reason"], 4);
}

#[tokio::test]
async fn test_login_bad_credentials() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _login = mock_login_ack(&mut server, "admin", 1).await;

    let session = connect(&server, "admin", "s3cret").await;
    let err = session.valid_client_id().await.unwrap_err();

    match err {
        CameError::Auth(msg) => assert_eq!(msg, "Bad credentials."),
        other => panic!("Expected Auth, got {other:?}"),
    }
    assert!(!session.is_session_valid().await);
}

#[tokio::test]
async fn test_login_nonzero_ack_is_always_an_auth_error() {
    // code 3 is an auth code, code 4 is a server code elsewhere; during
    // login both must surface as authentication failures
    for (ack_code, expected_message) in [
        (3, "ACK error 3: Too many sessions during login."),
        (4, "ACK error 4: Error occurred in JSON Syntax."),
    ] {
        let mut server = mockito::Server::new_async().await;
        let _probe = mock_probe(&mut server).await;
        let _login = mock_login_ack(&mut server, "admin", ack_code).await;

        let session = connect(&server, "admin", "s3cret").await;
        let err = session.login().await.unwrap_err();

        match err {
            CameError::Auth(msg) => assert_eq!(msg, expected_message),
            other => panic!("Expected Auth for ack {ack_code}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_login_http_error_is_an_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _login = server
        .mock("POST", "/domo/")
        .with_status(500)
        .create_async()
        .await;

    let session = connect(&server, "admin", "s3cret").await;
    let err = session.valid_client_id().await.unwrap_err();

    match err {
        CameError::Auth(msg) => assert!(msg.contains("HTTP 500")),
        other => panic!("Expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn test_login_undecodable_response_is_an_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _login = server
        .mock("POST", "/domo/")
        .with_status(200)
        .with_body("<html>definitely not json</html>")
        .create_async()
        .await;

    let session = connect(&server, "admin", "s3cret").await;
    let err = session.valid_client_id().await.unwrap_err();

    match err {
        CameError::Auth(msg) => assert!(msg.contains("JSON decoding failed")),
        other => panic!("Expected Auth, got {other:?}"),
    }
    // the gateway did answer with a 2xx, so the round-trip still counts
    assert_eq!(session.cseq().await, 1);
}

#[tokio::test]
async fn test_keep_alive_renews_a_valid_session() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let login = mock_login(&mut server, "admin", "s3cret", "T1", 900, 1).await;
    let keep_alive = server
        .mock("POST", "/domo/")
        .match_body(Matcher::UrlEncoded(
            "command".into(),
            json!({"sl_client_id": "T1", "sl_cmd": "sl_keep_alive_req"}).to_string(),
        ))
        .with_status(200)
        .with_body(json!({"sl_data_ack_reason": 0}).to_string())
        .create_async()
        .await;

    let session = connect(&server, "admin", "s3cret").await;

    // invalid session: keep_alive logs in instead
    session.keep_alive().await.unwrap();
    assert!(session.is_session_valid().await);

    // valid session: keep_alive sends the renewal envelope
    session.keep_alive().await.unwrap();

    login.assert_async().await;
    keep_alive.assert_async().await;
}

#[tokio::test]
async fn test_logout_invalidates_the_session() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _login = mock_login(&mut server, "admin", "s3cret", "T1", 900, 1).await;
    let logout = server
        .mock("POST", "/domo/")
        .match_body(Matcher::UrlEncoded(
            "command".into(),
            json!({"sl_client_id": "T1", "sl_cmd": "sl_logout_req"}).to_string(),
        ))
        .with_status(200)
        .with_body(json!({"sl_data_ack_reason": 0}).to_string())
        .create_async()
        .await;

    let session = connect(&server, "admin", "s3cret").await;
    session.valid_client_id().await.unwrap();
    assert!(session.is_session_valid().await);

    session.logout().await.unwrap();

    assert!(!session.is_session_valid().await);
    logout.assert_async().await;
}

#[tokio::test]
async fn test_logout_without_a_session_is_a_no_op() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;

    let session = connect(&server, "admin", "s3cret").await;
    session.logout().await.unwrap();
    assert_eq!(session.cseq().await, 0);
}

#[tokio::test]
async fn test_dispose_swallows_gateway_failures() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _login = mock_login(&mut server, "admin", "s3cret", "T1", 900, 1).await;
    let _logout = server
        .mock("POST", "/domo/")
        .match_body(Matcher::Regex("sl_logout_req".into()))
        .with_status(500)
        .create_async()
        .await;

    let session = connect(&server, "admin", "s3cret").await;
    session.valid_client_id().await.unwrap();

    // the logout fails on the wire, the disposal does not
    session.dispose().await;

    assert!(!session.is_session_valid().await);

    // a disposed session refuses further work
    let err = session.valid_client_id().await.unwrap_err();
    assert!(matches!(err, CameError::Auth(_)));
    let err = session.send_command(json!({"sl_cmd": "test"})).await.unwrap_err();
    assert!(matches!(err, CameError::Auth(_)));
}

#[tokio::test]
async fn test_backup_and_restore_roundtrip() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let login = mock_login(&mut server, "admin", "s3cret", "T1", 900, 1).await;

    let session = connect(&server, "admin", "s3cret").await;
    session.valid_client_id().await.unwrap();
    let cseq_at_backup = session.cseq().await;

    let backup = session.backup().await;

    // mutate everything the snapshot covers: credentials, token, expiry
    // (through the credential change) and the sequence counter (through a
    // successful round-trip)
    let _cmd = server
        .mock("POST", "/domo/")
        .match_body(Matcher::Regex("sl_keep_alive_req".into()))
        .with_status(200)
        .with_body(json!({"sl_data_ack_reason": 0}).to_string())
        .create_async()
        .await;
    session
        .send_command(json!({"sl_client_id": "T1", "sl_cmd": "sl_keep_alive_req"}))
        .await
        .unwrap();
    assert_eq!(session.cseq().await, cseq_at_backup + 1);

    session.update_credentials("guest", "hunter2").await.unwrap();
    assert!(!session.is_session_valid().await);

    session.restore(backup).await;

    assert!(session.is_session_valid().await);
    assert_eq!(session.cseq().await, cseq_at_backup);
    // the restored token is served without a second login
    assert_eq!(session.valid_client_id().await.unwrap(), "T1");
    login.assert_async().await;
}

#[tokio::test]
async fn test_update_credentials_invalidates_the_session() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;
    let _login = mock_login(&mut server, "admin", "s3cret", "T1", 900, 1).await;

    let session = connect(&server, "admin", "s3cret").await;
    session.valid_client_id().await.unwrap();
    assert!(session.is_session_valid().await);

    session.update_credentials("guest", "hunter2").await.unwrap();
    assert!(!session.is_session_valid().await);
}

#[tokio::test]
async fn test_failed_switch_user_restores_original_identity() {
    let mut server = mockito::Server::new_async().await;
    let _probe = mock_probe(&mut server).await;

    // a keep-alive interval at the safe-zone boundary keeps the session
    // permanently expired, forcing a real login on every use; that proves
    // the restored credentials are what gets replayed after the failure
    let login_a = mock_login(&mut server, "admin", "s3cret", "TA", 30, 2).await;
    let login_b = mock_login_ack(&mut server, "guest", 1).await;

    let session = connect(&server, "admin", "s3cret").await;
    assert_eq!(session.valid_client_id().await.unwrap(), "TA");

    let err = session.switch_user("guest", "wrong").await.unwrap_err();
    match err {
        CameError::Auth(msg) => assert_eq!(msg, "Bad credentials."),
        other => panic!("Expected Auth, got {other:?}"),
    }

    // the original identity still works, without re-entering credentials
    assert_eq!(session.valid_client_id().await.unwrap(), "TA");
    login_a.assert_async().await;
    login_b.assert_async().await;
}
