use super::*;
use crate::error::AuthError;
use wiremock::matchers::{body_json, header};

#[tokio::test]
async fn test_connect_logs_in_then_loads_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ws/Login"))
        .and(body_json(serde_json::json!({"email": "ops@example.com", "apiKey": "key"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "from-login",
            "refresh_token": "r",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ws/Norme"))
        .and(header("authorization", "Bearer from-login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": NORM_ID, "name": "NF EN 15804+A2"}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/ws/Norme/{NORM_ID}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"indicators": [], "phases": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = IniesClient::connect(
        test_config(&server),
        &Credentials::new("ops@example.com", "key"),
    )
    .await
    .unwrap();

    assert_eq!(client.metadata().norm_name(NORM_ID), Some("NF EN 15804+A2"));
    assert_eq!(client.state(), OrchestratorState::Idle);
    assert_eq!(client.progress(), ProgressSnapshot::default());
    assert_eq!(
        client.session().credential().await.tokens().access_token,
        "from-login"
    );
}

#[tokio::test]
async fn test_rejected_login_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ws/Login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ws/Norme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = IniesClient::connect(test_config(&server), &Credentials::new("a", "b"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Auth(AuthError::Rejected { status: 403, .. })
    ));
}

#[tokio::test]
async fn test_metadata_failure_prevents_any_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ws/Norme"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": NORM_ID, "name": "NF EN 15804+A2"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/ws/Norme/{NORM_ID}")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ws/Epd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index_body(&[1])))
        .expect(0)
        .mount(&server)
        .await;

    let err = IniesClient::with_token(test_config(&server), test_tokens())
        .await
        .unwrap_err();

    match err {
        Error::MetadataLoad { norm_id, source } => {
            assert_eq!(norm_id, Some(NORM_ID));
            assert_eq!(source.status(), Some(500));
        }
        other => panic!("expected metadata load error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.concurrency.max_concurrent_requests = 0;

    let err = IniesClient::with_token(config, test_tokens())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_fetch_record_retries_transient_statuses() {
    let server = MockServer::start().await;
    let client = create_test_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/ws/Epd/3"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_record(&server, 3).await;

    let record = client.fetch_record(RecordId(3)).await.unwrap();
    assert_eq!(record.id, RecordId(3));
    assert_eq!(record.indicator_set.name.as_deref(), Some("NF EN 15804+A2"));
}

#[tokio::test]
async fn test_fetch_record_surfaces_permanent_error() {
    let server = MockServer::start().await;
    let client = create_test_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/ws/Epd/8"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.fetch_record(RecordId(8)).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_stale_token_is_refreshed_before_fetch() {
    let server = MockServer::start().await;
    mount_taxonomy(&server).await;
    Mock::given(method("POST"))
        .and(path("/ws/RefreshToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed",
            "refresh_token": "r2",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ws/Epd/1"))
        .and(header("authorization", "Bearer refreshed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.token_max_age = Duration::from_millis(300);
    let client = IniesClient::with_token(config, test_tokens()).await.unwrap();
    let mut events = client.subscribe();

    tokio::time::sleep(Duration::from_millis(400)).await;
    client.fetch_record(RecordId(1)).await.unwrap();

    assert_eq!(client.session().refresh_count(), 1);
    assert!(drain(&mut events).contains(&Event::TokenRefreshed));
}

#[tokio::test]
async fn test_refresh_hitting_gateway_error_is_retried() {
    let server = MockServer::start().await;
    mount_taxonomy(&server).await;
    Mock::given(method("POST"))
        .and(path("/ws/RefreshToken"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ws/RefreshToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed",
            "refresh_token": "r2",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ws/Epd/1"))
        .and(header("authorization", "Bearer refreshed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.token_max_age = Duration::from_millis(300);
    let client = IniesClient::with_token(config, test_tokens()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    let record = client.fetch_record(RecordId(1)).await.unwrap();

    assert_eq!(record.id, RecordId(1));
    assert_eq!(client.session().refresh_count(), 1);
}

#[tokio::test]
async fn test_malformed_record_payload_is_retried() {
    let server = MockServer::start().await;
    let client = create_test_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/ws/Epd/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_record(&server, 2).await;

    let record = client.fetch_record(RecordId(2)).await.unwrap();
    assert_eq!(record.id, RecordId(2));
}

#[tokio::test]
async fn test_fetch_after_shutdown_is_refused() {
    let server = MockServer::start().await;
    let client = create_test_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/ws/Epd/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_body(1)))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!client.is_shut_down());
    client.shutdown();

    let err = client.fetch_record(RecordId(1)).await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
}
