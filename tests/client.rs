use serde_json::{json, Value};
use slow_m2m::client::{Client, MAX_ENTITY_IDS_PER_REQUEST};
use slow_m2m::error::ApiError;
use slow_m2m::model::{Credentials, SessionToken};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "requestId": 1,
        "version": "stable",
        "errorCode": null,
        "errorMessage": null,
        "data": data
    }))
}

async fn client_for(server: &MockServer) -> Client {
    Client::new(&server.uri()).unwrap()
}

async fn ping_with(response: ResponseTemplate) -> Result<Value, ApiError> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ping"))
        .respond_with(response)
        .mount(&server)
        .await;
    let client = client_for(&server).await;
    client
        .send_request::<Value, _>("ping", Some(&json!({})), None)
        .await
}

#[tokio::test]
async fn login_returns_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"username": "landsat", "password": "secret"})))
        .respond_with(envelope(json!("eyJ0b2tlbiI6IjEyMyJ9")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let token = client
        .login(&Credentials::new("landsat", "secret"))
        .await
        .expect("login ok");
    assert_eq!(token.as_str(), "eyJ0b2tlbiI6IjEyMyJ9");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("X-Auth-Token").is_none());
}

#[tokio::test]
async fn authenticated_calls_carry_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download-retrieve"))
        .and(header("X-Auth-Token", "abc"))
        .and(body_json(json!({"label": "download-sample"})))
        .respond_with(envelope(json!({
            "available": [{"downloadId": 11, "url": "https://dds.example/11"}],
            "requested": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let retrieved = client
        .download_retrieve(&SessionToken::new("abc"), "download-sample")
        .await
        .expect("retrieve ok");
    assert_eq!(retrieved.available.len(), 1);
    assert_eq!(retrieved.available[0].download_id.as_str(), "11");
    assert!(retrieved.requested.is_empty());
}

#[tokio::test]
async fn http_statuses_map_to_error_kinds() {
    let err = ping_with(ResponseTemplate::new(401)).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));

    let err = ping_with(ResponseTemplate::new(404)).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    let err = ping_with(ResponseTemplate::new(400)).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest));

    let err = ping_with(ResponseTemplate::new(503)).await.unwrap_err();
    assert!(matches!(err, ApiError::Status(503)));
}

#[tokio::test]
async fn status_wins_over_error_code_in_body() {
    let response = ResponseTemplate::new(401).set_body_json(json!({
        "errorCode": "AUTH_UNAUTHORIZED",
        "errorMessage": "User does not have access",
        "data": null
    }));
    let err = ping_with(response).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn error_code_is_reported() {
    let response = ResponseTemplate::new(200).set_body_json(json!({
        "errorCode": "AUTH_INVALID",
        "errorMessage": "User credential verification failed",
        "data": null
    }));
    let err = ping_with(response).await.unwrap_err();
    match err {
        ApiError::Service { code, message } => {
            assert_eq!(code, "AUTH_INVALID");
            assert_eq!(message, "User credential verification failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_and_malformed_bodies_fail() {
    let err = ping_with(ResponseTemplate::new(200)).await.unwrap_err();
    assert!(matches!(err, ApiError::EmptyResponse));

    let err = ping_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn data_of_wrong_shape_fails_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(envelope(json!({"not": "a token"})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .login(&Credentials::new("landsat", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn transport_failure_is_reported() {
    // nothing listens on the discard port
    let client = Client::new("http://127.0.0.1:9").unwrap();
    let err = client
        .login(&Credentials::new("landsat", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn logout_reports_whether_session_ended() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(header("X-Auth-Token", "ended"))
        .respond_with(envelope(Value::Null))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(header("X-Auth-Token", "lingering"))
        .respond_with(envelope(json!("still here")))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.logout(SessionToken::new("ended")).await.unwrap());
    assert!(!client.logout(SessionToken::new("lingering")).await.unwrap());
}

#[tokio::test]
async fn download_options_are_chunked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download-options"))
        .respond_with(envelope(json!([
            {"id": "5e83d0b8", "entityId": "LC08_CU_028007_20190307_20190322_02", "available": true}
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let entity_ids: Vec<String> = (0..MAX_ENTITY_IDS_PER_REQUEST + 1)
        .map(|i| format!("LC08_{i}"))
        .collect();

    let client = client_for(&server).await;
    let options = client
        .download_options(&SessionToken::new("abc"), "landsat_ard_tile_c2", &entity_ids)
        .await
        .expect("options ok");
    assert_eq!(options.len(), 2);

    let requests = server.received_requests().await.unwrap();
    let first: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(
        first["entityIds"].as_array().unwrap().len(),
        MAX_ENTITY_IDS_PER_REQUEST
    );
    assert_eq!(second["entityIds"].as_array().unwrap().len(), 1);
    assert_eq!(second["datasetName"], "landsat_ard_tile_c2");
}
