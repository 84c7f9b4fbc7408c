//! HTTP-level tests for RegistrarClient against a mock server.

use std::time::Duration;

use registrar_lib::RegistrarClient;
use registrar_lib::RetryConfig;
use registrar_lib::api::Op;
use registrar_lib::api::OperationResult;
use registrar_lib::api::Resource;
use registrar_lib::auth::AccessToken;
use registrar_lib::auth::PasswordFlow;
use registrar_lib::auth::Session;
use registrar_lib::auth::StaticTokenProvider;
use registrar_lib::error::ApiError;
use registrar_lib::error::AuthError;
use registrar_lib::error::Error;
use registrar_lib::model::Fields;
use registrar_lib::model::Patch;
use registrar_lib::model::RowId;
use registrar_lib::model::Value;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .max_retries(2)
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5))
}

fn client(server: &MockServer) -> RegistrarClient {
    RegistrarClient::builder()
        .url(server.uri())
        .token_provider(StaticTokenProvider::new("test-token"))
        .retry(fast_retry())
        .build()
}

// ── Reads ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_sends_bearer_and_decodes_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/student"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "surname": "Ivanova", "entrance": true},
            {"id": 2, "surname": "Petrov", "entrance": false}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = client(&server).list(Resource::STUDENT).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id(), &RowId::Int(1));
    assert_eq!(rows[1].get_bool("entrance").unwrap(), Some(false));
}

#[tokio::test]
async fn test_list_with_filter_via_execute() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/group"))
        .and(query_param("group_ids", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[{"id": 3, "name": "PI-21"}]])))
        .expect(1)
        .mount(&server)
        .await;

    let op = Op::list(Resource::GROUP).filter("group_ids", 3).build();
    let result = client(&server).execute(op).await.unwrap();
    let rows = result.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_str("name").unwrap(), Some("PI-21"));
}

#[tokio::test]
async fn test_get_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "login": "admin"}])))
        .mount(&server)
        .await;

    let rows = client(&server).list(Resource::USER).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_get_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "database is down"})))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).list(Resource::USER).await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.to_string(), "HTTP 500: database is down");
}

// ── Auth ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_token_sends_nothing() {
    let server = MockServer::start().await;
    let client = RegistrarClient::builder()
        .url(server.uri())
        .token_provider(Session::new())
        .build();

    let err = client.list(Resource::SUBJECT).await.unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::MissingToken)));
    assert!(err.is_auth());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_is_auth_error_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subject"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Could not validate credentials"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).list(Resource::SUBJECT).await.unwrap_err();
    match err {
        Error::Auth(AuthError::Rejected { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Could not validate credentials");
        }
        other => panic!("expected rejected credential, got {:?}", other),
    }
}

#[tokio::test]
async fn test_session_token_is_read_per_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subject"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new();
    let client = RegistrarClient::builder()
        .url(server.uri())
        .token_provider(session.clone())
        .build();

    session.set_token(AccessToken::new("fresh")).await;
    assert!(client.list(Resource::SUBJECT).await.unwrap().is_empty());

    client.sign_out().await;
    assert!(!session.is_signed_in().await);
}

#[tokio::test]
async fn test_password_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/oauth2/authorize"))
        .and(body_json(json!({"login": "admin", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "jwt", "token_type": "bearer"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/oauth2/authorize"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect login or password"})))
        .mount(&server)
        .await;

    let flow = PasswordFlow::new(server.uri());
    let token = flow.authenticate("admin", "secret").await.unwrap();
    assert_eq!(token.as_bearer(), "Bearer jwt");

    let err = flow.authenticate("admin", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

// ── Mutations ───────────────────────────────────────────────────

#[tokio::test]
async fn test_create_posts_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/group"))
        .and(body_json(json!({"name": "PI-21"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "name": "PI-21"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Fields::new();
    fields.insert("name".into(), Value::from("PI-21"));
    let created = client(&server).create(&Resource::GROUP, &fields).await.unwrap();
    assert_eq!(created.unwrap().id(), &RowId::Int(9));
}

#[tokio::test]
async fn test_update_sends_patch_array_once() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/student"))
        .and(body_json(json!([{"id": 5, "entrance": true}])))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut changes = Fields::new();
    changes.insert("entrance".into(), Value::Bool(true));
    let batch = vec![Patch::new(RowId::Int(5), changes)];

    let err = client(&server).update(&Resource::STUDENT, &batch).await.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn test_delete_sends_id_array_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/subject"))
        .and(body_json(json!([3, 7])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .execute(Op::delete(Resource::SUBJECT, vec![RowId::Int(3), RowId::Int(7)]))
        .await
        .unwrap();
    assert!(matches!(result, OperationResult::Delete));
}

#[tokio::test]
async fn test_add_student_to_group_uses_query_and_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/group/add"))
        .and(query_param("student_id", "10"))
        .and(query_param("group_id", "3"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .add_student_to_group(&RowId::Int(10), &RowId::Int(3))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_forbidden_carries_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/group"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "Insufficient privileges to delete groups"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .delete(&Resource::GROUP, &[RowId::Int(1)])
        .await
        .unwrap_err();
    match err {
        Error::Api(api @ ApiError::Http { .. }) => {
            assert_eq!(api.status_code(), Some(403));
            assert_eq!(
                api.server_detail().map(|d| d.to_string()).as_deref(),
                Some("Insufficient privileges to delete groups")
            );
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_group_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/group"))
        .and(query_param("group_ids", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[{
            "id": 3,
            "name": "PI-21",
            "created_at": "2024-09-01T10:15:00",
            "students": [{"id": 10, "surname": "Ivanova"}]
        }]])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/group"))
        .and(query_param("group_ids", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[]])))
        .mount(&server)
        .await;

    let client = client(&server);
    let group = client.group_detail(&RowId::Int(3)).await.unwrap().unwrap();
    assert_eq!(group.name, "PI-21");
    assert_eq!(group.students_count(), 1);

    assert!(client.group_detail(&RowId::Int(4)).await.unwrap().is_none());
}
