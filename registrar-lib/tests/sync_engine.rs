//! End-to-end tests for SyncEngine over a mock server.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use registrar_lib::RegistrarClient;
use registrar_lib::RetryConfig;
use registrar_lib::api::Resource;
use registrar_lib::auth::Session;
use registrar_lib::auth::StaticTokenProvider;
use registrar_lib::error::SyncError;
use registrar_lib::model::FieldSchema;
use registrar_lib::model::RowId;
use registrar_lib::model::Schema;
use registrar_lib::model::Value;
use registrar_lib::render::FormRenderer;
use registrar_lib::render::FormState;
use registrar_lib::render::Locale;
use registrar_lib::render::TableEvent;
use registrar_lib::render::TableRenderer;
use registrar_lib::table::ConfirmPrompt;
use registrar_lib::table::Confirmation;
use registrar_lib::table::LoadingFlag;
use registrar_lib::table::Notice;
use registrar_lib::table::NoticeLevel;
use registrar_lib::table::Notifier;
use registrar_lib::table::PageSize;
use registrar_lib::table::SyncEngine;
use registrar_lib::table::TableModel;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn levels(&self) -> Vec<NoticeLevel> {
        self.notices.lock().unwrap().iter().map(|n| n.level).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

struct Answer(bool);

#[async_trait]
impl Confirmation for Answer {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.0
    }
}

fn student_schema() -> Schema {
    Schema::new(vec![
        FieldSchema::number("id", "ID").read_only(),
        FieldSchema::text("surname", "Surname").required(),
        FieldSchema::boolean("entrance", "Entrance"),
    ])
    .unwrap()
}

fn engine(server: &MockServer, notifier: Arc<RecordingNotifier>) -> SyncEngine {
    let client = RegistrarClient::builder()
        .url(server.uri())
        .token_provider(StaticTokenProvider::new("t"))
        .retry(RetryConfig::no_retry())
        .build();
    SyncEngine::with_collaborators(
        client,
        Resource::STUDENT,
        TableModel::new(student_schema(), PageSize::default()),
        notifier,
        LoadingFlag::new(),
    )
}

async fn mount_rows(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/student"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_boolean_edit_saved_as_true_boolean() {
    let server = MockServer::start().await;
    mount_rows(&server, json!([{"id": 5, "surname": "Ivanova", "entrance": false}])).await;
    Mock::given(method("PUT"))
        .and(path("/api/student"))
        .and(body_json(json!([{"id": 5, "entrance": true}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_rows(&server, json!([{"id": 5, "surname": "Ivanova", "entrance": true}])).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let engine = engine(&server, notifier.clone());
    engine.fetch().await.unwrap();

    {
        let mut model = engine.model().await;
        let schema = model.schema().clone();
        let change = FormRenderer::new(&schema, Locale::En)
            .choose("entrance", "Yes")
            .unwrap();
        model
            .apply(TableEvent::CellEdited {
                id: RowId::Int(5),
                key: change.key,
                value: change.value,
            })
            .unwrap();

        let patch = model.edits().diff(&RowId::Int(5)).unwrap();
        assert_eq!(patch.changes.get("entrance"), Some(&Value::Bool(true)));
    }

    assert_eq!(engine.save().await.unwrap(), 1);

    let model = engine.model().await;
    assert!(model.edits().is_empty());
    assert_eq!(model.store().generation(), 2);
    assert_eq!(
        model.store().get(&RowId::Int(5)).unwrap().get_bool("entrance").unwrap(),
        Some(true)
    );
    assert!(!engine.loading().is_loading());
}

#[tokio::test]
async fn test_save_without_changes_sends_nothing() {
    let server = MockServer::start().await;
    mount_rows(&server, json!([{"id": 5, "surname": "Ivanova", "entrance": false}])).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine(&server, Arc::default());
    engine.fetch().await.unwrap();
    engine
        .model()
        .await
        .apply(TableEvent::CellEdited {
            id: RowId::Int(5),
            key: "entrance".into(),
            value: "false".into(),
        })
        .unwrap();

    assert_eq!(engine.save().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_update_keeps_edits_and_clears_loading() {
    let server = MockServer::start().await;
    mount_rows(&server, json!([{"id": 5, "surname": "Ivanova", "entrance": false}])).await;
    Mock::given(method("PUT"))
        .and(path("/api/student"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let engine = engine(&server, notifier.clone());
    engine.fetch().await.unwrap();
    engine
        .model()
        .await
        .apply(TableEvent::CellEdited {
            id: RowId::Int(5),
            key: "surname".into(),
            value: "Petrova".into(),
        })
        .unwrap();

    let err = engine.save().await.unwrap_err();
    assert!(matches!(err, SyncError::Mutation { .. }));
    assert!(!engine.loading().is_loading());

    let model = engine.model().await;
    assert_eq!(model.edits().pending_count(), 1);
    assert_eq!(
        model.edits().pending_value(&RowId::Int(5), "surname"),
        Some(&Value::from("Petrova"))
    );
    assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);
}

#[tokio::test]
async fn test_delete_removes_rows_and_selection() {
    let server = MockServer::start().await;
    mount_rows(
        &server,
        json!([
            {"id": 1, "surname": "A"},
            {"id": 3, "surname": "B"},
            {"id": 7, "surname": "C"}
        ]),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/student"))
        .and(body_json(json!([3, 7])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_rows(&server, json!([{"id": 1, "surname": "A"}])).await;

    let engine = engine(&server, Arc::default());
    engine.fetch().await.unwrap();
    {
        let mut model = engine.model().await;
        model.apply(TableEvent::RowChecked { id: RowId::Int(3), checked: true }).unwrap();
        model.apply(TableEvent::RowChecked { id: RowId::Int(7), checked: true }).unwrap();
    }

    assert_eq!(engine.delete_selected(&Answer(true)).await.unwrap(), 2);

    let model = engine.model().await;
    assert!(!model.selection().contains(&RowId::Int(3)));
    assert!(!model.selection().contains(&RowId::Int(7)));
    let view = TableRenderer::default().render(&model);
    let ids: Vec<_> = view.rows.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![RowId::Int(1)]);
}

#[tokio::test]
async fn test_declined_delete_sends_nothing() {
    let server = MockServer::start().await;
    mount_rows(&server, json!([{"id": 3, "surname": "B"}])).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine(&server, Arc::default());
    engine.fetch().await.unwrap();
    engine.model().await.apply(TableEvent::AllChecked(true)).unwrap();

    assert_eq!(engine.delete_selected(&Answer(false)).await.unwrap(), 0);
    assert_eq!(engine.model().await.selection().len(), 1);
}

#[tokio::test]
async fn test_failed_delete_keeps_selection() {
    let server = MockServer::start().await;
    mount_rows(&server, json!([{"id": 3, "surname": "B"}])).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Insufficient privileges"})))
        .mount(&server)
        .await;

    let engine = engine(&server, Arc::default());
    engine.fetch().await.unwrap();
    engine.model().await.apply(TableEvent::AllChecked(true)).unwrap();

    assert!(engine.delete_selected(&Answer(true)).await.is_err());
    let model = engine.model().await;
    assert_eq!(model.selection().len(), 1);
    assert_eq!(model.store().len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_last_rows() {
    let server = MockServer::start().await;
    mount_rows(&server, json!([{"id": 1, "surname": "A"}])).await;
    Mock::given(method("GET"))
        .and(path("/api/student"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let engine = engine(&server, Arc::default());
    engine.fetch().await.unwrap();

    let err = engine.fetch().await.unwrap_err();
    assert!(matches!(err, SyncError::Fetch { .. }));
    let model = engine.model().await;
    assert_eq!(model.store().len(), 1);
    assert_eq!(model.store().generation(), 1);
}

#[tokio::test]
async fn test_create_validates_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let engine = engine(&server, notifier.clone());
    let mut form = FormState::new();
    form.open(&student_schema());

    let err = engine.create(&mut form).await.unwrap_err();
    match err {
        SyncError::Validation(v) => assert_eq!(v.fields(), vec!["surname"]),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(form.is_open());
    assert_eq!(notifier.levels(), vec![NoticeLevel::Warning]);
}

#[tokio::test]
async fn test_create_closes_form_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/student"))
        .and(body_json(json!({"surname": "Sidorov", "entrance": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 8, "surname": "Sidorov", "entrance": false})))
        .expect(1)
        .mount(&server)
        .await;
    mount_rows(&server, json!([{"id": 8, "surname": "Sidorov", "entrance": false}])).await;

    let engine = engine(&server, Arc::default());
    let schema = student_schema();
    let mut form = FormState::new();
    form.open(&schema);
    form.apply(FormRenderer::new(&schema, Locale::En).input("surname", "Sidorov").unwrap());

    let created = engine.create(&mut form).await.unwrap();
    assert_eq!(created.unwrap().id(), &RowId::Int(8));
    assert!(!form.is_open());
    assert_eq!(engine.model().await.store().len(), 1);
}

#[tokio::test]
async fn test_failed_create_keeps_form_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/student"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "surname"], "msg": "field required", "type": "value_error.missing"}]
        })))
        .mount(&server)
        .await;

    let engine = engine(&server, Arc::default());
    let schema = student_schema();
    let mut form = FormState::new();
    form.open(&schema);
    form.apply(FormRenderer::new(&schema, Locale::En).input("surname", "X").unwrap());

    let err = engine.create(&mut form).await.unwrap_err();
    assert!(matches!(err, SyncError::Mutation { .. }));
    assert!(form.is_open());
    assert_eq!(form.values().get("surname"), Some(&Value::from("X")));
}

#[tokio::test]
async fn test_signed_out_is_auth_error() {
    let server = MockServer::start().await;
    let client = RegistrarClient::builder()
        .url(server.uri())
        .token_provider(Session::new())
        .build();
    let engine = SyncEngine::new(
        client,
        Resource::STUDENT,
        TableModel::new(student_schema(), PageSize::default()),
    );

    let err = engine.fetch().await.unwrap_err();
    assert!(err.is_auth());
    assert!(!engine.loading().is_loading());
    assert!(server.received_requests().await.unwrap().is_empty());
}
