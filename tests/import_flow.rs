//! End-to-end import flow against in-process stub services.

mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::post,
};
use book_import::{
    error::AppError,
    models::{Config, LessonType, MoveDirection},
    pipeline::{self, DraftEdit, ImportSource},
    services::{
        BackendSubmitter, ContentAnalyzer, GeminiAnalyzer, PreviewSubmitter, SessionHandle,
        SessionStatus, analyzer::AnalysisInput, submitter::MSG_NO_PREVIEW,
    },
    storage::{DraftStorage, LocalStorage},
};
use serde_json::{Value, json};
use tempfile::TempDir;

use common::{analyzer_config, backend_config, gemini_reply, sample_book, spawn_stub};

const FENCED_BOOK: &str = "```json\n{\"bookTitle\":\"A\",\"chapters\":[{\"chapterTitle\":\"C1\",\"lessons\":[{\"type\":\"vocabulary\",\"items\":[\"a\",\"b\"]}]}]}\n```";

#[derive(Clone, Default)]
struct Captured {
    body: Arc<Mutex<Option<Value>>>,
    auth: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<usize>>,
}

async fn fenced_reply(
    State(captured): State<Captured>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    *captured.calls.lock().unwrap() += 1;
    *captured.body.lock().unwrap() = Some(body);
    if params.get("key").map(String::as_str) != Some("test-key") {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "message": "API key not valid" } })),
        );
    }
    (StatusCode::OK, Json(gemini_reply(FENCED_BOOK)))
}

async fn accept_import(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    *captured.calls.lock().unwrap() += 1;
    *captured.body.lock().unwrap() = Some(body);
    *captured.auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    StatusCode::CREATED
}

async fn analyzer_stub() -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/generate", post(fenced_reply))
        .with_state(captured.clone());
    (spawn_stub(app).await, captured)
}

async fn backend_stub() -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/api/books/import", post(accept_import))
        .with_state(captured.clone());
    (spawn_stub(app).await, captured)
}

#[tokio::test]
async fn test_analyze_fenced_reply_into_preview() {
    let (base, captured) = analyzer_stub().await;
    let analyzer = GeminiAnalyzer::new(&analyzer_config(&base), "test-key").unwrap();

    let session = SessionHandle::new();
    session.set_raw_text(Some("Lektion 1: Hallo, Tschüss".to_string())).await;
    let preview = session.analyze(&analyzer).await.unwrap();

    assert_eq!(preview.book_title, "A");
    assert_eq!(preview.chapters.len(), 1);
    assert_eq!(preview.chapters[0].chapter_title, "C1");
    assert_eq!(preview.chapters[0].lessons.len(), 1);
    assert_eq!(preview.chapters[0].lessons[0].lesson_type, LessonType::Vocabulary);
    assert_eq!(preview.chapters[0].lessons[0].items, ["a", "b"]);

    let state = session.snapshot().await;
    assert_eq!(state.status(), &SessionStatus::Ready);
    assert_eq!(state.preview(), Some(&preview));

    let sent = captured.body.lock().unwrap().clone().unwrap();
    let parts = sent["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[1]["text"], "Lektion 1: Hallo, Tschüss");
}

#[tokio::test]
async fn test_analyze_sends_inline_images() {
    let (base, captured) = analyzer_stub().await;
    let analyzer = GeminiAnalyzer::new(&analyzer_config(&base), "test-key").unwrap();

    let input = AnalysisInput {
        raw_text: None,
        images: vec!["data:image/jpeg;base64,QUJD".to_string()],
    };
    analyzer.analyze(&input).await.unwrap();

    let sent = captured.body.lock().unwrap().clone().unwrap();
    let image = &sent["contents"][0]["parts"][1]["inlineData"];
    assert_eq!(image["mimeType"], "image/jpeg");
    assert_eq!(image["data"], "QUJD");
}

#[tokio::test]
async fn test_service_error_moves_session_to_error() {
    let app = Router::new().route(
        "/generate",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": { "message": "quota exceeded" } })),
            )
        }),
    );
    let base = spawn_stub(app).await;
    let analyzer = GeminiAnalyzer::new(&analyzer_config(&base), "test-key").unwrap();

    let session = SessionHandle::new();
    session.load_preview(sample_book(&["Kept"])).await.unwrap();
    session.set_raw_text(Some("text".to_string())).await;

    let err = session.analyze(&analyzer).await.unwrap_err();
    assert!(matches!(err, AppError::ExternalService(_)));

    let state = session.snapshot().await;
    assert_eq!(state.status(), &SessionStatus::Error("quota exceeded".to_string()));
    assert_eq!(state.preview(), Some(&sample_book(&["Kept"])));
}

#[tokio::test]
async fn test_service_error_without_envelope_uses_generic_message() {
    let app = Router::new().route("/generate", post(|| async { StatusCode::BAD_GATEWAY }));
    let base = spawn_stub(app).await;
    let analyzer = GeminiAnalyzer::new(&analyzer_config(&base), "test-key").unwrap();

    let input = AnalysisInput {
        raw_text: Some("text".to_string()),
        images: vec![],
    };
    let err = analyzer.analyze(&input).await.unwrap_err();
    assert_eq!(err.user_message(), "Failed to analyze with Gemini.");
}

#[tokio::test]
async fn test_non_json_reply_is_malformed() {
    let app = Router::new().route(
        "/generate",
        post(|| async { Json(gemini_reply("Sorry, I cannot help with that.")) }),
    );
    let base = spawn_stub(app).await;
    let analyzer = GeminiAnalyzer::new(&analyzer_config(&base), "test-key").unwrap();

    let session = SessionHandle::new();
    session.set_raw_text(Some("text".to_string())).await;
    let err = session.analyze(&analyzer).await.unwrap_err();

    assert!(matches!(err, AppError::MalformedPayload(_)));
    assert_eq!(
        session.snapshot().await.error(),
        Some("Gemini response was not valid JSON.")
    );
}

#[tokio::test]
async fn test_submit_posts_camel_case_with_token() {
    let (base, captured) = backend_stub().await;
    let submitter = BackendSubmitter::new(&backend_config(&base))
        .unwrap()
        .with_token(Some("secret".to_string()));

    submitter.submit(&sample_book(&["One", "Two"])).await.unwrap();

    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["bookTitle"], "Sample");
    assert_eq!(body["chapters"][1]["chapterTitle"], "Two");
    assert_eq!(body["chapters"][0]["lessons"][0]["type"], "reading");
    assert_eq!(
        captured.auth.lock().unwrap().as_deref(),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn test_submit_failure_message_precedence() {
    let app = Router::new().route(
        "/api/books/import",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "title": "Bad Request", "detail": "Book title already exists" })),
            )
        }),
    );
    let base = spawn_stub(app).await;
    let submitter = BackendSubmitter::new(&backend_config(&base)).unwrap();

    let err = submitter.submit(&sample_book(&["One"])).await.unwrap_err();
    assert!(matches!(err, AppError::Persistence(_)));
    assert_eq!(err.user_message(), "Book title already exists");

    let app = Router::new().route(
        "/api/books/import",
        post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let base = spawn_stub(app).await;
    let submitter = BackendSubmitter::new(&backend_config(&base)).unwrap();

    let err = submitter.submit(&sample_book(&["One"])).await.unwrap_err();
    assert_eq!(err.user_message(), "Request failed with status code 503");
}

#[tokio::test]
async fn test_submit_to_missing_endpoint_reports_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let submitter = BackendSubmitter::new(&backend_config(&base)).unwrap();
    let err = submitter.submit(&sample_book(&["One"])).await.unwrap_err();
    assert!(matches!(err, AppError::Persistence(_)));
    assert!(!err.user_message().trim().is_empty());
}

#[tokio::test]
async fn test_save_without_preview_makes_no_request() {
    let (base, captured) = backend_stub().await;
    let submitter = BackendSubmitter::new(&backend_config(&base)).unwrap();

    let session = SessionHandle::new();
    let err = session.save(&submitter).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.user_message(), MSG_NO_PREVIEW);
    assert_eq!(*captured.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_full_pipeline_analyze_edit_save() {
    let (analyzer_base, _) = analyzer_stub().await;
    let (backend_base, backend) = backend_stub().await;

    let tmp = TempDir::new().unwrap();
    let text_path = tmp.path().join("book.txt");
    std::fs::write(&text_path, "Kapitel 1\nHallo\nKapitel 2\nTschüss").unwrap();

    let config = Config {
        analyzer: analyzer_config(&analyzer_base),
        backend: backend_config(&backend_base),
        ..Config::default()
    };
    let storage = LocalStorage::new(tmp.path().join("storage"));
    let analyzer = GeminiAnalyzer::new(&config.analyzer, "test-key").unwrap();
    let submitter = BackendSubmitter::new(&config.backend).unwrap();

    let preview = pipeline::run_analyze(
        &config,
        &storage,
        &SessionHandle::new(),
        &analyzer,
        &ImportSource::Text(text_path),
    )
    .await
    .unwrap();
    assert_eq!(preview.chapters[0].chapter_title, "C1");

    let rename = DraftEdit::Rename {
        index: 0,
        title: "Begrüßung".to_string(),
    };
    pipeline::run_edit(&storage, &SessionHandle::new(), &rename)
        .await
        .unwrap();

    let bad_move = DraftEdit::Move {
        index: 0,
        direction: MoveDirection::Up,
    };
    let err = pipeline::run_edit(&storage, &SessionHandle::new(), &bad_move)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let session = SessionHandle::new();
    pipeline::run_save(&storage, &session, &submitter)
        .await
        .unwrap();
    assert_eq!(session.snapshot().await.status(), &SessionStatus::Idle);
    assert!(session.snapshot().await.preview().is_some());

    let body = backend.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["chapters"][0]["chapterTitle"], "Begrüßung");

    let draft = storage.load_draft().await.unwrap().unwrap();
    assert!(!draft.has_unsubmitted_changes());

    assert!(pipeline::run_reset(&storage, &SessionHandle::new()).await.unwrap());
    assert!(storage.load_draft().await.unwrap().is_none());
}
