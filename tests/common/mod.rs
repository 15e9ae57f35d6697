//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum::Router;
use book_import::models::{
    AnalyzerConfig, BackendConfig, LessonType, PreviewBook, PreviewChapter, PreviewLesson,
};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn analyzer_config(base_url: &str) -> AnalyzerConfig {
    AnalyzerConfig {
        endpoint: format!("{}/generate", base_url),
        timeout_secs: 5,
        ..AnalyzerConfig::default()
    }
}

pub fn backend_config(base_url: &str) -> BackendConfig {
    BackendConfig {
        base_url: base_url.to_string(),
        token_env: "BOOK_IMPORT_TEST_TOKEN_UNSET".to_string(),
        timeout_secs: 5,
        ..BackendConfig::default()
    }
}

pub fn sample_book(titles: &[&str]) -> PreviewBook {
    PreviewBook {
        book_title: "Sample".to_string(),
        chapters: titles
            .iter()
            .map(|title| PreviewChapter {
                chapter_title: title.to_string(),
                lessons: vec![PreviewLesson {
                    lesson_type: LessonType::Reading,
                    items: vec!["text".to_string()],
                }],
            })
            .collect(),
    }
}

/// `generateContent` reply body carrying `text` as its only part.
pub fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [ { "content": { "role": "model", "parts": [ { "text": text } ] } } ]
    })
}
