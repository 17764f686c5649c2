use axum::{
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use serde_json::json;
use tempfile::TempDir;
use video_review::{
    Chapter, ConfigBuilder, ExtractionClient, Flashcard, HttpExtractionClient, ReviewError,
    VideoFile,
};

/// Echoes the uploaded field back inside a valid payload
async fn upload_handler(mut multipart: Multipart) -> impl IntoResponse {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();

        if name == "video" {
            return (
                StatusCode::OK,
                Json(json!({
                    "chapters": [
                        {"time": 10, "label": format!("{} ({} bytes)", file_name, bytes.len())},
                        {"time": 3, "label": content_type}
                    ],
                    "flashcards": [{"question": "A?", "answer": "1"}]
                })),
            );
        }
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "missing video field"})),
    )
}

async fn spawn_service(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/upload", addr)
}

fn video(dir: &TempDir) -> VideoFile {
    let path = dir.path().join("lecture.mp4");
    std::fs::write(&path, b"0123456789").unwrap();
    VideoFile::new(path).unwrap()
}

fn client(endpoint: String) -> HttpExtractionClient {
    let config = ConfigBuilder::new().with_endpoint(endpoint).with_timeout(10).build();
    HttpExtractionClient::new(config.extraction).unwrap()
}

#[tokio::test]
async fn test_multipart_upload_and_payload() {
    let endpoint = spawn_service(Router::new().route("/api/upload", post(upload_handler))).await;
    let dir = TempDir::new().unwrap();

    let payload = client(endpoint).extract(&video(&dir)).await.unwrap();

    assert_eq!(
        payload.chapters,
        vec![
            Chapter::new(10.0, "lecture.mp4 (10 bytes)"),
            Chapter::new(3.0, "video/mp4"),
        ]
    );
    assert_eq!(payload.flashcards, vec![Flashcard::new("A?", "1")]);
}

#[tokio::test]
async fn test_server_error_is_extraction_failure() {
    let app = Router::new().route(
        "/api/upload",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model overloaded") }),
    );
    let endpoint = spawn_service(app).await;
    let dir = TempDir::new().unwrap();

    let err = client(endpoint).extract(&video(&dir)).await.unwrap_err();
    match err {
        ReviewError::ExtractionFailed(reason) => assert!(reason.contains("500")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_flashcards_is_invalid_payload() {
    let app = Router::new().route(
        "/api/upload",
        post(|| async { Json(json!({"chapters": []})) }),
    );
    let endpoint = spawn_service(app).await;
    let dir = TempDir::new().unwrap();

    let err = client(endpoint).extract(&video(&dir)).await.unwrap_err();
    assert!(matches!(err, ReviewError::InvalidPayload(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let dir = TempDir::new().unwrap();

    let err = client(format!("http://{}/api/upload", addr))
        .extract(&video(&dir))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::Http(_)));
    assert!(err.is_recoverable());
}
