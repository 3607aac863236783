//! HTTP API server.
//!
//! Exposes the download pipeline and the voice chat behind a small JSON
//! surface, plus a streamed file pickup endpoint.

use crate::chat::ChatEngine;
use crate::cli::Output;
use crate::config::Settings;
use crate::controller::{ControllerOptions, DownloadController};
use crate::history::{History, HistoryEntry};
use crate::media::{mime_for_path, DownloadFormat, FfmpegTagger, MediaExtractor, YtDlpExtractor};
use crate::tts::Speech;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
struct AppState {
    extractor: Arc<dyn MediaExtractor>,
    controller: DownloadController,
    history: History,
    chat: ChatEngine,
    speech: Speech,
    max_duration_seconds: u32,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let extractor: Arc<dyn MediaExtractor> =
        Arc::new(YtDlpExtractor::new(&settings.downloader));
    let controller = DownloadController::new(
        Arc::clone(&extractor),
        Arc::new(FfmpegTagger::new()),
        ControllerOptions::from_settings(&settings),
    );
    let history = History::new(
        settings.history_path(),
        settings.downloader.max_history_entries,
    );
    let chat = ChatEngine::new(settings.chat.clone());
    let speech = Speech::new(settings.tts.clone(), settings.tts_output_path());

    let state = Arc::new(AppState {
        extractor,
        controller,
        history,
        chat,
        speech,
        max_duration_seconds: settings.downloader.max_duration_seconds,
    });

    let app = app(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Hent Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Fetch Info", "POST /fetch-info");
    Output::kv("Download", "POST /download");
    Output::kv("Progress", "GET  /progress");
    Output::kv("File", "GET  /file");
    Output::kv("Chat", "POST /chat");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router over shared state.
fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/fetch-info", post(fetch_info))
        .route("/download", post(start_download))
        .route("/progress", get(progress))
        .route("/file", get(get_file))
        .route("/chat", post(chat_handler))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct FetchInfoRequest {
    url: String,
}

#[derive(Serialize)]
struct FetchInfoResponse {
    title: String,
    thumbnail: Option<String>,
    duration: u32,
}

#[derive(Deserialize)]
struct DownloadRequest {
    url: String,
    format: String,
}

#[derive(Serialize)]
struct DownloadResponse {
    status: &'static str,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Look up title, thumbnail and duration for a URL.
///
/// The duration cap is enforced here and only here; a later download
/// request is taken at face value.
async fn fetch_info(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FetchInfoRequest>,
) -> impl IntoResponse {
    if req.url.trim().is_empty() {
        return bad_request("URL must not be empty");
    }

    match state.extractor.fetch_info(&req.url).await {
        Ok(info) => {
            let duration = info.duration_seconds.unwrap_or(0);
            if duration > state.max_duration_seconds {
                let e = crate::error::HentError::DurationExceeded(
                    "Videos longer than 3 hours are not supported".to_string(),
                );
                return bad_request(e.to_string());
            }
            Json(FetchInfoResponse {
                title: info.title,
                thumbnail: info.thumbnail,
                duration,
            })
            .into_response()
        }
        Err(e) => bad_request(e.to_string()),
    }
}

async fn start_download(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DownloadRequest>,
) -> impl IntoResponse {
    let format: DownloadFormat = match req.format.parse() {
        Ok(format) => format,
        Err(_) => return bad_request("Invalid request data"),
    };

    match state.controller.start(&req.url, format) {
        Ok(()) => Json(DownloadResponse { status: "started" }).into_response(),
        Err(e) => bad_request(e.to_string()),
    }
}

async fn progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.controller.progress())
}

/// Stream the finished deliverable to the client.
///
/// Waits (bounded) for the worker's output, logs the download, then
/// schedules the serve directory cleanup.
async fn get_file(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "File tidak ditemukan".to_string(),
            }),
        )
            .into_response()
    };

    let Some(done) = state.controller.wait_for_file().await else {
        warn!("No deliverable file appeared within the wait budget");
        return not_found();
    };

    let file = match tokio::fs::File::open(&done.path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Could not open {}: {}", done.path.display(), e);
            return not_found();
        }
    };

    let filename = done
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("download.{}", done.format.extension()));

    if let Err(e) = state.history.append(&HistoryEntry {
        title: done.title.clone(),
        format: done.format,
        duration: done.duration.clone(),
        size: done.size_label.clone(),
    }) {
        warn!("Could not append download log entry: {}", e);
    }

    state.controller.schedule_cleanup();

    let body = Body::from_stream(ReaderStream::new(file));
    let headers = [
        (header::CONTENT_TYPE, mime_for_path(&done.path).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    (headers, body).into_response()
}

/// Chat with the language model and voice the reply.
///
/// A provider failure yields a canned apology rather than an error status;
/// speech synthesis failures never block the text reply.
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let reply = match state.chat.reply(&req.message).await {
        Ok(reply) => {
            if let Err(e) = state.speech.synthesize(&reply).await {
                warn!("Speech synthesis failed: {}", e);
            }
            reply
        }
        Err(e) => {
            error!("Chat completion failed: {}", e);
            state.chat.fallback_reply().to_string()
        }
    };

    Json(ChatResponse { reply })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChatSettings, TtsSettings};
    use crate::media::{MediaInfo, ProgressFn};
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::Request;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct StubExtractor {
        duration: u32,
    }

    #[async_trait]
    impl MediaExtractor for StubExtractor {
        async fn fetch_info(&self, _url: &str) -> crate::error::Result<MediaInfo> {
            Ok(MediaInfo {
                title: "Long Video".to_string(),
                thumbnail: Some("https://example.com/thumb.jpg".to_string()),
                duration_seconds: Some(self.duration),
            })
        }

        async fn download(
            &self,
            _url: &str,
            _format: DownloadFormat,
            _work_dir: &Path,
            _on_progress: ProgressFn,
        ) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn test_state(dir: &TempDir, duration: u32) -> Arc<AppState> {
        let extractor: Arc<dyn MediaExtractor> = Arc::new(StubExtractor { duration });
        let controller = DownloadController::new(
            Arc::clone(&extractor),
            Arc::new(FfmpegTagger::new()),
            ControllerOptions {
                work_dir: dir.path().join("work"),
                serve_dir: dir.path().join("serve"),
                output_stem: "temp".to_string(),
                poll_interval: Duration::from_millis(10),
                max_wait: Duration::from_millis(50),
                cleanup_delay: Duration::from_millis(10),
            },
        );
        Arc::new(AppState {
            extractor,
            controller,
            history: History::new(dir.path().join("log.txt"), 50),
            chat: ChatEngine::new(ChatSettings::default()),
            speech: Speech::new(TtsSettings::default(), dir.path().join("reply.mp3")),
            max_duration_seconds: 10800,
        })
    }

    fn fetch_info_request(url: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/fetch-info")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"url":"{}"}}"#, url)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_info_rejects_over_duration_cap() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir, 10801);
        let response = app(Arc::clone(&state))
            .oneshot(fetch_info_request("https://example.com/v"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 16 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("3 hours"));

        // The rejection never starts a download.
        assert!(!state.controller.progress().downloading);
    }

    #[tokio::test]
    async fn test_fetch_info_allows_exact_duration_cap() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir, 10800);
        let response = app(state)
            .oneshot(fetch_info_request("https://example.com/v"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 16 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["duration"], 10800);
        assert_eq!(json["title"], "Long Video");
    }

    #[tokio::test]
    async fn test_fetch_info_rejects_empty_url() {
        let dir = TempDir::new().unwrap();
        let response = app(test_state(&dir, 60))
            .oneshot(fetch_info_request("  "))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
