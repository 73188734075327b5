use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::backend::{HttpBackend, QaBackend};
use crate::client::{AskOutcome, ChatClient, UploadOutcome};
use crate::config::AppConfig;
use crate::document::Document;
use crate::session::{FileStore, LogEvent, UuidGenerator};
use crate::ui;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let store = FileStore::new(&config.storage.path);
    let backend: Arc<dyn QaBackend> = Arc::new(HttpBackend::with_timeout(
        &config.backend.base_url,
        config.backend.timeout(),
    )?);

    info!(
        name: "backend.config.loaded",
        base_url = %config.backend.base_url,
        timeout_secs = ?config.backend.timeout_secs,
        "Backend configuration loaded"
    );

    let client = ChatClient::from_store(backend, &store, &UuidGenerator)?
        .with_trust(config.ui.bot_text_trust());

    info!(
        name: "session.ready",
        session_id = %client.session_id(),
        storage = %store.path().display(),
        trust = ?client.trust(),
        "Chat session ready"
    );

    let state = AppState {
        client: Arc::new(client),
        config: Arc::clone(&config),
    };

    let app = router(state);
    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        name: "server.started",
        address = %format!("http://{address}"),
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router for the chat UI.
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.ui.max_upload_bytes;

    Router::new()
        // HTML pages
        .route("/", get(index_handler))
        .route("/chat/messages", get(messages_handler))
        .route("/chat/events", get(events_handler))
        // UI actions
        .route("/chat/ask", post(ask_handler))
        .route(
            "/chat/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        // API
        .route("/api/session", get(session_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - The chat page.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(ui::chat_page(
        &state.client.messages(),
        state.client.is_pending(),
    ))
}

/// GET /chat/messages - Current log as an HTML fragment.
async fn messages_handler(State(state): State<AppState>) -> Html<String> {
    Html(ui::render_log(&state.client.messages()))
}

/// GET /chat/events - SSE stream of log appends and pending-flag changes.
///
/// The stream opens with a `snapshot` of the current log and a `pending`
/// event, so a page (re)connecting never misses what happened before it
/// subscribed. Appends already covered by the snapshot are skipped.
async fn events_handler(State(state): State<AppState>) -> Response {
    let client = Arc::clone(&state.client);
    let mut rx = client.log().subscribe();

    let sse_stream = async_stream::stream! {
        let (snapshot, mut seen) = snapshot_events(&client);
        yield Ok::<String, Infallible>(snapshot);

        loop {
            match rx.recv().await {
                Ok(LogEvent::Appended { index, message }) => {
                    if index < seen {
                        continue;
                    }
                    seen = index + 1;
                    yield Ok::<String, Infallible>(sse_event("message", &ui::render_message(&message)));
                }
                Ok(LogEvent::Pending(pending)) => {
                    yield Ok::<String, Infallible>(sse_event("pending", pending_data(pending)));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "SSE subscriber lagged, resending snapshot");
                    let (snapshot, len) = snapshot_events(&client);
                    seen = len;
                    yield Ok::<String, Infallible>(snapshot);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    build_sse_response(axum::body::Body::from_stream(sse_stream))
}

/// Current log and pending flag as SSE frames, plus the log length they cover.
fn snapshot_events(client: &ChatClient) -> (String, usize) {
    let messages = client.messages();
    let mut frames = sse_event("snapshot", &ui::render_log(&messages));
    frames.push_str(&sse_event("pending", pending_data(client.is_pending())));
    (frames, messages.len())
}

fn pending_data(pending: bool) -> &'static str {
    if pending { "true" } else { "false" }
}

// ─────────────────────────────────────────────────────────────────────────────
// Action Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the ask action.
#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub question: String,
}

/// Response from the ask action.
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub outcome: AskOutcome,
}

/// Response from the upload action.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub outcome: UploadOutcome,
    pub file_name: String,
}

/// Error response for malformed UI requests.
#[derive(Debug, Serialize)]
pub struct ActionError {
    pub error: String,
    pub code: String,
}

/// POST /chat/ask - Ask a question.
///
/// The interaction runs on its own task: a dropped HTTP request must not
/// cancel it once the question is in the log.
async fn ask_handler(
    State(state): State<AppState>,
    Json(form): Json<AskForm>,
) -> Result<Json<AskResponse>, (StatusCode, Json<ActionError>)> {
    let client = Arc::clone(&state.client);
    let outcome = tokio::spawn(async move { client.ask_question(&form.question).await })
        .await
        .map_err(interaction_failed)?;
    tracing::debug!(outcome = ?outcome, "Ask action finished");
    Ok(Json(AskResponse { outcome }))
}

/// POST /chat/upload - Upload the multipart `file` field.
async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<ActionError>)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        action_error(
            e.status(),
            "MULTIPART_ERROR",
            format!("Failed to read multipart field: {e}"),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map_or_else(|| "document".to_string(), ToString::to_string);
        let content_type = field.content_type().map(ToString::to_string);

        let bytes = field.bytes().await.map_err(|e| {
            action_error(
                e.status(),
                "READ_ERROR",
                format!("Failed to read file '{file_name}': {e}"),
            )
        })?;

        let mut document = Document::new(file_name.clone(), bytes.to_vec());
        if let Some(content_type) = content_type {
            document = document.with_content_type(content_type);
        }
        if !document.has_accepted_extension() {
            tracing::debug!(file_name = %file_name, "Uploading file outside the suggested extensions");
        }

        let client = Arc::clone(&state.client);
        let outcome = tokio::spawn(async move { client.upload_document(&document).await })
            .await
            .map_err(interaction_failed)?;
        return Ok(Json(UploadResponse { outcome, file_name }));
    }

    Err(action_error(
        StatusCode::BAD_REQUEST,
        "MISSING_FILE",
        "Multipart body has no 'file' field".to_string(),
    ))
}

/// Session info.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub message_count: usize,
    pub pending: bool,
}

/// GET /api/session - Session id and log size.
async fn session_handler(State(state): State<AppState>) -> Json<SessionInfo> {
    Json(SessionInfo {
        session_id: state.client.session_id().to_string(),
        message_count: state.client.log().len(),
        pending: state.client.is_pending(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn action_error(
    status: StatusCode,
    code: &str,
    error: String,
) -> (StatusCode, Json<ActionError>) {
    (
        status,
        Json(ActionError {
            error,
            code: code.to_string(),
        }),
    )
}

fn interaction_failed(e: tokio::task::JoinError) -> (StatusCode, Json<ActionError>) {
    tracing::error!(error = %e, "Chat interaction task failed");
    action_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERACTION_FAILED",
        format!("Chat interaction failed: {e}"),
    )
}

/// Format one SSE event; multi-line data becomes multiple `data:` lines.
///
/// `\r\n`, `\r` and `\n` all end a line in the SSE framing.
pub fn sse_event(event: &str, data: &str) -> String {
    let mut out = format!("event: {event}\n");
    let data = data.replace("\r\n", "\n").replace('\r', "\n");
    for line in data.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out
}

fn build_sse_response(body: axum::body::Body) -> Response {
    (
        [
            ("Content-Type", "text/event-stream"),
            ("Cache-Control", "no-cache"),
            ("Connection", "keep-alive"),
            ("X-Accel-Buffering", "no"),
        ],
        body,
    )
        .into_response()
}
