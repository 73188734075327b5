//! Integration tests for the chat UI router.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use allybot::AppState;
use allybot::backend::{AskReply, QaBackend, UploadReply};
use allybot::client::{AskOutcome, ChatClient, UploadOutcome};
use allybot::config::{AppConfig, BackendConfig, ServerConfig, StorageConfig, UiConfig};
use allybot::document::Document;
use allybot::markup::BotTextTrust;
use allybot::server::{AskResponse, SessionInfo, UploadResponse, router};
use allybot::session::SessionId;
use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::json;

/// Backend that answers every call with a fixed reply and remembers uploads.
#[derive(Default)]
struct CannedBackend {
    answer: Option<String>,
    uploaded: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait::async_trait]
impl QaBackend for CannedBackend {
    async fn upload_document(
        &self,
        document: &Document,
        _session_id: &SessionId,
    ) -> allybot::Result<UploadReply> {
        self.uploaded.lock().unwrap().push((
            document.file_name().to_string(),
            document.content_type().to_string(),
            document.len(),
        ));
        Ok(UploadReply {
            message: Some(format!("Indexed {}", document.file_name())),
        })
    }

    async fn ask_question(
        &self,
        _question: &str,
        _session_id: &SessionId,
    ) -> allybot::Result<AskReply> {
        Ok(AskReply {
            answer: self.answer.clone(),
        })
    }
}

fn test_config(max_upload_bytes: usize) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".into(),
        },
        backend: BackendConfig {
            base_url: "http://unused.invalid".into(),
            timeout_secs: None,
        },
        storage: StorageConfig {
            path: "unused.json".into(),
        },
        ui: UiConfig {
            trust_backend_markup: false,
            max_upload_bytes,
        },
    }
}

fn setup(backend: Arc<CannedBackend>, max_upload_bytes: usize) -> (TestServer, Arc<ChatClient>) {
    let client = Arc::new(
        ChatClient::new(backend, SessionId::new("ui-session")).with_trust(BotTextTrust::Sanitize),
    );
    let state = AppState {
        client: Arc::clone(&client),
        config: Arc::new(test_config(max_upload_bytes)),
    };
    (TestServer::new(router(state)).unwrap(), client)
}

fn answering(answer: &str) -> Arc<CannedBackend> {
    Arc::new(CannedBackend {
        answer: Some(answer.to_string()),
        ..CannedBackend::default()
    })
}

#[tokio::test]
async fn test_index_renders_controls() {
    let (server, _) = setup(answering("a"), 1024);

    let response = server.get("/").await;
    response.assert_status_ok();
    let page = response.text();
    assert!(page.contains("AllyBot"));
    assert!(page.contains(r#"accept=".pdf,.docx,.txt""#));
    assert!(page.contains(r#"id="typing""#));
}

#[tokio::test]
async fn test_ask_appends_to_log() {
    let (server, client) = setup(answering("It is a <b>policy</b> document."), 1024);

    let response = server
        .post("/chat/ask")
        .json(&json!({ "question": "What is this?" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<AskResponse>().outcome, AskOutcome::Answered);
    assert!(!client.is_pending());

    let fragment = server.get("/chat/messages").await.text();
    assert!(fragment.contains("What is this?"));
    assert!(fragment.contains("It is a &lt;b&gt;policy&lt;/b&gt; document."));
    assert!(fragment.find("What is this?") < fragment.find("policy"));
}

#[tokio::test]
async fn test_whitespace_question_is_ignored() {
    let (server, client) = setup(answering("never"), 1024);

    let response = server
        .post("/chat/ask")
        .json(&json!({ "question": "   " }))
        .await;

    assert_eq!(response.json::<AskResponse>().outcome, AskOutcome::Ignored);
    assert!(client.messages().is_empty());
}

#[tokio::test]
async fn test_upload_relays_file() {
    let backend = answering("a");
    let (server, client) = setup(Arc::clone(&backend), 1024 * 1024);

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"%PDF-1.4".to_vec())
            .file_name("report.pdf")
            .mime_type("application/pdf"),
    );
    let response = server.post("/chat/upload").multipart(form).await;
    response.assert_status_ok();

    let body = response.json::<UploadResponse>();
    assert_eq!(body.outcome, UploadOutcome::Uploaded);
    assert_eq!(body.file_name, "report.pdf");

    assert_eq!(
        backend.uploaded.lock().unwrap()[0],
        ("report.pdf".to_string(), "application/pdf".to_string(), 8)
    );
    let messages = client.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text(), "Indexed report.pdf");
}

#[tokio::test]
async fn test_upload_without_file_field_is_rejected() {
    let (server, client) = setup(answering("a"), 1024);

    let form = MultipartForm::new().add_text("note", "no file here");
    let response = server
        .post("/chat/upload")
        .multipart(form)
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(client.messages().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let (server, client) = setup(answering("a"), 16);

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![b'x'; 4096]).file_name("big.txt"),
    );
    let response = server
        .post("/chat/upload")
        .multipart(form)
        .expect_failure()
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(client.messages().is_empty());
}

#[tokio::test]
async fn test_session_endpoint() {
    let (server, _) = setup(answering("a"), 1024);

    let info = server.get("/api/session").await.json::<SessionInfo>();
    assert_eq!(info.session_id, "ui-session");
    assert_eq!(info.message_count, 0);
    assert!(!info.pending);

    server.get("/health").await.assert_text("ok");
}

// =============================================================================
// Over a real socket
// =============================================================================

/// Backend that takes a while to answer either call.
struct SlowBackend {
    delay: Duration,
}

#[async_trait::async_trait]
impl QaBackend for SlowBackend {
    async fn upload_document(
        &self,
        document: &Document,
        _session_id: &SessionId,
    ) -> allybot::Result<UploadReply> {
        tokio::time::sleep(self.delay).await;
        Ok(UploadReply {
            message: Some(format!("Indexed {}", document.file_name())),
        })
    }

    async fn ask_question(
        &self,
        _question: &str,
        _session_id: &SessionId,
    ) -> allybot::Result<AskReply> {
        tokio::time::sleep(self.delay).await;
        Ok(AskReply {
            answer: Some("It is a policy document.".to_string()),
        })
    }
}

/// Serve the chat router on an ephemeral port and return its base URL.
async fn serve(client: Arc<ChatClient>) -> String {
    let state = AppState {
        client,
        config: Arc::new(test_config(1024 * 1024)),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn slow_client() -> Arc<ChatClient> {
    Arc::new(ChatClient::new(
        Arc::new(SlowBackend {
            delay: Duration::from_millis(300),
        }),
        SessionId::new("slow-session"),
    ))
}

/// Wait until the log holds `len` messages and the flag is down.
async fn wait_for_log(client: &ChatClient, len: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while client.messages().len() < len || client.is_pending() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("interaction never finished");
}

fn impatient_http() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_dropped_ask_request_still_gets_bot_reply() {
    let client = slow_client();
    let url = serve(Arc::clone(&client)).await;

    let result = impatient_http()
        .post(format!("{url}/chat/ask"))
        .json(&json!({ "question": "What is this?" }))
        .send()
        .await;
    assert!(result.is_err(), "request should have been abandoned");

    wait_for_log(&client, 2).await;
    let texts: Vec<String> = client
        .messages()
        .iter()
        .map(|m| m.text().to_string())
        .collect();
    assert_eq!(texts, ["What is this?", "It is a policy document."]);
}

#[tokio::test]
async fn test_dropped_upload_request_still_gets_bot_reply() {
    let client = slow_client();
    let url = serve(Arc::clone(&client)).await;

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"%PDF".to_vec()).file_name("report.pdf"),
    );
    let result = impatient_http()
        .post(format!("{url}/chat/upload"))
        .multipart(form)
        .send()
        .await;
    assert!(result.is_err(), "request should have been abandoned");

    wait_for_log(&client, 2).await;
    assert_eq!(client.messages()[1].text(), "Indexed report.pdf");
}

/// Read the SSE body until `needle` shows up past byte `from`.
async fn read_until(
    response: &mut reqwest::Response,
    buffer: &mut String,
    from: usize,
    needle: &str,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !buffer[from..].contains(needle) {
            let chunk = response.chunk().await.unwrap().expect("stream ended");
            buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no {needle:?} in {buffer:?}"));
}

#[tokio::test]
async fn test_event_stream_opens_with_current_state() {
    let client = Arc::new(ChatClient::new(
        answering("It is a policy document."),
        SessionId::new("sse-session"),
    ));
    assert_eq!(client.ask_question("Earlier question").await, AskOutcome::Answered);
    let url = serve(Arc::clone(&client)).await;

    let mut response = reqwest::get(format!("{url}/chat/events")).await.unwrap();
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut buffer = String::new();
    read_until(&mut response, &mut buffer, 0, "event: pending\ndata: false\n\n").await;
    assert!(buffer.starts_with("event: snapshot\n"), "got {buffer:?}");
    assert!(buffer.contains("Earlier question"));
    assert!(buffer.contains("It is a policy document."));

    // Later appends arrive as individual messages.
    let snapshot_len = buffer.len();
    assert_eq!(client.ask_question("Later question").await, AskOutcome::Answered);
    read_until(&mut response, &mut buffer, snapshot_len, "event: pending\ndata: false\n\n").await;
    let live = &buffer[snapshot_len..];
    assert!(live.contains("event: message\ndata: "));
    assert!(live.contains("Later question"));
    assert!(!live.contains("Earlier question"));
}
