//! The chat session client.
//!
//! [`ChatClient`] owns the session identifier, the message log and the
//! pending-interaction flag, and drives the two exchanges with the backend.
//! Failures never escape an interaction: they become bot messages in the log
//! and an outcome value for the caller.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::backend::QaBackend;
use crate::document::Document;
use crate::error::Result;
use crate::markup::{BotTextTrust, PlainText, TrustedMarkup, escape_html};
use crate::session::{
    IdGenerator, KeyValueStore, Message, MessageBody, MessageLog, Sender, SessionId,
    get_or_create_session_id,
};

/// Bot message appended when an upload request fails.
pub const UPLOAD_FAILED_MESSAGE: &str = "❌ File upload failed. Try again.";

/// Bot message appended when an ask request fails.
pub const ASK_FAILED_MESSAGE: &str = "❌ Failed to get an answer.";

/// Bot message appended when the upload reply carries no message.
pub const UPLOAD_FALLBACK_MESSAGE: &str =
    "The uploaded document does not belong to our organization";

/// Bot message appended when the ask reply carries no answer.
pub const ASK_FALLBACK_MESSAGE: &str = "🤖 No answer found.";

/// How an upload interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Backend replied with a message.
    Uploaded,
    /// Backend replied without a message; the fallback was logged.
    EmptyReply,
    /// Request failed; the failure message was logged.
    Failed,
}

/// How an ask interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskOutcome {
    /// Question was empty or whitespace; nothing logged or sent.
    Ignored,
    /// Another question is outstanding; nothing logged or sent.
    Busy,
    /// Backend replied with an answer.
    Answered,
    /// Backend replied without an answer; the fallback was logged.
    EmptyReply,
    /// Request failed; the failure message was logged.
    Failed,
}

/// Stateful chat client for one session.
///
/// Safe to share behind an [`Arc`]; an upload and a question may be in flight
/// at the same time and their replies land in the log in receipt order.
pub struct ChatClient {
    backend: Arc<dyn QaBackend>,
    session_id: SessionId,
    log: MessageLog,
    pending: AtomicBool,
    trust: BotTextTrust,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("session_id", &self.session_id)
            .field("messages", &self.log.len())
            .field("pending", &self.is_pending())
            .field("trust", &self.trust)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Create a client with an empty log.
    pub fn new(backend: Arc<dyn QaBackend>, session_id: SessionId) -> Self {
        Self {
            backend,
            session_id,
            log: MessageLog::new(),
            pending: AtomicBool::new(false),
            trust: BotTextTrust::default(),
        }
    }

    /// Create a client whose session id comes from client-local storage.
    pub fn from_store(
        backend: Arc<dyn QaBackend>,
        store: &dyn KeyValueStore,
        ids: &dyn IdGenerator,
    ) -> Result<Self> {
        let session_id = get_or_create_session_id(store, ids)?;
        Ok(Self::new(backend, session_id))
    }

    /// Choose how backend text is rendered.
    #[must_use]
    pub fn with_trust(mut self, trust: BotTextTrust) -> Self {
        self.trust = trust;
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn trust(&self) -> BotTextTrust {
        self.trust
    }

    /// The shared message log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Snapshot of the log in display order.
    pub fn messages(&self) -> Vec<Message> {
        self.log.messages()
    }

    /// Whether a question is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Upload a document and log the exchange.
    ///
    /// The user-side description is logged before the request goes out.
    pub async fn upload_document(&self, document: &Document) -> UploadOutcome {
        self.log
            .append(Message::user_markup(upload_description(document.file_name())));

        info!(
            name: "chat.upload.sent",
            session_id = %self.session_id,
            file_name = %document.file_name(),
            size = document.len(),
            "Uploading document"
        );

        match self
            .backend
            .upload_document(document, &self.session_id)
            .await
        {
            Ok(reply) => {
                let outcome = if let Some(text) = reply.non_empty_message() {
                    self.log.append(Message::bot(text, self.trust));
                    UploadOutcome::Uploaded
                } else {
                    self.append_notice(UPLOAD_FALLBACK_MESSAGE);
                    UploadOutcome::EmptyReply
                };
                info!(
                    name: "chat.upload.completed",
                    session_id = %self.session_id,
                    outcome = ?outcome,
                    "Upload completed"
                );
                outcome
            }
            Err(e) => {
                error!(
                    name: "chat.upload.failed",
                    session_id = %self.session_id,
                    error = %e,
                    "Upload failed"
                );
                self.append_notice(UPLOAD_FAILED_MESSAGE);
                UploadOutcome::Failed
            }
        }
    }

    /// Ask a question and log the exchange.
    ///
    /// Whitespace-only input is ignored. While a previous question is
    /// outstanding, new questions are rejected as [`AskOutcome::Busy`].
    pub async fn ask_question(&self, question: &str) -> AskOutcome {
        if question.trim().is_empty() {
            return AskOutcome::Ignored;
        }

        let Some(_pending) = PendingGuard::acquire(self) else {
            warn!(
                name: "chat.ask.busy",
                session_id = %self.session_id,
                "Question rejected while another is outstanding"
            );
            return AskOutcome::Busy;
        };

        self.log.append(Message::user_text(question));

        info!(
            name: "chat.ask.sent",
            session_id = %self.session_id,
            question_length = question.len(),
            "Asking question"
        );

        match self.backend.ask_question(question, &self.session_id).await {
            Ok(reply) => {
                let outcome = if let Some(answer) = reply.non_empty_answer() {
                    self.log.append(Message::bot(answer, self.trust));
                    AskOutcome::Answered
                } else {
                    self.append_notice(ASK_FALLBACK_MESSAGE);
                    AskOutcome::EmptyReply
                };
                info!(
                    name: "chat.ask.answered",
                    session_id = %self.session_id,
                    outcome = ?outcome,
                    "Question answered"
                );
                outcome
            }
            Err(e) => {
                error!(
                    name: "chat.ask.failed",
                    session_id = %self.session_id,
                    error = %e,
                    "Ask failed"
                );
                self.append_notice(ASK_FAILED_MESSAGE);
                AskOutcome::Failed
            }
        }
    }

    /// Append a client-authored bot message.
    fn append_notice(&self, text: &str) {
        self.log.append(Message::new(
            Sender::Bot,
            MessageBody::Plain(PlainText::new(text)),
        ));
    }
}

/// Client-built markup describing an uploaded file.
pub fn upload_description(file_name: &str) -> TrustedMarkup {
    TrustedMarkup::new(format!(
        r#"<strong><span style="font-size: 18px;">📄 Uploaded:</span></strong> <i>{}</i>"#,
        escape_html(file_name)
    ))
}

/// Holds the pending flag; releasing it on drop covers every exit path.
struct PendingGuard<'a> {
    client: &'a ChatClient,
}

impl<'a> PendingGuard<'a> {
    fn acquire(client: &'a ChatClient) -> Option<Self> {
        client
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        client.log.notify_pending(true);
        Some(Self { client })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.client.pending.store(false, Ordering::Release);
        self.client.log.notify_pending(false);
    }
}
