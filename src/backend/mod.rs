//! The Backend Q&A Service collaborator.
//!
//! The backend parses uploaded documents and answers questions against them.
//! Its behaviour is opaque here; this module only knows the two exchanges:
//!
//! - `POST /upload`: multipart `file` + `session_id`, replies `{ "message"? }`
//! - `POST /ask`: JSON `{ "question", "session_id" }`, replies `{ "answer"? }`
//!
//! Non-2xx responses and bodies that are not the expected JSON object are
//! errors.

mod http;
pub mod types;

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;
use crate::session::SessionId;

pub use http::HttpBackend;
pub use types::{AskReply, UploadReply};

/// Request/response exchanges with the Backend Q&A Service.
#[async_trait]
pub trait QaBackend: Send + Sync {
    /// Send a document for indexing under `session_id`.
    async fn upload_document(
        &self,
        document: &Document,
        session_id: &SessionId,
    ) -> Result<UploadReply>;

    /// Ask a question against the documents of `session_id`.
    async fn ask_question(&self, question: &str, session_id: &SessionId) -> Result<AskReply>;
}
