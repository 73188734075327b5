//! Wire types for the Backend Q&A Service.

use serde::{Deserialize, Serialize};

/// Multipart field carrying the document bytes.
pub const UPLOAD_FILE_FIELD: &str = "file";

/// Multipart field carrying the session identifier.
pub const UPLOAD_SESSION_FIELD: &str = "session_id";

/// JSON body of `POST /ask`.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
    pub session_id: &'a str,
}

/// Response of `POST /ask`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AskReply {
    #[serde(default)]
    pub answer: Option<String>,
}

impl AskReply {
    /// The answer, if the backend supplied a non-empty one.
    pub fn non_empty_answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|a| !a.is_empty())
    }
}

/// Response of `POST /upload`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadReply {
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadReply {
    /// The message, if the backend supplied a non-empty one.
    pub fn non_empty_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_request_shape() {
        let req = AskRequest {
            question: "What is this?",
            session_id: "abc",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "question": "What is this?", "session_id": "abc" })
        );
    }

    #[test]
    fn test_replies_tolerate_missing_and_extra_fields() {
        let reply: AskReply = serde_json::from_str(r#"{"sources": []}"#).unwrap();
        assert_eq!(reply.non_empty_answer(), None);

        let reply: UploadReply = serde_json::from_str(r#"{"message": ""}"#).unwrap();
        assert_eq!(reply.non_empty_message(), None);

        let reply: UploadReply =
            serde_json::from_str(r#"{"message": "Indexed report.pdf", "chunks": 4}"#).unwrap();
        assert_eq!(reply.non_empty_message(), Some("Indexed report.pdf"));
    }

    #[test]
    fn test_non_object_reply_is_rejected() {
        assert!(serde_json::from_str::<AskReply>("[1, 2]").is_err());
        assert!(serde_json::from_str::<AskReply>(r#"{"answer": 42}"#).is_err());
    }
}
