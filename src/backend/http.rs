//! HTTP implementation of [`QaBackend`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use url::Url;

use super::QaBackend;
use super::types::{AskReply, AskRequest, UPLOAD_FILE_FIELD, UPLOAD_SESSION_FIELD, UploadReply};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::session::SessionId;

/// reqwest client for the Backend Q&A Service.
///
/// # Example
///
/// ```rust,no_run
/// use allybot::backend::{HttpBackend, QaBackend};
/// use allybot::session::SessionId;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = HttpBackend::new("http://localhost:8000")?;
/// let reply = backend
///     .ask_question("What is the leave policy?", &SessionId::new("abc"))
///     .await?;
/// println!("{:?}", reply.answer);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend client without a request timeout.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a backend client that gives up after `timeout`.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(base_url, builder.build()?)
    }

    /// Create a backend client with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl QaBackend for HttpBackend {
    async fn upload_document(
        &self,
        document: &Document,
        session_id: &SessionId,
    ) -> Result<UploadReply> {
        let part = Part::bytes(document.bytes().to_vec())
            .file_name(document.file_name().to_string())
            .mime_str(document.content_type())?;
        let form = Form::new()
            .part(UPLOAD_FILE_FIELD, part)
            .text(UPLOAD_SESSION_FIELD, session_id.to_string());

        let response = self
            .http
            .post(self.url("upload")?)
            .multipart(form)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn ask_question(&self, question: &str, session_id: &SessionId) -> Result<AskReply> {
        let req = AskRequest {
            question,
            session_id: session_id.as_str(),
        };
        let response = self
            .http
            .post(self.url("ask")?)
            .json(&req)
            .send()
            .await?;
        Self::handle_response(response).await
    }
}
