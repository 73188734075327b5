//! AllyBot
//!
//! A chat-style document Q&A client: the user uploads a document and asks
//! questions about it, and both actions are relayed to a remote Backend Q&A
//! Service over HTTP.
//!
//! # Architecture
//!
//! - **Client**: [`client::ChatClient`] owns the session id, the message log
//!   and the pending-interaction flag
//! - **Backend**: [`backend::QaBackend`] with an HTTP implementation
//! - **Server**: Axum server rendering the chat page and relaying UI actions,
//!   with SSE for live log updates
//!
//! # Modules
//!
//! - [`backend`]: Backend Q&A Service trait and HTTP client
//! - [`client`]: The chat session client
//! - [`session`]: Session identity and the message log
//! - [`markup`]: Plain-text vs trusted-markup rendering
//! - [`ui`]: HTML rendering

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod backend;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod markup;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod ui;

use std::sync::Arc;

use crate::client::ChatClient;
use crate::config::AppConfig;

pub use error::{Error, Result};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The chat session client.
    pub client: Arc<ChatClient>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
