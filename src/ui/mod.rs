//! Server-rendered chat UI.
//!
//! # Structure
//!
//! - [`page`]: HTML shell and the chat page (input, send control, file picker)
//! - [`messages`]: message bubbles and the typing placeholder

pub mod messages;
pub mod page;

pub use messages::{render_log, render_message, typing_indicator};
pub use page::{chat_page, html_shell};
