//! Typed trust boundary for message text.
//!
//! Text that is rendered into the chat page is either [`PlainText`], which is
//! always escaped, or [`TrustedMarkup`], which is written out as-is. Backend
//! replies land on one side or the other according to [`BotTextTrust`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Text that must be escaped before it reaches the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlainText(String);

impl PlainText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Escaped HTML for this text.
    pub fn to_html(&self) -> String {
        escape_html(&self.0)
    }
}

/// Markup that is rendered without escaping.
///
/// Only construct this from client-built strings or from backend text when the
/// deployment explicitly trusts the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustedMarkup(String);

impl TrustedMarkup {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrustedMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How backend-provided text is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotTextTrust {
    /// Escape backend text.
    #[default]
    Sanitize,
    /// Render backend text as raw markup.
    Trusted,
}

impl BotTextTrust {
    pub fn from_flag(trust_backend_markup: bool) -> Self {
        if trust_backend_markup {
            Self::Trusted
        } else {
            Self::Sanitize
        }
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
