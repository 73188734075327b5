//! Append-only chat message log.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::markup::{BotTextTrust, PlainText, TrustedMarkup};

/// Capacity of the change-notification channel.
///
/// Slow subscribers that fall further behind than this see a lag error and
/// should re-read the full log.
const EVENT_CAPACITY: usize = 256;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Name shown next to the message.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Bot => "AllyBot",
        }
    }
}

/// Message text with its rendering trust attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum MessageBody {
    Plain(PlainText),
    Markup(TrustedMarkup),
}

impl MessageBody {
    /// The stored text, unescaped.
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(t) => t.as_str(),
            Self::Markup(m) => m.as_str(),
        }
    }

    /// HTML ready to be placed in the page.
    pub fn to_html(&self) -> String {
        match self {
            Self::Plain(t) => t.to_html(),
            Self::Markup(m) => m.to_string(),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub body: MessageBody,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, body: MessageBody) -> Self {
        Self {
            sender,
            body,
            sent_at: Utc::now(),
        }
    }

    /// A user message rendered as escaped text.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Sender::User, MessageBody::Plain(PlainText::new(text)))
    }

    /// A user message built from client-side markup.
    pub fn user_markup(markup: TrustedMarkup) -> Self {
        Self::new(Sender::User, MessageBody::Markup(markup))
    }

    /// A bot message whose rendering follows `trust`.
    pub fn bot(text: impl Into<String>, trust: BotTextTrust) -> Self {
        let body = match trust {
            BotTextTrust::Sanitize => MessageBody::Plain(PlainText::new(text)),
            BotTextTrust::Trusted => MessageBody::Markup(TrustedMarkup::new(text)),
        };
        Self::new(Sender::Bot, body)
    }

    pub fn text(&self) -> &str {
        self.body.text()
    }
}

/// Change notification published by [`MessageLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// A message was appended at `index`.
    Appended { index: usize, message: Message },
    /// The pending-interaction flag changed.
    Pending(bool),
}

/// Shared, append-only message log.
///
/// Insertion order is display order. Clones share the same log.
#[derive(Debug, Clone)]
pub struct MessageLog {
    inner: Arc<LogInner>,
}

#[derive(Debug)]
struct LogInner {
    messages: RwLock<Vec<Message>>,
    events: broadcast::Sender<LogEvent>,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageLog {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(LogInner {
                messages: RwLock::new(Vec::new()),
                events,
            }),
        }
    }

    /// Append a message and return its index.
    pub fn append(&self, message: Message) -> usize {
        let mut guard = self
            .inner
            .messages
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let index = guard.len();
        guard.push(message.clone());
        // Published under the lock so subscribers see indices in order.
        let _ = self.inner.events.send(LogEvent::Appended { index, message });
        index
    }

    /// Publish a pending-flag change to subscribers.
    pub fn notify_pending(&self, pending: bool) {
        let _ = self.inner.events.send(LogEvent::Pending(pending));
    }

    /// Subscribe to future appends and flag changes.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.inner.events.subscribe()
    }

    /// Snapshot of all messages in display order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
