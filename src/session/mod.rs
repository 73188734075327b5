//! Session identity and the chat message log.
//!
//! # Architecture
//!
//! - [`SessionId`]: opaque client-generated identifier, persisted through a
//!   [`KeyValueStore`] and created once per storage scope
//! - [`MessageLog`]: append-only, shared log of [`Message`]s with change
//!   notifications for the UI
//!
//! # Example
//!
//! ```rust
//! use allybot::session::{MemoryStore, MessageLog, Message, UuidGenerator, get_or_create_session_id};
//!
//! let store = MemoryStore::new();
//! let id = get_or_create_session_id(&store, &UuidGenerator).unwrap();
//! assert_eq!(id, get_or_create_session_id(&store, &UuidGenerator).unwrap());
//!
//! let log = MessageLog::new();
//! log.append(Message::user_text("Hello!"));
//! assert_eq!(log.len(), 1);
//! ```

mod identity;
mod log;

pub use identity::{
    FileStore, IdGenerator, KeyValueStore, MemoryStore, SESSION_ID_KEY, SessionId, UuidGenerator,
    get_or_create_session_id,
};
pub use log::{LogEvent, Message, MessageBody, MessageLog, Sender};
