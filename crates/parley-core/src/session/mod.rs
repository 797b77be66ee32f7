//! Session module
//!
//! - `SessionStore`: append-only message storage (external in production)
//! - `MemorySessionStore`: thread-safe in-memory store
//! - `ChatSession`: per-session conversation owner that runs turns

mod chat;
mod store;

pub use chat::ChatSession;
pub use store::{MemorySessionStore, SessionStore, StoredMessage};
