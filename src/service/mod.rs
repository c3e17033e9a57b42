pub mod chat_session;

pub use chat_session::{ChatEvent, ChatSession, FALLBACK_REPLY};
