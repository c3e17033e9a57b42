//! Client library for the OmniRead reading assistant: agent provisioning,
//! device-local state, and the streaming chat session with its line-oriented
//! event decoding.

pub mod agent;
pub mod errors;
pub mod models;
pub mod service;
pub mod storage;
pub mod stream;

pub use agent::AgentClient;
pub use errors::AgentError;
pub use models::{AssistantPreset, ChatMessage, MessageRole};
pub use service::chat_session::{ChatEvent, ChatSession, FALLBACK_REPLY};
pub use storage::DeviceStore;
