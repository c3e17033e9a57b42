use thiserror::Error;

/// Top-level error for the assistant client.
/// All variants carry a human-readable message for display/logging; the chat
/// session converts every failure into a fixed fallback reply before it
/// reaches the message sequence.
#[derive(Debug, Error)]
pub enum AgentError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("No agent is provisioned for this device")]
    AgentNotProvisioned,

    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("Assistant service request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Assistant service returned HTTP {status}")]
    BadStatus { status: u16 },

    #[error("Assistant service error (code {code}): {msg}")]
    Api { code: i64, msg: String },

    // ── Streaming errors ─────────────────────────────────────────────────────
    #[error("Stream interrupted: {message}")]
    StreamInterrupted { message: String },

    #[error("Exchange cancelled")]
    Cancelled,

    // ── Storage errors ───────────────────────────────────────────────────────
    #[error("Device storage failed: {message}")]
    Storage {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AgentError {
    pub fn storage(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AgentError::Storage { message: message.into(), source: source.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AgentError::EmptyField { .. } | AgentError::AgentNotProvisioned)
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AgentError::Http(_) | AgentError::BadStatus { .. } | AgentError::Api { .. }
        )
    }
}
