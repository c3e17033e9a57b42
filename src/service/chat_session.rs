use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::agent::AgentClient;
use crate::errors::AgentError;
use crate::models::{ChatMessage, MessageRole};
use crate::storage::DeviceStore;

/// Fixed reply shown in place of the assistant's answer when an exchange
/// fails; the raw error stays in the logs.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Incremental updates mirroring the session's message-sequence mutations,
/// one event per mutation and in the same order.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A user message and its empty placeholder reply were appended.
    ExchangeStart { user: ChatMessage, assistant_id: String },
    /// A content fragment was appended to the in-flight assistant message.
    Delta { message_id: String, content: String },
    /// The exchange completed; the assistant message is final.
    ExchangeEnd { message_id: String },
    /// The exchange failed; the assistant message now holds [`FALLBACK_REPLY`].
    Failure { message_id: String, message: String },
}

struct SessionState {
    messages: Vec<ChatMessage>,
    busy: bool,
    active: Option<CancellationToken>,
}

/// One chat widget lifetime: an ordered message sequence plus at most one
/// in-flight streaming exchange.
///
/// Handles are cheap to clone and share state. Every mutation goes through
/// the session's own append/update operations under one lock, and a newer
/// `send` cancels the previous exchange under that same lock, so a
/// superseded exchange can never slip an update in behind its successor.
#[derive(Clone)]
pub struct ChatSession {
    client: AgentClient,
    store: DeviceStore,
    state: Arc<Mutex<SessionState>>,
    events: mpsc::UnboundedSender<ChatEvent>,
}

impl ChatSession {
    pub fn new(
        client: AgentClient,
        store: DeviceStore,
    ) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Self {
            client,
            store,
            state: Arc::new(Mutex::new(SessionState {
                messages: Vec::new(),
                busy: false,
                active: None,
            })),
            events,
        };
        (session, receiver)
    }

    /// Snapshot of the ordered message sequence.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().messages.clone()
    }

    /// Whether an exchange is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Cancels any in-flight exchange. Call on teardown so a released widget
    /// never receives further updates.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if let Some(token) = state.active.take() {
            debug!("Cancelling in-flight exchange on close");
            token.cancel();
        }
        state.busy = false;
    }

    /// Runs one chat exchange: appends the user message and an empty
    /// placeholder reply, streams the assistant's fragments into the
    /// placeholder, and finishes in one of the four documented ways
    /// (success, cancellation, transport failure, mid-stream failure).
    ///
    /// Blank input or a missing agent id is a silent no-op: no network call,
    /// no state change. Failures never propagate; the placeholder content is
    /// replaced with [`FALLBACK_REPLY`] instead.
    pub async fn send(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("Ignoring empty chat input");
            return;
        }
        let Some(agent_id) = self.store.agent_id() else {
            debug!("Ignoring chat input: no agent provisioned yet");
            return;
        };

        let user = ChatMessage::new(MessageRole::User, trimmed);
        let assistant = ChatMessage::new(MessageRole::Assistant, "");
        let assistant_id = assistant.id.clone();
        let token = CancellationToken::new();

        {
            let mut state = self.state.lock();
            if let Some(previous) = state.active.take() {
                debug!("Superseding in-flight exchange");
                previous.cancel();
            }
            state.messages.push(user.clone());
            state.messages.push(assistant);
            state.busy = true;
            state.active = Some(token.clone());
        }
        self.emit(ChatEvent::ExchangeStart { user, assistant_id: assistant_id.clone() });

        match self.run_exchange(&agent_id, trimmed, &assistant_id, &token).await {
            Ok(()) => {
                if self.conclude(&token, &assistant_id, false) {
                    self.emit(ChatEvent::ExchangeEnd { message_id: assistant_id });
                }
            }
            Err(e) if e.is_cancellation() => {
                // Superseded or closed: the partial content stays as-is and
                // the successor owns the busy flag.
                debug!("Exchange for message {assistant_id} cancelled");
            }
            Err(e) => {
                error!("Chat exchange failed: {e}");
                if self.conclude(&token, &assistant_id, true) {
                    self.emit(ChatEvent::Failure {
                        message_id: assistant_id,
                        message: FALLBACK_REPLY.to_string(),
                    });
                }
            }
        }
    }

    /// Drives the byte stream for one exchange, applying fragments in parse
    /// order until the source completes, fails, or the token is cancelled.
    async fn run_exchange(
        &self,
        agent_id: &str,
        text: &str,
        assistant_id: &str,
        token: &CancellationToken,
    ) -> Result<(), AgentError> {
        let stream = self.client.chat_stream(agent_id, text);
        tokio::pin!(stream);

        loop {
            let next = tokio::select! {
                _ = token.cancelled() => return Err(AgentError::Cancelled),
                next = stream.next() => next,
            };
            let Some(fragment) = next else {
                // Source signalled completion.
                return Ok(());
            };
            let fragment = fragment?;

            if !self.append_fragment(assistant_id, token, &fragment) {
                return Err(AgentError::Cancelled);
            }
            self.emit(ChatEvent::Delta {
                message_id: assistant_id.to_string(),
                content: fragment,
            });
        }
    }

    /// Appends one fragment to the in-flight assistant message. Reports
    /// `false` without touching state when the exchange was cancelled: the
    /// token is cancelled under this same lock, so the check cannot race a
    /// superseding `send`.
    fn append_fragment(
        &self,
        assistant_id: &str,
        token: &CancellationToken,
        fragment: &str,
    ) -> bool {
        let mut state = self.state.lock();
        if token.is_cancelled() {
            return false;
        }
        if let Some(message) = state.messages.iter_mut().find(|m| m.id == assistant_id) {
            message.content.push_str(fragment);
        }
        true
    }

    /// Clears the busy flag and the active handle if this exchange is still
    /// the session's current one, optionally swapping the placeholder
    /// content for the fallback reply. A superseded exchange leaves both
    /// flags to its successor and reports `false`.
    fn conclude(&self, token: &CancellationToken, assistant_id: &str, failed: bool) -> bool {
        let mut state = self.state.lock();
        if token.is_cancelled() {
            return false;
        }
        state.busy = false;
        state.active = None;
        if failed {
            if let Some(message) = state.messages.iter_mut().find(|m| m.id == assistant_id) {
                message.content = FALLBACK_REPLY.to_string();
            }
        }
        true
    }

    fn emit(&self, event: ChatEvent) {
        // A dropped receiver means the surrounding UI is gone; nothing to do.
        let _ = self.events.send(event);
    }
}
