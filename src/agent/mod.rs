use futures_util::{Stream, StreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::errors::AgentError;
use crate::models::{
    ApiEnvelope, AssistantPreset, ChatRequest, CreateAgentRequest, CreatedAgent,
};
use crate::storage::DeviceStore;
use crate::stream::{classify, LineBuffer, StreamLine};

/// Client for the OmniRead assistant service: agent provisioning plus the
/// streaming chat exchange. Cheap to clone; the authorization token is read
/// from device storage at request time and attached verbatim.
#[derive(Clone)]
pub struct AgentClient {
    http: Client,
    base_url: String,
    store: DeviceStore,
}

impl AgentClient {
    pub fn new(base_url: impl Into<String>, store: DeviceStore) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http: Client::new(), base_url, store }
    }

    /// An absent token is sent as an empty string and left for the service
    /// to reject; the client performs no refresh or validation.
    fn auth_token(&self) -> String {
        self.store.token().unwrap_or_default()
    }

    /// Registers a new agent and returns its id.
    pub async fn create_agent(&self, request: &CreateAgentRequest) -> Result<String, AgentError> {
        if request.name.trim().is_empty() {
            return Err(AgentError::EmptyField { field_name: "name".to_string() });
        }

        let url = format!("{}/v1/agents", self.base_url);
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.auth_token())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Agent creation request failed: {e}");
                AgentError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Agent creation rejected with HTTP {status}");
            return Err(AgentError::BadStatus { status: status.as_u16() });
        }

        let envelope: ApiEnvelope<CreatedAgent> = response.json().await.map_err(|e| {
            error!("Malformed agent creation response: {e}");
            AgentError::Http(e)
        })?;

        if envelope.code != 0 {
            return Err(AgentError::Api { code: envelope.code, msg: envelope.msg });
        }
        envelope
            .data
            .map(|agent| agent.id)
            .ok_or_else(|| AgentError::Unexpected("agent creation response had no id".to_string()))
    }

    /// Returns the agent id already provisioned for this device, creating
    /// one from `preset` and persisting it on first use.
    pub async fn ensure_agent(&self, preset: &AssistantPreset) -> Result<String, AgentError> {
        if let Some(id) = self.store.agent_id() {
            debug!("Reusing provisioned agent {id}");
            return Ok(id);
        }
        let id = self.create_agent(&preset.to_create_request()).await?;
        self.store.set_agent_id(&id)?;
        info!("Provisioned agent {id} from preset '{}'", preset.id);
        Ok(id)
    }

    /// Provisions a fresh agent for a newly selected persona and replaces
    /// the id stored for this device.
    pub async fn select_preset(&self, preset: &AssistantPreset) -> Result<String, AgentError> {
        let id = self.create_agent(&preset.to_create_request()).await?;
        self.store.set_agent_id(&id)?;
        info!("Switched device agent to {id} (preset '{}')", preset.id);
        Ok(id)
    }

    /// POSTs one chat turn and yields the assistant's content fragments in
    /// stream order.
    ///
    /// A non-success status fails before any body is read. `event: error`
    /// lines are logged and skipped; only a transport failure ends the
    /// stream early. A trailing line the service never terminated with a
    /// newline is discarded unparsed.
    pub fn chat_stream(
        &self,
        agent_id: &str,
        message: &str,
    ) -> impl Stream<Item = Result<String, AgentError>> + Send + 'static {
        let http = self.http.clone();
        let url = format!("{}/v1/agents/chat", self.base_url);
        let token = self.auth_token();
        let body = ChatRequest {
            agent_id: agent_id.to_string(),
            message: message.to_string(),
        };

        async_stream::stream! {
            let response = match http
                .post(&url)
                .header(AUTHORIZATION, token)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    error!("Chat request failed: {e}");
                    yield Err(AgentError::Http(e));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                error!("Chat request rejected with HTTP {status}");
                yield Err(AgentError::BadStatus { status: status.as_u16() });
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut buffer = LineBuffer::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        error!("Chat stream read failed: {e}");
                        yield Err(AgentError::StreamInterrupted { message: e.to_string() });
                        return;
                    }
                };

                for line in buffer.push(&chunk) {
                    match classify(&line) {
                        StreamLine::Data(payload) => yield Ok(payload.to_string()),
                        StreamLine::ErrorEvent => {
                            warn!("Assistant stream reported an error event");
                        }
                        StreamLine::Ignored => {}
                    }
                }
            }

            if buffer.pending() > 0 {
                debug!(
                    "Discarding {} unterminated bytes at end of stream",
                    buffer.pending()
                );
            }
        }
    }
}
