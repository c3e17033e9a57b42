use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in a chat session's ordered message sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persona category understood by the assistant service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Character,
    Reader,
    Historical,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Character => "character",
            AgentType::Reader => "reader",
            AgentType::Historical => "historical",
        }
    }
}

/// Dynamic agent configuration forwarded verbatim to the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub enable_internet: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_base_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
}

/// Free-form persona fields. The client never interprets these; it only
/// forwards them when provisioning an agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentProfile {
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub language: String,

    // Book-character personas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,

    // Fellow-reader personas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,

    // Historical-figure personas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_era: Option<String>,

    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

/// A selectable assistant persona offered by the surrounding UI. Picking one
/// provisions a remote agent; the chat core only ever sees the resulting id.
#[derive(Debug, Clone)]
pub struct AssistantPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: AgentType,
    pub description: &'static str,
    pub profile: AgentProfile,
}

impl AssistantPreset {
    /// The persona catalogue shipped with the client. The first entry is the
    /// default used when no agent exists for this device yet.
    pub fn builtin() -> Vec<AssistantPreset> {
        vec![
            AssistantPreset {
                id: "reader",
                label: "OmniRead Assistant",
                kind: AgentType::Reader,
                description: "Default assistant for reading help",
                profile: AgentProfile {
                    language: "Chinese".to_string(),
                    bio: "A helpful reading assistant.".to_string(),
                    ..AgentProfile::default()
                },
            },
            AssistantPreset {
                id: "character",
                label: "Book Character",
                kind: AgentType::Character,
                description: "Chats in the voice of a character from the current book",
                profile: AgentProfile {
                    language: "Chinese".to_string(),
                    bio: "Answers as a character living inside the book.".to_string(),
                    ..AgentProfile::default()
                },
            },
            AssistantPreset {
                id: "historical",
                label: "Historical Companion",
                kind: AgentType::Historical,
                description: "Discusses the book from a historical figure's perspective",
                profile: AgentProfile {
                    language: "Chinese".to_string(),
                    historical_era: Some("unspecified".to_string()),
                    bio: "Brings period context to the reading.".to_string(),
                    ..AgentProfile::default()
                },
            },
        ]
    }

    pub fn to_create_request(&self) -> CreateAgentRequest {
        CreateAgentRequest {
            name: self.label.to_string(),
            kind: self.kind,
            description: self.description.to_string(),
            config: AgentConfig { enable_internet: true, ..AgentConfig::default() },
            profile: self.profile.clone(),
        }
    }
}

// ── Wire DTOs ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CreateAgentRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentType,
    pub description: String,
    pub config: AgentConfig,
    pub profile: AgentProfile,
}

#[derive(Debug, Deserialize)]
pub struct CreatedAgent {
    pub id: String,
}

/// Body of the streaming chat POST.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub agent_id: String,
    pub message: String,
}

/// Envelope wrapping every non-streaming service response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_serializes_persona_fields() {
        let preset = &AssistantPreset::builtin()[0];
        let json = serde_json::to_value(preset.to_create_request()).unwrap();

        assert_eq!(json["type"], "reader");
        assert_eq!(json["name"], "OmniRead Assistant");
        assert_eq!(json["config"]["enable_internet"], true);
        assert_eq!(json["profile"]["language"], "Chinese");
        // Persona fields that are unset must not be serialized at all.
        assert!(json["profile"].get("book_name").is_none());
        assert!(json["profile"].get("custom_prompt").is_none());
    }

    #[test]
    fn envelope_tolerates_missing_data() {
        let envelope: ApiEnvelope<CreatedAgent> =
            serde_json::from_str(r#"{"code":40001,"msg":"unauthorized","data":null}"#).unwrap();
        assert_eq!(envelope.code, 40001);
        assert!(envelope.data.is_none());

        let envelope: ApiEnvelope<CreatedAgent> =
            serde_json::from_str(r#"{"code":0,"msg":"success","data":{"id":"a1"}}"#).unwrap();
        assert_eq!(envelope.data.unwrap().id, "a1");
    }

    #[test]
    fn message_roles_render_lowercase() {
        let message = ChatMessage::new(MessageRole::Assistant, "");
        assert!(message.content.is_empty());
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
    }
}
