use serde::{Deserialize, Serialize};

/// One prior turn of the conversation, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    /// Kept as sent; it is never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: None,
            conversation_id: None,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        self.history.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMetadata {
    pub timestamp: String,
    /// Whether GLPI context was available for this answer.
    pub glpi_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub metadata: ChatMetadata,
    /// Name of the LLM backend that produced `response`.
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_request_parses() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.history().is_empty());
        assert_eq!(req.conversation_id, None);
    }

    #[test]
    fn null_history_is_empty() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","history":null,"conversation_id":"c1"}"#)
                .unwrap();
        assert!(req.history().is_empty());
        assert_eq!(req.conversation_id.as_deref(), Some("c1"));
    }

    #[test]
    fn history_timestamps_are_optional() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","history":[
                {"role":"user","content":"a"},
                {"role":"assistant","content":"b","timestamp":"2025-01-10T09:00:00"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(req.history().len(), 2);
        assert_eq!(req.history()[1].timestamp.as_deref(), Some("2025-01-10T09:00:00"));
    }

    #[test]
    fn message_is_required() {
        assert!(serde_json::from_str::<ChatRequest>(r#"{"history":[]}"#).is_err());
    }
}
