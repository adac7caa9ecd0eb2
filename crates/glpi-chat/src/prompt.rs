use crate::model::ChatMessage;

/// Context line used when no GLPI data was gathered.
pub const NO_CONTEXT: &str = "No relevant ticket information found.";

/// The inputs of the assistant prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub glpi_context: Option<String>,
    pub transcript: String,
    pub message: String,
}

impl ChatPrompt {
    pub fn new(glpi_context: Option<String>, history: &[ChatMessage], message: &str) -> Self {
        Self {
            glpi_context: glpi_context.filter(|c| !c.is_empty()),
            transcript: render_transcript(history),
            message: message.to_string(),
        }
    }

    pub fn context_text(&self) -> &str {
        self.glpi_context.as_deref().unwrap_or(NO_CONTEXT)
    }

    pub fn render(&self) -> String {
        format!(
            "Assistant: I'm an IT support assistant with access to GLPI ticket system.\n\
             \n\
             GLPI Context: {context}\n\
             Chat History: {history}\n\
             User Message: {message}\n\
             \n\
             Keep responses brief and direct. If ticket information is available, reference it specifically.",
            context = self.context_text(),
            history = self.transcript,
            message = self.message,
        )
    }
}

/// `role: content` per turn, newline separated.
pub fn render_transcript(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
