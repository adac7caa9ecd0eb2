//! Chat assistant core.
//!
//! A chat request is answered in four steps:
//!
//! 1. the message is checked for ticket vocabulary ([`intent`]);
//! 2. if present, a fresh GLPI session is opened and the ticket action
//!    (create, look up, list) is run to produce *GLPI context*;
//! 3. context, transcript and message are rendered into one prompt
//!    ([`prompt`]);
//! 4. the prompt is sent once to the configured LLM backend ([`llm`]).
//!
//! Transport (HTTP, CORS, status codes) lives in the binary; this crate
//! only knows requests and responses.

pub mod handler;
pub mod intent;
pub mod llm;
pub mod model;
pub mod prompt;

pub use handler::{ChatError, ChatService, GlpiConnector, TicketServiceFactory};
pub use intent::{classify, mentions_tickets, TicketAction, TicketRef};
pub use llm::{LlmBackend, LlmError, OllamaConfig};
pub use model::{ChatMessage, ChatMetadata, ChatRequest, ChatResponse};
pub use prompt::ChatPrompt;
