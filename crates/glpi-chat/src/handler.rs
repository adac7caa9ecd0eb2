use chrono::Local;
use glpi_client::{GlpiClient, GlpiConfig, Ticket, TicketService};
use tracing::{debug, info, warn};

use crate::intent::{classify, mentions_tickets, TicketAction, TicketRef};
use crate::llm::{LlmBackend, LlmError};
use crate::model::{ChatMetadata, ChatRequest, ChatResponse};
use crate::prompt::ChatPrompt;

const RECENT_TICKET_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("llm backend failed: {0}")]
    Llm(#[from] LlmError),
}

/// Opens a fresh ticket-service client; one per chat request, so session
/// tokens are never shared between requests.
pub trait TicketServiceFactory: Send + Sync {
    fn open(&self) -> Box<dyn TicketService>;
}

/// Connects to a real GLPI instance, reusing one HTTP connection pool.
#[derive(Debug, Clone)]
pub struct GlpiConnector {
    config: GlpiConfig,
    http: reqwest::Client,
}

impl GlpiConnector {
    pub fn new(config: GlpiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

impl TicketServiceFactory for GlpiConnector {
    fn open(&self) -> Box<dyn TicketService> {
        Box::new(GlpiClient::with_http(self.config.clone(), self.http.clone()))
    }
}

pub struct ChatService<F> {
    tickets: F,
    llm: LlmBackend,
    http: reqwest::Client,
}

impl<F: TicketServiceFactory> ChatService<F> {
    pub fn new(tickets: F, llm: LlmBackend) -> Self {
        Self {
            tickets,
            llm,
            http: reqwest::Client::new(),
        }
    }

    pub fn llm(&self) -> &LlmBackend {
        &self.llm
    }

    pub async fn handle_chat(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let conversation_id = request
            .conversation_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("conv_{}", Local::now().format("%Y%m%d%H%M%S")));

        let glpi_context = if mentions_tickets(&request.message) {
            self.gather_ticket_context(&request.message).await
        } else {
            None
        };

        let prompt = ChatPrompt::new(glpi_context, request.history(), &request.message);
        let response = self.llm.complete(&self.http, &prompt).await?;
        info!(
            conversation_id = %conversation_id,
            glpi_data = prompt.glpi_context.is_some(),
            source = self.llm.name(),
            "chat answered"
        );

        Ok(ChatResponse {
            response,
            conversation_id,
            metadata: ChatMetadata {
                timestamp: Local::now()
                    .naive_local()
                    .format("%Y-%m-%dT%H:%M:%S%.6f")
                    .to_string(),
                glpi_data: prompt.glpi_context.is_some(),
            },
            source: self.llm.name().to_string(),
        })
    }

    async fn gather_ticket_context(&self, message: &str) -> Option<String> {
        let mut service = self.tickets.open();
        if let Err(e) = service.init_session().await {
            warn!(error = %e, "could not open GLPI session; answering without ticket context");
            return None;
        }

        let context = match handle_ticket_action(service.as_ref(), message).await {
            Some(text) => Some(text),
            None => recent_tickets(service.as_ref()).await,
        };

        if let Err(e) = service.kill_session().await {
            warn!(error = %e, "failed to close GLPI session");
        }
        context
    }
}

/// Run the ticket action the message asks for and describe the outcome.
///
/// Returns `None` when the message carries no recognised action, or when a
/// listing came back empty.
pub async fn handle_ticket_action(service: &dyn TicketService, message: &str) -> Option<String> {
    match classify(message)? {
        TicketAction::Create { priority } => {
            let text = match service.create_ticket_from_message(message, priority).await {
                Ok(created) => format!("Created new ticket #{} successfully.", created.id),
                Err(e) => {
                    warn!(error = %e, "ticket creation failed");
                    format!("Failed to create ticket: {e}")
                }
            };
            Some(text)
        }
        TicketAction::Query {
            ticket: Some(TicketRef::Id(id)),
        } => {
            let text = match service.get_ticket(id).await {
                Ok(ticket) => describe_ticket(id, &ticket),
                Err(e) => {
                    debug!(id, error = %e, "ticket lookup failed");
                    format!("Could not find ticket #{id}")
                }
            };
            Some(text)
        }
        TicketAction::Query {
            ticket: Some(TicketRef::OutOfRange(digits)),
        } => Some(format!("Could not find ticket #{digits}")),
        TicketAction::Query { ticket: None } => recent_tickets(service).await,
    }
}

fn describe_ticket(id: i64, ticket: &Ticket) -> String {
    format!(
        "Ticket #{id}:\nTitle: {}\nStatus: {}\nPriority: {}\nDescription: {}",
        ticket.name_text(),
        ticket.status_text(),
        ticket.priority_text(),
        ticket.content_text(),
    )
}

async fn recent_tickets(service: &dyn TicketService) -> Option<String> {
    let tickets = match service.get_tickets(&[]).await {
        Ok(tickets) => tickets,
        Err(e) => {
            warn!(error = %e, "ticket listing failed");
            return None;
        }
    };
    if tickets.is_empty() {
        return None;
    }
    let lines: Vec<String> = tickets
        .iter()
        .take(RECENT_TICKET_LIMIT)
        .map(|t| format!("#{}: {} ({})", t.id, t.name_text(), t.status_text()))
        .collect();
    Some(format!("Recent tickets:\n{}", lines.join("\n")))
}
