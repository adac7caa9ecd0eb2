//! Session lifecycle and ticket operations.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::GlpiConfig;
use crate::error::GlpiError;
use crate::intent::TicketDraft;
use crate::ticket::{CreatedTicket, Ticket};

const APP_TOKEN_HEADER: &str = "App-Token";
const SESSION_TOKEN_HEADER: &str = "Session-Token";

#[derive(Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated {
        token: String,
    },
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Unauthenticated => f.write_str("Unauthenticated"),
            SessionState::Authenticated { .. } => f.write_str("Authenticated { .. }"),
        }
    }
}

/// The ticket-system operations the chat layer depends on.
#[async_trait]
pub trait TicketService: Send + Sync {
    /// Open a session, releasing any session already held. On failure the
    /// service stays unauthenticated.
    async fn init_session(&mut self) -> Result<(), GlpiError>;

    /// Release the session; succeeds trivially when none is open.
    async fn kill_session(&mut self) -> Result<(), GlpiError>;

    fn is_authenticated(&self) -> bool;

    /// Create a ticket from an `input` object (wrapped when not already).
    async fn create_ticket(&self, input: Value) -> Result<CreatedTicket, GlpiError>;

    async fn get_tickets(&self, filters: &[(&str, &str)]) -> Result<Vec<Ticket>, GlpiError>;

    async fn get_ticket(&self, id: i64) -> Result<Ticket, GlpiError>;

    async fn update_ticket(&self, id: i64, input: Value) -> Result<Value, GlpiError>;

    async fn create_ticket_from_message(
        &self,
        message: &str,
        priority: i64,
    ) -> Result<CreatedTicket, GlpiError> {
        let draft = TicketDraft::from_message(message, priority);
        debug!(?draft, "creating ticket from message");
        let input = serde_json::to_value(&draft)
            .map_err(|e| GlpiError::InvalidResponse(format!("unserializable ticket draft: {e}")))?;
        self.create_ticket(input).await
    }
}

pub struct GlpiClient {
    config: GlpiConfig,
    http: reqwest::Client,
    session: SessionState,
}

impl GlpiClient {
    pub fn new(config: GlpiConfig) -> Self {
        Self::with_http(config, reqwest::Client::new())
    }

    pub fn with_http(config: GlpiConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            session: SessionState::Unauthenticated,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url(), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.endpoint(path))
            .header(APP_TOKEN_HEADER, self.config.app_token())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("user_token {}", self.config.user_token()),
            );
        match &self.session {
            SessionState::Authenticated { token } => {
                builder.header(SESSION_TOKEN_HEADER, token.as_str())
            }
            SessionState::Unauthenticated => builder,
        }
    }

    fn require_session(&self) -> Result<(), GlpiError> {
        match self.session {
            SessionState::Authenticated { .. } => Ok(()),
            SessionState::Unauthenticated => Err(GlpiError::NoSession),
        }
    }
}

#[async_trait]
impl TicketService for GlpiClient {
    async fn init_session(&mut self) -> Result<(), GlpiError> {
        if let Err(e) = self.kill_session().await {
            warn!(error = %e, "failed to release previous GLPI session");
        }
        self.session = SessionState::Unauthenticated;
        let body = send(self.request(Method::GET, "initSession"), "initSession").await?;
        let reply: Value = parse_json(&body)?;
        let token = reply
            .get("session_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GlpiError::InvalidResponse("no session_token in reply".to_string()))?;
        self.session = SessionState::Authenticated {
            token: token.to_string(),
        };
        info!("GLPI session initialized");
        Ok(())
    }

    async fn kill_session(&mut self) -> Result<(), GlpiError> {
        if !self.is_authenticated() {
            return Ok(());
        }
        send(self.request(Method::GET, "killSession"), "killSession").await?;
        self.session = SessionState::Unauthenticated;
        debug!("GLPI session closed");
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        matches!(self.session, SessionState::Authenticated { .. })
    }

    async fn create_ticket(&self, input: Value) -> Result<CreatedTicket, GlpiError> {
        self.require_session()?;
        let payload = wrap_input(input);
        let body = send(self.request(Method::POST, "Ticket").json(&payload), "Ticket").await?;
        if body.trim().is_empty() {
            return Err(GlpiError::EmptyResponse);
        }
        let created: CreatedTicket = parse_json(&body)?;
        info!(id = created.id, "ticket created");
        Ok(created)
    }

    async fn get_tickets(&self, filters: &[(&str, &str)]) -> Result<Vec<Ticket>, GlpiError> {
        self.require_session()?;
        let mut query: Vec<(&str, &str)> = vec![("expand_dropdowns", "true")];
        query.extend_from_slice(filters);
        let body = send(self.request(Method::GET, "Ticket").query(&query), "Ticket").await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_json(&body)
    }

    async fn get_ticket(&self, id: i64) -> Result<Ticket, GlpiError> {
        self.require_session()?;
        let path = format!("Ticket/{id}");
        let body = send(self.request(Method::GET, &path), &path).await?;
        if body.trim().is_empty() {
            return Err(GlpiError::EmptyResponse);
        }
        parse_json(&body)
    }

    async fn update_ticket(&self, id: i64, input: Value) -> Result<Value, GlpiError> {
        self.require_session()?;
        let path = format!("Ticket/{id}");
        let payload = json!({ "input": input });
        let body = send(self.request(Method::PUT, &path).json(&payload), &path).await?;
        if body.trim().is_empty() {
            return Err(GlpiError::EmptyResponse);
        }
        parse_json(&body)
    }
}

/// Add the `{"input": ...}` envelope GLPI expects, unless already present.
fn wrap_input(input: Value) -> Value {
    match &input {
        Value::Object(map) if map.contains_key("input") => input,
        _ => json!({ "input": input }),
    }
}

async fn send(builder: RequestBuilder, endpoint: &str) -> Result<String, GlpiError> {
    let transport = |source| GlpiError::Transport {
        endpoint: endpoint.to_string(),
        source,
    };
    let resp = builder.send().await.map_err(transport)?;
    let status = resp.status();
    let body = resp.text().await.map_err(transport)?;
    if !status.is_success() {
        warn!(endpoint, status = status.as_u16(), "GLPI request failed");
        return Err(GlpiError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, GlpiError> {
    serde_json::from_str(body).map_err(|e| GlpiError::InvalidResponse(e.to_string()))
}
