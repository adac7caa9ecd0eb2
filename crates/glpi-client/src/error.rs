#[derive(Debug, thiserror::Error)]
pub enum GlpiError {
    #[error("No active session")]
    NoSession,
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GLPI returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Empty response from server")]
    EmptyResponse,
    #[error("invalid response from GLPI: {0}")]
    InvalidResponse(String),
}

impl GlpiError {
    /// True for a `404` from GLPI, i.e. the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GlpiError::Http { status: 404, .. })
    }
}
