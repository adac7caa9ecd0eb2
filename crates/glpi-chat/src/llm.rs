//! LLM backends.
//!
//! The assistant talks to a local Ollama server through its native
//! `/api/chat` endpoint (non-streaming). A deterministic `Mock` backend
//! answers from the prompt's GLPI context without any network access; it
//! backs demos and tests.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::prompt::{ChatPrompt, NO_CONTEXT};

pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
pub const OLLAMA_MODEL_ENV: &str = "OLLAMA_MODEL";
pub const LLM_TIMEOUT_SECS_ENV: &str = "GLPI_ASSIST_LLM_TIMEOUT_SECS";

pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error(
        "failed to reach ollama at {url} (is it running?): {source}. Try `ollama serve` or set OLLAMA_HOST"
    )]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("ollama http error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("ollama returned invalid JSON: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub temperature: f32,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl OllamaConfig {
    pub fn new(host: &str, model: impl Into<String>) -> Self {
        Self {
            host: normalize_ollama_host(host),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: timeout_from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.host)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_HOST, DEFAULT_MODEL)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LlmBackend {
    /// Answers with the GLPI context (or a fixed fallback) verbatim.
    Mock,
    Ollama(OllamaConfig),
}

impl LlmBackend {
    /// Reported as `source` in chat responses.
    pub fn name(&self) -> &'static str {
        match self {
            LlmBackend::Mock => "mock",
            LlmBackend::Ollama(_) => "ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            LlmBackend::Mock => "mock",
            LlmBackend::Ollama(cfg) => &cfg.model,
        }
    }

    /// Run the prompt once and return the generated text.
    pub async fn complete(
        &self,
        http: &reqwest::Client,
        prompt: &ChatPrompt,
    ) -> Result<String, LlmError> {
        match self {
            LlmBackend::Mock => Ok(mock_answer(prompt)),
            LlmBackend::Ollama(cfg) => ollama_chat(http, cfg, &prompt.render()).await,
        }
    }
}

fn mock_answer(prompt: &ChatPrompt) -> String {
    match prompt.glpi_context.as_deref() {
        Some(context) => context.to_string(),
        None => format!("{NO_CONTEXT} You said: {}", prompt.message),
    }
}

async fn ollama_chat(
    http: &reqwest::Client,
    cfg: &OllamaConfig,
    prompt: &str,
) -> Result<String, LlmError> {
    let url = cfg.chat_url();
    let body = json!({
        "model": cfg.model,
        "stream": false,
        "messages": [{ "role": "user", "content": prompt }],
        "options": { "temperature": cfg.temperature },
    });

    let mut request = http.post(&url).json(&body);
    if let Some(timeout) = cfg.timeout {
        request = request.timeout(timeout);
    }
    debug!(%url, model = %cfg.model, "calling ollama");

    let resp = request.send().await.map_err(|source| LlmError::Unreachable {
        url: url.clone(),
        source,
    })?;
    let status = resp.status();
    let text = resp.text().await.map_err(|source| LlmError::Unreachable {
        url: url.clone(),
        source,
    })?;
    if !status.is_success() {
        return Err(LlmError::Http {
            status: status.as_u16(),
            body: text,
        });
    }

    #[derive(Deserialize)]
    struct OllamaChatResponse {
        message: OllamaChatMessage,
    }

    #[derive(Deserialize)]
    struct OllamaChatMessage {
        content: String,
    }

    let out: OllamaChatResponse =
        serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    Ok(out.message.content)
}

/// Accepts `host:port`, bare hosts and full URLs; an empty value means the
/// default loopback address.
pub fn normalize_ollama_host(host: &str) -> String {
    let mut host = host.trim().to_string();
    if host.is_empty() {
        host = DEFAULT_OLLAMA_HOST.to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("http://{host}");
    }
    host.trim_end_matches('/').to_string()
}

pub fn default_ollama_host() -> String {
    normalize_ollama_host(
        &std::env::var(OLLAMA_HOST_ENV).unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string()),
    )
}

/// `0` disables the timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts_are_normalized() {
        assert_eq!(normalize_ollama_host(""), "http://127.0.0.1:11434");
        assert_eq!(normalize_ollama_host("gpu-box:11434/"), "http://gpu-box:11434");
        assert_eq!(
            normalize_ollama_host(" https://ollama.internal/ "),
            "https://ollama.internal"
        );
    }

    #[test]
    fn defaults_match_the_assistant_model() {
        let cfg = OllamaConfig::default();
        assert_eq!(cfg.model, "mistral");
        assert_eq!(cfg.temperature, 0.7);
        assert_eq!(cfg.chat_url(), "http://127.0.0.1:11434/api/chat");
        assert_eq!(cfg.timeout, Some(Duration::from_secs(120)));
        assert_eq!(timeout_from_secs(0), None);
    }

    #[tokio::test]
    async fn mock_echoes_context() {
        let http = reqwest::Client::new();
        let with_context = ChatPrompt::new(Some("Ticket #1:".to_string()), &[], "show #1");
        assert_eq!(
            LlmBackend::Mock.complete(&http, &with_context).await.unwrap(),
            "Ticket #1:"
        );

        let without = ChatPrompt::new(None, &[], "hi");
        assert_eq!(
            LlmBackend::Mock.complete(&http, &without).await.unwrap(),
            "No relevant ticket information found. You said: hi"
        );
    }
}
