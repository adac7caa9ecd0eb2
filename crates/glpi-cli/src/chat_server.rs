//! HTTP front end for the chat assistant.
//!
//! Routes:
//! - `POST /chat`: answer a [`ChatRequest`]
//! - `GET /health`: liveness plus configuration status
//! - `OPTIONS *`: CORS preflight
//!
//! Every response carries permissive CORS headers. Handler failures are
//! logged with detail and answered with a generic 500.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use glpi_chat::llm::{default_ollama_host, normalize_ollama_host, timeout_from_secs};
use glpi_chat::{ChatRequest, ChatService, GlpiConnector, LlmBackend, OllamaConfig};
use glpi_client::GlpiConfig;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::ServeArgs;

struct ServerConfig {
    listen: SocketAddr,
    ready_file: Option<PathBuf>,
    glpi: GlpiConfig,
    llm: LlmBackend,
}

struct ServerState {
    chat: ChatService<GlpiConnector>,
}

pub(crate) fn cmd_serve(args: ServeArgs) -> Result<()> {
    let glpi = GlpiConfig::from_env().context("failed to load GLPI configuration")?;
    info!(url = glpi.url(), "GLPI configuration loaded");

    let llm = if args.llm_mock {
        LlmBackend::Mock
    } else {
        let host = args
            .llm_ollama_host
            .as_deref()
            .map(normalize_ollama_host)
            .unwrap_or_else(default_ollama_host);
        LlmBackend::Ollama(OllamaConfig {
            host,
            model: args.llm_model.clone(),
            temperature: args.llm_temperature,
            timeout: timeout_from_secs(args.llm_timeout_secs),
        })
    };

    let config = ServerConfig {
        listen: args.listen,
        ready_file: args.ready_file.clone(),
        glpi,
        llm,
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;

    rt.block_on(async move { serve_async(config).await })
}

async fn serve_async(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| anyhow!("serve: failed to bind {}: {e}", config.listen))?;
    let bound = listener
        .local_addr()
        .map_err(|e| anyhow!("serve: failed to read bound addr: {e}"))?;

    info!(
        addr = %bound,
        llm = config.llm.name(),
        model = config.llm.model(),
        "chat server listening"
    );
    if let Some(path) = config.ready_file.as_ref() {
        write_ready_file(path, bound);
    }

    let state = Arc::new(ServerState {
        chat: ChatService::new(GlpiConnector::new(config.glpi), config.llm),
    });

    loop {
        let (stream, _peer) = listener
            .accept()
            .await
            .map_err(|e| anyhow!("serve: accept failed: {e}"))?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                warn!(error = %e, "connection error");
            }
        });
    }
}

fn write_ready_file(path: &Path, bound: SocketAddr) {
    let payload = serde_json::json!({
        "version": "glpi_assist_ready_v1",
        "addr": bound.to_string(),
        "pid": std::process::id(),
    });
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let body = serde_json::to_string_pretty(&payload).unwrap_or_default();
    if let Err(e) = std::fs::write(path, body) {
        warn!(path = %path.display(), error = %e, "failed to write ready file");
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let resp = match (method, path.as_str()) {
        (Method::OPTIONS, _) => text_response(StatusCode::OK, "OK"),
        (Method::GET, "/health") => json_response(
            StatusCode::OK,
            &serde_json::json!({ "status": "healthy", "glpi_config": "loaded" }),
        ),
        (Method::POST, "/chat") => {
            let body = req.into_body().collect().await?.to_bytes();
            handle_chat(&state, &body).await
        }
        (_, "/chat") | (_, "/health") => {
            json_error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
        }
        _ => json_error(StatusCode::NOT_FOUND, "not found"),
    };

    Ok(with_cors(resp))
}

async fn handle_chat(state: &ServerState, body: &[u8]) -> Response<Full<Bytes>> {
    let request: ChatRequest = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            return json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                &format!("failed to parse chat request JSON: {e}"),
            );
        }
    };
    match state.chat.handle_chat(request).await {
        Ok(resp) => json_response(StatusCode::OK, &resp),
        Err(e) => {
            error!(error = %e, "error in chat endpoint");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

fn with_cors(mut resp: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let headers = resp.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    resp
}

fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"internal error"))))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{\"error\":\"serialize\"}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{\"error\":\"internal\"}"))))
}

fn json_error(status: StatusCode, msg: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": msg }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_headers_are_added() {
        let resp = with_cors(json_error(StatusCode::NOT_FOUND, "not found"));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }
}
