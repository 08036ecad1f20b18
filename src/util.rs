//! Shared plumbing: tracing/env setup, the parsed upstream target, the
//! per-process application state, and the JSON error body helper.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use tracing_subscriber::{fmt, EnvFilter};

use crate::keys::ApiKeys;

/// Initialize dotenv and structured tracing based on RUST_LOG.
///
/// An explicit env file can be pointed at via ENV_FILE; otherwise standard
/// `.env` discovery applies. Already-set process variables are never
/// overwritten. The source used is logged once tracing is up.
pub fn init_tracing() {
    let mut env_source: String = "none".into();

    if let Ok(p) = std::env::var("ENV_FILE") {
        let p = p.trim();
        if !p.is_empty() && std::path::Path::new(p).is_file() && dotenvy::from_filename(p).is_ok() {
            env_source = p.to_string();
        }
    }
    if env_source == "none" && dotenvy::dotenv().is_ok() {
        env_source = ".env".into();
    }

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// The single upstream target every request is relayed to.
///
/// Only scheme and authority are taken from the configured URL; the inbound
/// request's own path and query are appended verbatim.
#[derive(Debug, Clone)]
pub struct Upstream {
    origin: String,
    authority: String,
}

impl Upstream {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let url = reqwest::Url::parse(raw)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("upstream URL has no host: {raw}"))?;
        // Default ports are omitted from the authority, matching what a
        // client talking to the upstream directly would send as Host.
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let origin = format!("{}://{}", url.scheme(), authority);
        Ok(Self { origin, authority })
    }

    /// host[:port], the value forced into the forwarded `Host` header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Full upstream URL for an inbound path-and-query.
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.origin, path_and_query)
    }
}

/// Shared application state used by the HTTP server and handlers.
///
/// Everything here is read-only after startup, so it crosses request tasks
/// without synchronization.
pub struct AppState {
    pub http: reqwest::Client,
    pub keys: ApiKeys,
    pub upstream: Upstream,
}

impl AppState {
    pub fn new(keys: ApiKeys, upstream: Upstream) -> Self {
        Self {
            http: build_http_client(),
            keys,
            upstream,
        }
    }
}

/// Build the upstream HTTP client.
///
/// No request timeout is set: streaming completions are long-lived and the
/// proxy inherits whatever limits the two connection legs impose.
pub fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(format!("llamagate/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Build a JSON error response `{"error": "<message>"}` with the given status.
/// These are the only bodies the proxy originates itself.
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message }))
}
