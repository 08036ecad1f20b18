//! Request forwarding: auth gate, path classification, and the relay itself.
//!
//! Chat-completion requests are buffered so their `messages` array can be
//! sanitized before going upstream; every other request streams through
//! without touching the body. Responses stream back to the client on both
//! paths, with status and headers relayed as they arrived.

use actix_web::http::header as inbound_header;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures_util::{StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::auth::authenticate;
use crate::headers::{forward_headers, is_hop_by_hop};
use crate::sanitize::sanitize_messages;
use crate::util::{error_response, AppState};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Route wiring: every method and path funnels into the forwarder.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.default_service(web::to(forward));
}

/// A request is a chat-completion request iff its path contains
/// `/v1/chat/completions` as a segment, trailing components allowed.
fn is_chat_completions(path: &str) -> bool {
    let mut haystack = path;
    while let Some(at) = haystack.find(CHAT_COMPLETIONS_PATH) {
        let rest = &haystack[at + CHAT_COMPLETIONS_PATH.len()..];
        if rest.is_empty() || rest.starts_with('/') {
            return true;
        }
        // A non-boundary hit like `/v1/chat/completionsx` must not mask a
        // later segment-aligned occurrence.
        haystack = &haystack[at + 1..];
    }
    false
}

fn path_and_query(req: &HttpRequest) -> &str {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.path())
}

// actix and reqwest sit on different `http` generations; reqwest's types
// are the http 1 ones, so the method is rebuilt from its token.
fn outbound_method(req: &HttpRequest) -> Result<http::Method, actix_web::Error> {
    http::Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(actix_web::error::ErrorInternalServerError)
}

async fn forward(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, actix_web::Error> {
    if !authenticate(req.headers(), &state.keys) {
        return Ok(error_response(StatusCode::UNAUTHORIZED, "Unauthorized"));
    }

    let headers = forward_headers(req.headers(), state.upstream.authority());

    if is_chat_completions(req.path()) {
        forward_buffered(&state, &req, payload, headers).await
    } else {
        forward_streaming(&state, &req, payload, headers).await
    }
}

/// Buffered-rewrite path for chat-completion requests.
///
/// The body must be complete before it can be parsed and rewritten; this is
/// the one deliberate exception to the otherwise streaming design, and no
/// size cap is applied. Payloads the sanitizer leaves untouched, including
/// anything that fails to parse as JSON, are forwarded byte-identical.
async fn forward_buffered(
    state: &AppState,
    req: &HttpRequest,
    mut payload: web::Payload,
    mut headers: http::HeaderMap,
) -> Result<HttpResponse, actix_web::Error> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        body.extend_from_slice(&chunk?);
    }
    let body = body.freeze();

    let outbound = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(mut parsed) => {
            let scrubbed = sanitize_messages(&mut parsed);
            if scrubbed > 0 {
                debug!(scrubbed, "sanitized chat-completion payload");
                match serde_json::to_vec(&parsed) {
                    Ok(rewritten) => Bytes::from(rewritten),
                    Err(err) => {
                        warn!(error = %err, "failed to re-serialize sanitized payload; forwarding original");
                        body
                    }
                }
            } else {
                body
            }
        }
        Err(err) => {
            // Malformed input is never rejected here; the upstream gets the
            // raw bytes and produces its own error.
            debug!(error = %err, "chat-completion body is not valid JSON; forwarding unmodified");
            body
        }
    };

    // The inbound length is stale once the body may have been rewritten.
    headers.remove(http::header::CONTENT_LENGTH);

    let method = outbound_method(req)?;
    let url = state.upstream.url_for(path_and_query(req));
    let result = state
        .http
        .request(method, url)
        .headers(headers)
        .header(http::header::CONTENT_LENGTH, outbound.len())
        .body(outbound)
        .send()
        .await;

    match result {
        Ok(upstream) => Ok(relay_response(upstream)),
        Err(err) => {
            warn!(error = %err, "upstream request failed");
            Ok(error_response(StatusCode::BAD_GATEWAY, "Bad Gateway"))
        }
    }
}

/// Streaming passthrough for everything else: the inbound body is pumped to
/// the upstream chunk by chunk, never fully in memory.
async fn forward_streaming(
    state: &AppState,
    req: &HttpRequest,
    payload: web::Payload,
    headers: http::HeaderMap,
) -> Result<HttpResponse, actix_web::Error> {
    let method = outbound_method(req)?;
    let url = state.upstream.url_for(path_and_query(req));
    let mut outbound = state.http.request(method, url).headers(headers);

    // HTTP/1.1 signals a request body through these two headers; requests
    // without either get no outbound body at all.
    let has_body = req.headers().contains_key(inbound_header::CONTENT_LENGTH)
        || req.headers().contains_key(inbound_header::TRANSFER_ENCODING);

    if has_body {
        // actix payloads are not Send and cannot back a reqwest body
        // directly; a local pump task feeds a channel the outbound body
        // reads from. Either end going away stops the other.
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(8);
        actix_web::rt::spawn(async move {
            let mut payload = payload;
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| std::io::Error::other(e.to_string()));
                let failed = chunk.is_err();
                if tx.send(chunk).await.is_err() || failed {
                    break;
                }
            }
        });
        let body_stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        outbound = outbound.body(reqwest::Body::wrap_stream(body_stream));
    }

    match outbound.send().await {
        Ok(upstream) => Ok(relay_response(upstream)),
        Err(err) => {
            warn!(error = %err, "upstream request failed");
            Ok(error_response(StatusCode::BAD_GATEWAY, "Bad Gateway"))
        }
    }
}

/// Relay an upstream response: status verbatim, headers minus hop-by-hop and
/// stale framing, body streamed through untouched. Once this response starts
/// flushing, a mid-stream upstream error can only tear the connection down.
fn relay_response(upstream: reqwest::Response) -> HttpResponse {
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);

    for (name, value) in upstream.headers() {
        if is_hop_by_hop(name.as_str()) || name == &http::header::CONTENT_LENGTH {
            continue;
        }
        builder.append_header((name.as_str(), value.as_bytes()));
    }

    builder.streaming(
        upstream
            .bytes_stream()
            .map_err(|err| std::io::Error::other(err.to_string())),
    )
}
