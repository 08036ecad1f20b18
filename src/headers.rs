//! Header filtering for the upstream leg.
//!
//! Hop-by-hop headers are meaningful only per connection and must never be
//! relayed by a proxy; everything else passes through verbatim, duplicates
//! and value order included, with `Host` rewritten to the upstream authority.

use http::header::{HeaderName, HeaderValue, HOST};
use tracing::warn;

/// Headers that must not be forwarded on either leg (RFC 9110 §7.6.1 set).
pub const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Case-insensitive membership test against [`HOP_BY_HOP`].
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Copy inbound headers into a map for the outbound request, dropping
/// hop-by-hop headers and forcing `host` to the upstream authority.
///
/// actix-web and reqwest sit on different `http` crate generations, so
/// names and values are rebuilt from their raw bytes. A header that cannot
/// be represented on the outbound side is skipped with a warning rather
/// than failing the request.
pub fn forward_headers(
    inbound: &actix_web::http::header::HeaderMap,
    authority: &str,
) -> http::HeaderMap {
    let mut out = http::HeaderMap::new();

    for (name, value) in inbound.iter() {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            (Ok(name), Ok(value)) => {
                out.append(name, value);
            }
            _ => warn!(header = %name, "skipping unrepresentable inbound header"),
        }
    }

    match HeaderValue::from_str(authority) {
        Ok(host) => {
            out.insert(HOST, host);
        }
        Err(_) => warn!(%authority, "upstream authority is not a valid host header value"),
    }

    out
}
