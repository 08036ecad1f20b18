//! Bearer-token authentication for inbound requests.
//!
//! The accepted shape is exactly `Authorization: Bearer <token>`: two
//! space-separated parts, the scheme literal and case-sensitive, the token a
//! member of the loaded credential set. Anything else is rejected before any
//! upstream contact.

use actix_web::http::header::{self, HeaderMap};

use crate::keys::ApiKeys;

/// Validate the `Authorization` header against the credential set.
pub fn authenticate(headers: &HeaderMap, keys: &ApiKeys) -> bool {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return false;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    let parts: Vec<&str> = value.split(' ').collect();
    parts.len() == 2 && parts[0] == "Bearer" && keys.contains(parts[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn keys() -> ApiKeys {
        ApiKeys::new(["test-key-1", "test-key-2"]).expect("keys")
    }

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(value).expect("header value"),
        );
        headers
    }

    #[test]
    fn accepts_known_token() {
        assert!(authenticate(&headers_with_auth("Bearer test-key-1"), &keys()));
        assert!(authenticate(&headers_with_auth("Bearer test-key-2"), &keys()));
    }

    #[test]
    fn rejects_unknown_token() {
        assert!(!authenticate(&headers_with_auth("Bearer wrong"), &keys()));
    }

    #[test]
    fn rejects_missing_header() {
        assert!(!authenticate(&HeaderMap::new(), &keys()));
    }

    #[test]
    fn rejects_wrong_scheme() {
        assert!(!authenticate(&headers_with_auth("Basic test-key-1"), &keys()));
        assert!(!authenticate(&headers_with_auth("bearer test-key-1"), &keys()));
    }

    #[test]
    fn rejects_malformed_shapes() {
        // Double space yields three parts.
        assert!(!authenticate(&headers_with_auth("Bearer  test-key-1"), &keys()));
        assert!(!authenticate(&headers_with_auth("Bearer"), &keys()));
        assert!(!authenticate(&headers_with_auth("Bearer a b"), &keys()));
        assert!(!authenticate(&headers_with_auth(""), &keys()));
    }

    #[test]
    fn rejects_empty_token() {
        assert!(!authenticate(&headers_with_auth("Bearer "), &keys()));
    }
}
