use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::ApiError;

/// The token from an `Authorization: Bearer <token>` header. The scheme is matched
/// case-insensitively.
pub fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::unauthorized("missing authorization header"));
    };
    let value = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("malformed authorization header"))?
        .trim();

    let (scheme, token) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::unauthorized("invalid authorization scheme"));
    }

    match token.trim() {
        "" => Err(ApiError::unauthorized("missing bearer token")),
        token => Ok(token.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn extracts_token_with_any_scheme_case() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer TOKEN123"));

        assert_eq!(require_bearer(&headers).unwrap(), "TOKEN123");
    }

    #[test]
    fn rejects_missing_header_wrong_scheme_and_empty_token() {
        let empty = HeaderMap::new();
        assert_eq!(
            require_bearer(&empty).unwrap_err().status,
            StatusCode::UNAUTHORIZED
        );

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(require_bearer(&basic)
            .unwrap_err()
            .message
            .contains("scheme"));

        let mut bare = HeaderMap::new();
        bare.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert!(require_bearer(&bare)
            .unwrap_err()
            .message
            .contains("missing bearer token"));
    }

    #[test]
    fn tolerates_extra_whitespace_and_rejects_non_ascii_headers() {
        let mut spaced = HeaderMap::new();
        spaced.insert(AUTHORIZATION, HeaderValue::from_static("  Bearer   abc.def  "));
        assert_eq!(require_bearer(&spaced).unwrap(), "abc.def");

        let mut opaque = HeaderMap::new();
        opaque.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );
        assert_eq!(
            require_bearer(&opaque).unwrap_err().message,
            "malformed authorization header"
        );
    }
}
