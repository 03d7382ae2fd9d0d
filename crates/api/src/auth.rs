//! Bearer-token authentication for report requests.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::error::ApiError;

/// Check the `Authorization: Bearer` header against the configured
/// secret. No secret configured means auth is disabled. Rejections never
/// touch coordinator state.
///
/// # Errors
/// Returns `ApiError::Unauthorized` when the header is missing, not a
/// bearer token, or carries the wrong secret.
pub fn check_bearer(headers: &HeaderMap, secret: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = secret else {
        return Ok(());
    };

    let header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).unwrap_or("");
    match header.strip_prefix("Bearer ") {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("valid header"));
        headers
    }

    #[test]
    fn no_secret_disables_auth() {
        assert!(check_bearer(&HeaderMap::new(), None).is_ok());
    }

    #[test]
    fn matching_token_passes() {
        assert!(check_bearer(&headers_with("Bearer sesame"), Some("sesame")).is_ok());
    }

    #[test]
    fn missing_wrong_or_malformed_token_is_rejected() {
        assert!(check_bearer(&HeaderMap::new(), Some("sesame")).is_err());
        assert!(check_bearer(&headers_with("Bearer nope"), Some("sesame")).is_err());
        assert!(check_bearer(&headers_with("Basic sesame"), Some("sesame")).is_err());
    }
}
