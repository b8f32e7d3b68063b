use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::verify_token;
use crate::config::SecurityConfig;
use crate::models::Identity;

/// Caller identity resolved for the current request; `None` when no valid
/// bearer token was presented. Operations decide whether that is an error.
#[derive(Clone, Debug, Default)]
pub struct Caller(pub Option<Identity>);

/// Resolves the bearer token (if any) into a `Caller` request extension.
/// Never rejects: a missing or invalid token yields an anonymous caller.
pub async fn resolve_identity_middleware(
    State(security): State<Arc<SecurityConfig>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = match extract_bearer(&headers) {
        Ok(Some(token)) => match verify_token(token, &security) {
            Ok(identity) => Caller(Some(identity)),
            Err(e) => {
                tracing::debug!("Ignoring bearer token: {}", e);
                Caller(None)
            }
        },
        Ok(None) => Caller(None),
        Err(msg) => {
            tracing::debug!("Ignoring Authorization header: {}", msg);
            Caller(None)
        }
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}

/// Extract the token from an `Authorization: Bearer` header
fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        Some(_) => Err("Empty bearer token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Ok(Some("abc.def")));
        assert_eq!(extract_bearer(&HeaderMap::new()), Ok(None));
        assert!(extract_bearer(&headers("Basic xyz")).is_err());
        assert!(extract_bearer(&headers("Bearer   ")).is_err());
    }
}
