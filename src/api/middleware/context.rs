//! Request context resolution from bearer tokens

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

use crate::api::state::AppState;
use crate::domain::RequestContext;

/// Resolve the caller once per request and stash the context in the extensions
///
/// Never rejects: anything short of a valid access token for an active user
/// leaves the request anonymous, and the handlers decide.
pub async fn request_context_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let ctx = match extract_bearer_token(request.headers()) {
        Some(token) => state.auth.authenticate(&token).await,
        None => RequestContext::anonymous(),
    };

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

/// Extractor handing the resolved context to a handler
#[derive(Debug, Clone)]
pub struct Context(pub RequestContext);

impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Context(
            parts
                .extensions
                .get::<RequestContext>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

/// Token from `Authorization: Bearer <token>`, if well formed
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers("Bearer eyJhbGciOiJIUzI1NiJ9.test")),
            Some("eyJhbGciOiJIUzI1NiJ9.test".to_string())
        );
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_invalid_auth_scheme() {
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
    }

    #[test]
    fn test_trimmed_and_empty_tokens() {
        assert_eq!(
            extract_bearer_token(&headers("Bearer   token-with-spaces   ")),
            Some("token-with-spaces".to_string())
        );
        assert_eq!(extract_bearer_token(&headers("Bearer    ")), None);
    }
}
