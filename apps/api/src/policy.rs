use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::errors::AppError;

/// Answers whether a caller's credential carries write privileges.
///
/// Carried in `AccessPolicy` as `Arc<dyn Authorizer>`.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn is_elevated(&self, credential: Option<&str>) -> bool;
}

/// Recognises one configured bearer token as elevated. With no token
/// configured nobody is.
pub struct TokenAuthorizer {
    token: Option<String>,
}

impl TokenAuthorizer {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl Authorizer for TokenAuthorizer {
    async fn is_elevated(&self, credential: Option<&str>) -> bool {
        match (&self.token, credential) {
            (Some(expected), Some(given)) => constant_time_eq(expected.as_bytes(), given.as_bytes()),
            _ => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Read is open to everyone, write requires an elevated credential.
#[derive(Clone)]
pub struct AccessPolicy {
    authorizer: Arc<dyn Authorizer>,
}

impl AccessPolicy {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }

    pub async fn permits(&self, method: &Method, credential: Option<&str>) -> bool {
        if is_safe(method) {
            return true;
        }
        self.authorizer.is_elevated(credential).await
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Router middleware applying the policy to every request.
pub async fn enforce_access(
    State(policy): State<AccessPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let credential = bearer_token(request.headers()).map(str::to_string);
    if policy.permits(&method, credential.as_deref()).await {
        next.run(request).await
    } else {
        warn!(%method, path = %request.uri().path(), "write denied");
        AppError::Forbidden.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn policy(token: Option<&str>) -> AccessPolicy {
        AccessPolicy::new(Arc::new(TokenAuthorizer::new(token.map(str::to_string))))
    }

    #[tokio::test]
    async fn test_reads_are_always_permitted() {
        let policy = policy(None);
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(policy.permits(&method, None).await);
        }
    }

    #[tokio::test]
    async fn test_writes_need_the_admin_token() {
        let policy = policy(Some("secret"));
        assert!(!policy.permits(&Method::POST, None).await);
        assert!(!policy.permits(&Method::DELETE, Some("guess")).await);
        assert!(policy.permits(&Method::PATCH, Some("secret")).await);
    }

    #[tokio::test]
    async fn test_no_configured_token_means_read_only() {
        let policy = policy(Some(""));
        assert!(!policy.permits(&Method::PUT, Some("")).await);
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        assert_eq!(bearer_token(&headers), Some("secret"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic c2VjcmV0"));
        assert_eq!(bearer_token(&headers), None);
    }
}
