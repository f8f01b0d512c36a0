//! Bearer-token authentication for API routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::authz::Actor;
use crate::db::Database;
use crate::models::User;

/// The authenticated user, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::from(&self.user)
    }
}

/// Resolve the `Authorization: Bearer <token>` header to an approved user.
pub async fn auth_middleware(
    State(db): State<Database>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let token = bearer_token(&request)?.to_string();

    let user = db.user_for_token(&token).map_err(|e| {
        tracing::error!("Token lookup failed: {:#}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    })?;

    match user {
        Some(user) => {
            request.extensions_mut().insert(AuthUser { user, token });
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!("Invalid or expired token");
            Err((
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".to_string(),
            ))
        }
    }
}

/// Only let administrators through. Must run after [`auth_middleware`].
pub async fn admin_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let is_admin = request
        .extensions()
        .get::<AuthUser>()
        .is_some_and(|auth| auth.user.is_admin());

    if is_admin {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Non-admin request to admin route {}", request.uri().path());
        Err((
            StatusCode::FORBIDDEN,
            "Administrator access required".to_string(),
        ))
    }
}

fn bearer_token(request: &Request<Body>) -> Result<&str, (StatusCode, String)> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match header {
        Some(header) => header.strip_prefix("Bearer ").ok_or_else(|| {
            tracing::warn!("Invalid Authorization header format");
            (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            )
        }),
        None => {
            tracing::warn!("Missing Authorization header");
            Err((
                StatusCode::UNAUTHORIZED,
                "Access token required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/tree");
        if let Some(value) = header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        let request = request_with(Some("Bearer abc123"));
        assert_eq!(bearer_token(&request).unwrap(), "abc123");
    }

    #[test]
    fn rejects_missing_header() {
        let request = request_with(None);
        let (status, _) = bearer_token(&request).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rejects_other_schemes() {
        let request = request_with(Some("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&request).is_err());
    }
}
