use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use super::error::AppError;
use super::state::AppState;
use crate::storage::user_prefix;
use crate::upstream::{extract_token_from_header, UpstreamError};

/// The verified caller, inserted as a request extension by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    /// Raw bearer token, forwarded to the project API.
    pub token: String,
}

impl AuthUser {
    /// Whether `path` lies inside this user's storage namespace.
    pub fn owns_path(&self, path: &str) -> bool {
        path.starts_with(&user_prefix(&self.user_id)) && !path.split('/').any(|seg| seg == "..")
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let token = match extract_token_from_header(header) {
        Some(t) => t.to_string(),
        None => {
            tracing::warn!(
                "Missing authentication token for {} {}",
                request.method(),
                request.uri().path()
            );
            return Err(AppError::unauthorized("Missing authentication token"));
        }
    };

    let user = match state.identity.verify(&token).await {
        Ok(user) => user,
        Err(UpstreamError::Unauthorized(message)) => {
            tracing::warn!(
                "Authentication failed for {} {}: {}",
                request.method(),
                request.uri().path(),
                message
            );
            return Err(AppError::unauthorized(message));
        }
        Err(e) => {
            tracing::error!("Identity service unavailable: {}", e);
            return Err(AppError::unauthorized("Authentication failed"));
        }
    };

    tracing::debug!(user_id = %user.user_id, "Authenticated request");
    request.extensions_mut().insert(AuthUser {
        user_id: user.user_id,
        email: user.email,
        token,
    });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_check() {
        let user = AuthUser {
            user_id: "u1".into(),
            email: None,
            token: "t".into(),
        };
        assert!(user.owns_path("users/u1/projects/p/generated-apps/frontend-1.zip"));
        assert!(!user.owns_path("users/u2/projects/p/generated-apps/frontend-1.zip"));
        assert!(!user.owns_path("users/u1x/a.zip"));
        assert!(!user.owns_path("users/u1/../u2/a.zip"));
    }
}
