//! Calls to the project management API that owns users and projects.

mod http;

pub use http::IdemClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::project::ProjectModel;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Authentication failed: {0}")]
    Unauthorized(String),
}

/// Identity returned by token verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedUser {
    pub user_id: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolve a bearer token to a user. Rejected tokens are
    /// `UpstreamError::Unauthorized`.
    async fn verify(&self, token: &str) -> Result<VerifiedUser, UpstreamError>;
}

#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// `Ok(None)` when the project does not exist.
    async fn fetch_project(&self, project_id: &str, token: &str) -> Result<Option<ProjectModel>, UpstreamError>;

    async fn fetch_generation(&self, project_id: &str, token: &str) -> Result<Option<serde_json::Value>, UpstreamError>;

    async fn save_generation(
        &self,
        project_id: &str,
        token: &str,
        generation: &serde_json::Value,
    ) -> Result<(), UpstreamError>;
}

/// Accepts `Bearer <token>` or a bare token.
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    let header = header?;
    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Some(token),
        [token] if !token.is_empty() => Some(token),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_extraction_formats() {
        assert_eq!(extract_token_from_header(Some("Bearer abc")), Some("abc"));
        assert_eq!(extract_token_from_header(Some("abc")), Some("abc"));
        assert_eq!(extract_token_from_header(Some("Basic a b")), None);
        assert_eq!(extract_token_from_header(Some("Token abc")), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(None), None);
    }
}
