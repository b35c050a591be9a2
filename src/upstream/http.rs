use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{IdentityVerifier, ProjectSource, UpstreamError, VerifiedUser};
use crate::project::ProjectModel;

const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    user_id: Option<String>,
    id: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for the project management API.
#[derive(Clone)]
pub struct IdemClient {
    http: reqwest::Client,
    base_url: String,
}

impl IdemClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, url: &str, token: &str) -> Result<reqwest::Response, UpstreamError> {
        self.http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                url: url.to_string(),
                source,
            })
    }
}

async fn status_error(url: &str, response: reqwest::Response) -> UpstreamError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| format!("HTTP {}", status));
    UpstreamError::Status {
        url: url.to_string(),
        status,
        message,
    }
}

#[async_trait]
impl IdentityVerifier for IdemClient {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, UpstreamError> {
        let url = self.url("/auth/verify");
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .timeout(VERIFY_TIMEOUT)
            .send()
            .await
            .map_err(|source| {
                tracing::error!(url = %url, "User authentication verification failed: {}", source);
                UpstreamError::Request {
                    url: url.clone(),
                    source,
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let err = status_error(&url, response).await;
            tracing::warn!(status = status.as_u16(), "Token rejected by identity service");
            return Err(UpstreamError::Unauthorized(match err {
                UpstreamError::Status { message, .. } => message,
                other => other.to_string(),
            }));
        }
        if !status.is_success() {
            return Err(status_error(&url, response).await);
        }

        let body: VerifyResponse = response.json().await.map_err(|e| UpstreamError::InvalidResponse {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let user_id = body
            .user_id
            .or(body.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| UpstreamError::Unauthorized("Invalid authentication response".to_string()))?;

        Ok(VerifiedUser {
            user_id,
            email: body.email,
        })
    }
}

#[async_trait]
impl ProjectSource for IdemClient {
    async fn fetch_project(&self, project_id: &str, token: &str) -> Result<Option<ProjectModel>, UpstreamError> {
        let url = self.url(&format!("/projects/{}", project_id));
        let response = self.get(&url, token).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!(project_id, "Project not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(&url, response).await);
        }

        let project: ProjectModel = response.json().await.map_err(|e| UpstreamError::InvalidResponse {
            url: url.clone(),
            message: e.to_string(),
        })?;
        tracing::info!(project_id, name = %project.name, "Project fetched");
        Ok(Some(project))
    }

    async fn fetch_generation(&self, project_id: &str, token: &str) -> Result<Option<serde_json::Value>, UpstreamError> {
        let url = self.url(&format!("/projects/{}/generation", project_id));
        let response = self.get(&url, token).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(&url, response).await);
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| UpstreamError::InvalidResponse {
                url,
                message: e.to_string(),
            })
    }

    async fn save_generation(
        &self,
        project_id: &str,
        token: &str,
        generation: &serde_json::Value,
    ) -> Result<(), UpstreamError> {
        let url = self.url(&format!("/projects/{}/generation", project_id));
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(generation)
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let err = status_error(&url, response).await;
            tracing::error!("Error saving project generation: {}", err);
            return Err(err);
        }
        tracing::debug!(project_id, "Project generation saved");
        Ok(())
    }
}
