//! Debug server client
//!
//! Outbound HTTP calls made by the MCP bridge. None of these calls wait on a
//! breakpoint, so they are bounded by a short request timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::ToolError;
use crate::breakpoints::{ResumeAllResponse, StatusResponse};
use crate::error::ErrorResponse;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of resuming a single breakpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    Resumed,
    /// The server's explanation, e.g. "Breakpoint 'x' not found"
    NotFound(String),
}

/// Control operations against a debug server
#[async_trait]
pub trait DebugApi: Send + Sync {
    /// Base URL, used in error messages
    fn base_url(&self) -> &str;

    async fn status(&self) -> Result<StatusResponse, ToolError>;

    async fn resume(&self, id: &str) -> Result<ResumeOutcome, ToolError>;

    async fn resume_all(&self) -> Result<usize, ToolError>;
}

/// HTTP implementation of [`DebugApi`]
#[derive(Clone)]
pub struct DebugServerClient {
    http: reqwest::Client,
    base_url: String,
}

impl DebugServerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ToolError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ToolError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn connection_error(&self, source: reqwest::Error) -> ToolError {
        ToolError::Connection {
            url: self.base_url.clone(),
            source,
        }
    }
}

#[async_trait]
impl DebugApi for DebugServerClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn status(&self) -> Result<StatusResponse, ToolError> {
        let response = self
            .http
            .get(self.url("/status"))
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        if !response.status().is_success() {
            return Err(ToolError::UnexpectedResponse(format!(
                "GET /status returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::UnexpectedResponse(format!("Invalid status body: {}", e)))
    }

    async fn resume(&self, id: &str) -> Result<ResumeOutcome, ToolError> {
        let path = format!("/resume/{}", urlencoding::encode(id));
        let response = self
            .http
            .post(self.url(&path))
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        match response.status() {
            status if status.is_success() => Ok(ResumeOutcome::Resumed),
            StatusCode::NOT_FOUND => {
                let message = match response.json::<ErrorResponse>().await {
                    Ok(body) => body.error,
                    Err(_) => format!("Breakpoint '{}' not found", id),
                };
                Ok(ResumeOutcome::NotFound(message))
            }
            status => Err(ToolError::UnexpectedResponse(format!(
                "POST {} returned {}",
                path, status
            ))),
        }
    }

    async fn resume_all(&self) -> Result<usize, ToolError> {
        let response = self
            .http
            .post(self.url("/resume-all"))
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        if !response.status().is_success() {
            return Err(ToolError::UnexpectedResponse(format!(
                "POST /resume-all returned {}",
                response.status()
            )));
        }

        let body: ResumeAllResponse = response
            .json()
            .await
            .map_err(|e| ToolError::UnexpectedResponse(format!("Invalid resume-all body: {}", e)))?;
        Ok(body.resumed)
    }
}
