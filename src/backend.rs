use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const CHAT_PATH: &str = "/api/chat";
const ANALYZE_PATH: &str = "/api/analyze-github-repo";

/// Failure of a backend call. Both kinds are absorbed at the UI boundary
/// and replaced by the fixed fallback message; the detail only reaches the
/// log.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend returned status {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    repo_url: &'a str,
    question: &'a str,
}

#[derive(Deserialize)]
struct BackendResponse {
    response: String,
}

/// HTTP client for the chat/analysis backend. Stateless apart from the
/// shared connection pool; no retry, no timeout.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// POST the user's message to `/api/chat` and return the `response`
    /// field of the JSON body.
    pub async fn send_chat(&self, message: &str) -> Result<String, BackendError> {
        let url = format!("{}{}", self.base_url, CHAT_PATH);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let body: BackendResponse = response.json().await?;
        Ok(body.response)
    }

    /// POST a repository URL and question to `/api/analyze-github-repo`.
    /// Same wire contract as `send_chat`, distinct path and body.
    pub async fn send_analysis(
        &self,
        repo_url: &str,
        question: &str,
    ) -> Result<String, BackendError> {
        let url = format!("{}{}", self.base_url, ANALYZE_PATH);

        let response = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { repo_url, question })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let body: BackendResponse = response.json().await?;
        Ok(body.response)
    }
}
