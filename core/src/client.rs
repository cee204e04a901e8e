//! Delphi Conversation Client
//!
//! The three remote operations behind one trait, so the controller can run
//! against the real backend or an in-memory fake.
//!
//! # Delphi API
//!
//! - `POST /delphi/createConversation` `{ slug, user_email }`
//! - `POST /delphi/createMessages` `{ conversation_id, user_message }`
//! - `GET  /delphi/getConversation/{id}`
//!
//! Every call goes through the same [`RetryPolicy`]. The default makes one
//! attempt, so failures reach the caller unchanged.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::{ConversationId, Message};

/// Errors from the conversation backend
#[derive(Debug, Error)]
pub enum ClientError {
    /// No user email to create a conversation for
    #[error("user email is missing")]
    MissingEmail,

    /// Connect, timeout or body transfer failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// Response did not have the expected shape
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// Request URL could not be built from the base URL
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Whether another attempt could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Status { status, .. } => *status >= 500,
            ClientError::MissingEmail | ClientError::Decode(_) | ClientError::InvalidUrl(_) => {
                false
            }
        }
    }
}

/// A freshly created conversation
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewConversation {
    /// Server-issued id
    pub conversation_id: ConversationId,
    /// Opening transcript (usually the clone's greeting)
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Remote conversation operations
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Create a conversation for `user_email` under application `slug`
    async fn create_conversation(
        &self,
        slug: &str,
        user_email: &str,
    ) -> Result<NewConversation, ClientError>;

    /// Post a user message; the backend generates the reply
    async fn post_message(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<(), ClientError>;

    /// Fetch the full history of a conversation
    async fn fetch_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ClientError>;
}

/// Retry policy shared by all remote operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least 1
    pub attempts: u32,
    /// Pause between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ClientError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    tracing::warn!(operation, attempt, error = %e, "retrying backend call");
                    attempt += 1;
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Connection settings for [`DelphiClient`]
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Serialize)]
struct CreateConversationRequest<'a> {
    slug: &'a str,
    user_email: &'a str,
}

#[derive(Serialize)]
struct CreateMessagesRequest<'a> {
    conversation_id: &'a str,
    user_message: &'a str,
}

/// `{ "data": ... }` wrapper used by every Delphi response
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct CreatedData {
    conversation: CreatedConversation,
}

#[derive(Deserialize)]
struct CreatedConversation {
    #[serde(rename = "new")]
    created: NewConversation,
}

#[derive(Deserialize)]
struct HistoryData {
    history: Vec<Message>,
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Parse a createConversation response body
pub fn parse_create_response(body: &str) -> Result<NewConversation, ClientError> {
    let envelope: Envelope<CreatedData> = decode(body)?;
    Ok(envelope.data.conversation.created)
}

/// Parse a getConversation response body
pub fn parse_history_response(body: &str) -> Result<Vec<Message>, ClientError> {
    let envelope: Envelope<HistoryData> = decode(body)?;
    Ok(envelope.data.history)
}

/// HTTP client for the hosted Delphi backend
#[derive(Clone, Debug)]
pub struct DelphiClient {
    base_url: String,
    retry: RetryPolicy,
    http_client: reqwest::Client,
}

impl DelphiClient {
    /// Create a client
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
            http_client,
        })
    }

    /// Base URL in use
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn create_url(&self) -> String {
        format!("{}/delphi/createConversation", self.base_url)
    }

    fn messages_url(&self) -> String {
        format!("{}/delphi/createMessages", self.base_url)
    }

    /// History URL with the id as one escaped path segment
    fn conversation_url(&self, id: &ConversationId) -> Result<reqwest::Url, ClientError> {
        let base = format!("{}/delphi/getConversation", self.base_url);
        let mut url =
            reqwest::Url::parse(&base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(format!("{base}: cannot be a base")))?
            .push(id.as_str());
        Ok(url)
    }

    /// Send a request and return the body of a successful response
    async fn body_of(&self, request: reqwest::RequestBuilder) -> Result<String, ClientError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ConversationBackend for DelphiClient {
    async fn create_conversation(
        &self,
        slug: &str,
        user_email: &str,
    ) -> Result<NewConversation, ClientError> {
        if user_email.trim().is_empty() {
            return Err(ClientError::MissingEmail);
        }

        let url = self.create_url();
        let payload = CreateConversationRequest { slug, user_email };

        let body = self
            .retry
            .run("create_conversation", || {
                self.body_of(self.http_client.post(&url).json(&payload))
            })
            .await?;

        let created = parse_create_response(&body)?;
        tracing::info!(
            email = user_email,
            conversation_id = %created.conversation_id,
            "conversation created"
        );
        Ok(created)
    }

    async fn post_message(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<(), ClientError> {
        let url = self.messages_url();
        let payload = CreateMessagesRequest {
            conversation_id: conversation_id.as_str(),
            user_message: text,
        };

        self.retry
            .run("post_message", || {
                self.body_of(self.http_client.post(&url).json(&payload))
            })
            .await?;

        tracing::debug!(conversation_id = %conversation_id, "message posted");
        Ok(())
    }

    async fn fetch_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ClientError> {
        let url = self.conversation_url(conversation_id)?;

        let body = self
            .retry
            .run("fetch_conversation", || {
                self.body_of(self.http_client.get(url.clone()))
            })
            .await?;

        let history = parse_history_response(&body)?;
        tracing::debug!(
            conversation_id = %conversation_id,
            messages = history.len(),
            "conversation fetched"
        );
        Ok(history)
    }
}
