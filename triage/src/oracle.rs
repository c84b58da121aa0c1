//! Reasoning oracle collaborator: trait, reply shape, and HTTP adapter.
//!
//! The oracle is an external judgment service. Two failure modes are kept
//! strictly apart: a failed call is an `OracleError`, while a reply in an
//! unexpected shape is still a successful `OracleReply::Text` the caller
//! wraps into a low-confidence trace. The degradation ladders depend on
//! that distinction.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TriageConfig;

/// Errors from oracle calls. All variants mean "the call itself failed".
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport failed: {0}")]
    Transport(String),

    #[error("oracle request timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle API error: status {status}")]
    Api { status: u16 },

    #[error("oracle credentials not configured")]
    MissingCredentials,
}

/// A successful oracle reply. Structured JSON objects are passed through
/// as-is; anything else is free text.
#[derive(Debug, Clone)]
pub enum OracleReply {
    Structured(serde_json::Value),
    Text(String),
}

impl OracleReply {
    /// Interpret raw completion content: a JSON object is structured output,
    /// everything else is free text.
    pub fn from_content(content: &str) -> Self {
        let trimmed = content.trim();
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) if value.is_object() => Self::Structured(value),
            _ => Self::Text(trimmed.to_string()),
        }
    }
}

/// External reasoning oracle capability.
#[async_trait]
pub trait OracleCollaborator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<OracleReply, OracleError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Deserialize)]
struct ChatContent {
    content: String,
}

/// OpenAI-compatible chat-completions adapter with a fixed request timeout.
pub struct HttpOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl HttpOracle {
    pub fn new(config: &TriageConfig, api_key: String) -> Result<Self, OracleError> {
        if api_key.trim().is_empty() {
            return Err(OracleError::MissingCredentials);
        }
        let timeout = Duration::from_secs(config.oracle_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.oracle_base_url.clone(),
            api_key,
            model: config.oracle_model.clone(),
            max_tokens: config.oracle_max_tokens,
            timeout,
        })
    }
}

#[async_trait]
impl OracleCollaborator for HttpOracle {
    async fn generate(&self, prompt: &str) -> Result<OracleReply, OracleError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: 0.3,
            top_p: 0.9,
            stream: false,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.timeout)
                } else {
                    OracleError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Api {
                status: status.as_u16(),
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| OracleError::Transport("completion had no choices".to_string()))?;

        Ok(OracleReply::from_content(&content))
    }
}

/// Oracle that always reports missing credentials. Wiring this in keeps
/// every composition fully functional on the deterministic ladders.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableOracle;

#[async_trait]
impl OracleCollaborator for UnavailableOracle {
    async fn generate(&self, _prompt: &str) -> Result<OracleReply, OracleError> {
        Err(OracleError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_from_json_object() {
        let reply = OracleReply::from_content(r#"{"urgency_level": "Urgent"}"#);
        match reply {
            OracleReply::Structured(v) => assert_eq!(v["urgency_level"], "Urgent"),
            OracleReply::Text(_) => panic!("expected structured reply"),
        }
    }

    #[test]
    fn test_reply_from_prose() {
        let reply = OracleReply::from_content("You should see a doctor soon.");
        match reply {
            OracleReply::Text(t) => assert!(t.contains("doctor")),
            OracleReply::Structured(_) => panic!("expected text reply"),
        }
    }

    #[test]
    fn test_reply_non_object_json_is_text() {
        // Bare arrays and scalars are not usable structured output.
        assert!(matches!(
            OracleReply::from_content("[1, 2, 3]"),
            OracleReply::Text(_)
        ));
        assert!(matches!(
            OracleReply::from_content("0.9"),
            OracleReply::Text(_)
        ));
    }

    #[test]
    fn test_http_oracle_rejects_empty_key() {
        let config = TriageConfig::default();
        assert!(matches!(
            HttpOracle::new(&config, "  ".to_string()),
            Err(OracleError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_unavailable_oracle_always_fails() {
        let oracle = UnavailableOracle;
        assert!(matches!(
            oracle.generate("anything").await,
            Err(OracleError::MissingCredentials)
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            OracleError::Api { status: 503 }.to_string(),
            "oracle API error: status 503"
        );
        assert!(OracleError::Timeout(Duration::from_secs(30))
            .to_string()
            .contains("30"));
    }
}
