//! HTTP client for the agent completions API
//!
//! The relay sends the full conversation history (all prior turns plus the
//! new user message) on every call and extracts the first choice's message
//! content. Requests carry bearer auth and a timeout; there is deliberately
//! no retry/backoff.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::types::Message;

/// Request body for the completions endpoint.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    agent_id: &'a str,
    messages: &'a [Message],
}

/// Response body from the completions endpoint.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// HTTP client for the remote conversational agent.
pub struct AgentClient {
    agent_id: String,
    endpoint: String,
    http_client: reqwest::Client,
}

impl AgentClient {
    /// Create a new client from configuration.
    ///
    /// Returns an error if the API key or agent id is missing.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        config.validate()?;

        let api_key = config.api_key.as_deref().unwrap_or_default();
        let agent_id = config.agent_id.clone().unwrap_or_default();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let auth_value = format!("Bearer {}", api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            agent_id,
            endpoint: config.endpoint.clone(),
            http_client,
        })
    }

    /// Send the conversation history and return the assistant's reply text.
    pub async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request_body = CompletionRequest {
            agent_id: &self.agent_id,
            messages,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Agent(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Agent(format!(
                "agent API returned {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Agent(format!("failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::Agent("response contained no completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> AgentConfig {
        AgentConfig {
            api_key: Some("test-key".to_string()),
            agent_id: Some("agent-123".to_string()),
            endpoint,
            timeout_secs: 5,
            bot_name: "Absa".to_string(),
        }
    }

    #[tokio::test]
    async fn sends_history_and_extracts_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/agents/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "agent_id": "agent-123",
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "hello"}}]
            })))
            .mount(&server)
            .await;

        let client =
            AgentClient::new(&config(format!("{}/v1/agents/completions", server.uri()))).unwrap();
        let reply = client.complete(&[Message::user("hi")]).await.unwrap();
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn upstream_error_maps_to_agent_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = AgentClient::new(&config(server.uri())).unwrap();
        let err = client.complete(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, Error::Agent(_)));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = AgentClient::new(&config(server.uri())).unwrap();
        assert!(client.complete(&[Message::user("hi")]).await.is_err());
    }

    #[test]
    fn missing_credentials_fail_construction() {
        let mut cfg = config("http://localhost".to_string());
        cfg.api_key = None;
        assert!(AgentClient::new(&cfg).is_err());
    }
}
