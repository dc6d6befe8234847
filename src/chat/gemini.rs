//! Google Gemini `generateContent` client.
//!
//! Gemini's REST API is stateless, so conversation history is kept locally and
//! replayed with every request:
//!
//! ```json
//! {
//!   "contents": [
//!     {"role": "user", "parts": [{"text": "..."}]},
//!     {"role": "model", "parts": [{"text": "..."}]}
//!   ],
//!   "systemInstruction": {"parts": [{"text": "..."}]},
//!   "generationConfig": {"temperature": 0.1}
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{ChatError, ChatOptions, ChatProvider, ChatSession};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini API client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a client for the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ChatError> {
        let http = Client::builder()
            .user_agent(concat!("chess-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Set a custom base URL (e.g., for proxies or test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, request: &GenerateContentRequest<'_>) -> Result<String, ChatError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        body.into_text()
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ChatProvider for GeminiClient {
    fn start_chat(&self, options: ChatOptions) -> Arc<dyn ChatSession> {
        Arc::new(GeminiChat {
            client: self.clone(),
            options,
            history: Mutex::new(Vec::new()),
        })
    }
}

/// One Gemini conversation.
///
/// The history lock is held across the round trip, so concurrent messages to
/// the same conversation are answered in order.
struct GeminiChat {
    client: GeminiClient,
    options: ChatOptions,
    history: Mutex<Vec<Content>>,
}

#[async_trait]
impl ChatSession for GeminiChat {
    async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        let mut history = self.history.lock().await;

        let mut contents = history.clone();
        contents.push(Content::turn("user", text));

        let request = GenerateContentRequest {
            contents: &contents,
            system_instruction: Content::instruction(&self.options.system_instruction),
            generation_config: GenerationConfig {
                temperature: self.options.temperature,
            },
        };

        let reply = self.client.generate(&request).await?;

        // History only grows on success.
        contents.push(Content::turn("model", &reply));
        *history = contents;

        Ok(reply)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn turn(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }

    fn instruction(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String, ChatError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ChatError::Blocked(reason));
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            Err(ChatError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/models/gemini-2.5-flash:generateContent";

    fn reply(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key")
            .unwrap()
            .with_base_url(server.uri())
    }

    #[test]
    fn test_new_client_defaults() {
        let client = GeminiClient::new("k").unwrap();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_endpoint_construction() {
        let client = GeminiClient::new("k")
            .unwrap()
            .with_base_url("https://test.api.com/v1beta/")
            .with_model("gemini-custom");
        assert_eq!(
            client.endpoint(),
            "https://test.api.com/v1beta/models/gemini-custom:generateContent"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = GeminiClient::new("super-secret").unwrap();
        assert!(!format!("{:?}", client).contains("super-secret"));
    }

    #[test]
    fn test_request_serialization() {
        let contents = vec![Content::turn("user", "hi")];
        let request = GenerateContentRequest {
            contents: &contents,
            system_instruction: Content::instruction("be brief"),
            generation_config: GenerationConfig { temperature: 0.5 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_response_joins_parts() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "e2"}, {"text": "e4"}]}}]
        }))
        .unwrap();
        assert_eq!(body.into_text().unwrap(), "e2e4");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let body: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(body.into_text(), Err(ChatError::EmptyResponse)));
    }

    #[test]
    fn test_response_blocked_prompt() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(matches!(body.into_text(), Err(ChatError::Blocked(r)) if r == "SAFETY"));
    }

    #[tokio::test]
    async fn test_send_message_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "play black"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(" E7E5 ")))
            .expect(1)
            .mount(&server)
            .await;

        let chat = client(&server).start_chat(ChatOptions::new("play black", 0.1));
        let text = chat.send_message("your move").await.unwrap();
        assert_eq!(text, " E7E5 ");
    }

    #[tokio::test]
    async fn test_history_is_replayed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("e2e4")))
            .mount(&server)
            .await;

        let chat = client(&server).start_chat(ChatOptions::new("play white", 0.1));
        chat.send_message("first").await.unwrap();
        chat.send_message("second").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);

        let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        let contents = second["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["parts"][0]["text"], "first");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "second");
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let chat = client(&server).start_chat(ChatOptions::new("x", 0.1));
        let err = chat.send_message("move").await.unwrap_err();
        match err {
            ChatError::Api { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("not valid"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failed_turn_not_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("d2d4")))
            .mount(&server)
            .await;

        let chat = client(&server).start_chat(ChatOptions::new("x", 0.1));
        assert!(chat.send_message("lost").await.is_err());
        assert_eq!(chat.send_message("kept").await.unwrap(), "d2d4");

        let requests = server.received_requests().await.unwrap();
        let last: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(last["contents"].as_array().unwrap().len(), 1);
    }
}
