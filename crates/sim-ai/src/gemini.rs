//! Blocking client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generator::{GeneratorError, TextGenerator};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Connection settings for [`GeminiClient`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Overrides the public endpoint, e.g. for a proxy.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl GeminiConfig {
    /// Reads the API key from the configured environment variable.
    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, api_key: Option<String>) -> Result<Self, GeneratorError> {
        let api_key = api_key
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                GeneratorError::Config(format!(
                    "gemini generator requires an API key (set {})",
                    config.api_key_env
                ))
            })?;

        let model = config.model.trim();
        if model.is_empty() {
            return Err(GeneratorError::Config("gemini model cannot be empty".to_string()));
        }
        if config.timeout_ms == 0 {
            return Err(GeneratorError::Config(
                "gemini timeout must be greater than 0".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            model: model.to_string(),
            api_key,
            base_url,
            timeout_ms: config.timeout_ms,
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .build()
                .map_err(|error| GeneratorError::Config(error.to_string()))?,
        })
    }

    fn endpoint(&self) -> String {
        let model = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        format!("{}/{}:generateContent", self.base_url, model)
    }
}

impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn generate(&mut self, prompt: &str) -> Result<String, GeneratorError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
        };
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|error| {
                if error.is_timeout() {
                    GeneratorError::Timeout(format!(
                        "Gemini request timed out after {} ms",
                        self.timeout_ms
                    ))
                } else if error.is_connect() {
                    GeneratorError::Request(format!(
                        "could not reach Gemini endpoint at {}: {error}",
                        self.base_url
                    ))
                } else {
                    GeneratorError::from(error)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GeneratorError::Auth(format!(
                "Gemini authentication failed ({status}); check the API key"
            )));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse = response.json()?;
        let text: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GeneratorError::EmptyReply);
        }
        debug!(model = %self.model, chars = text.len(), "gemini reply received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            GeminiConfig {
                base_url: Some(format!("{}/v1beta", server.base_url())),
                timeout_ms: 5_000,
                ..GeminiConfig::default()
            },
            Some("test-key".to_string()),
        )
        .expect("client should initialize")
    }

    #[test]
    fn sends_prompt_and_joins_parts() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-1.5-flash:generateContent")
                .query_param("key", "test-key")
                .body_contains("\"contents\"")
                .body_contains("hello there");
            then.status(200).json_body(json!({
                "candidates": [
                    { "content": { "parts": [ { "text": "{\"a\":" }, { "text": " 1}" } ] } }
                ]
            }));
        });

        let mut c = client(&server);
        let text = c.generate("hello there").expect("generate should succeed");
        mock.assert();
        assert_eq!(text, "{\"a\": 1}");
    }

    #[test]
    fn unauthorized_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(403).body("forbidden");
        });
        let err = client(&server).generate("x").unwrap_err();
        assert!(matches!(err, GeneratorError::Auth(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_error_is_retryable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(503).body("overloaded");
        });
        let err = client(&server).generate("x").unwrap_err();
        assert!(matches!(err, GeneratorError::Status { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn no_candidates_is_empty_reply() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "candidates": [] }));
        });
        let err = client(&server).generate("x").unwrap_err();
        assert!(matches!(err, GeneratorError::EmptyReply));
    }

    #[test]
    fn missing_key_is_config_error() {
        let err = GeminiClient::new(GeminiConfig::default(), Some("  ".into()))
            .err()
            .expect("blank key must be rejected");
        assert!(matches!(err, GeneratorError::Config(_)));
    }
}
