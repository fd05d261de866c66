//! The text-generation seam and its error taxonomy.

#[cfg(any(test, feature = "testing"))]
use std::collections::VecDeque;

use sim_core::ValidationError;
use thiserror::Error;

/// Errors from one generator attempt.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("generator returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generator returned no text")]
    EmptyReply,
    #[error("invalid JSON in reply: {0}")]
    Parse(String),
    #[error("reply failed validation: {0}")]
    Invalid(#[from] ValidationError),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("generator is offline")]
    Offline,
}

impl GeneratorError {
    /// Transport, parse and validation failures are worth another attempt;
    /// auth, config and offline failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GeneratorError::Request(_)
                | GeneratorError::Timeout(_)
                | GeneratorError::Status { .. }
                | GeneratorError::EmptyReply
                | GeneratorError::Parse(_)
                | GeneratorError::Invalid(_)
        )
    }
}

impl From<reqwest::Error> for GeneratorError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout(value.to_string());
        }
        Self::Request(value.to_string())
    }
}

impl From<serde_json::Error> for GeneratorError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}

/// An opaque prompt-in, text-out service.
pub trait TextGenerator {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn generate(&mut self, prompt: &str) -> Result<String, GeneratorError>;
}

impl<G: TextGenerator + ?Sized> TextGenerator for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&mut self, prompt: &str) -> Result<String, GeneratorError> {
        (**self).generate(prompt)
    }
}

/// Generator that is never reachable; every call takes the fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    fn generate(&mut self, _prompt: &str) -> Result<String, GeneratorError> {
        Err(GeneratorError::Offline)
    }
}

/// Replays queued replies in order, then reports `EmptyReply`.
///
/// Records every prompt it receives.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: VecDeque<Result<String, GeneratorError>>,
    prompts: Vec<String>,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.replies.push_back(Ok(text.into()));
        self
    }

    pub fn fail(mut self, err: GeneratorError) -> Self {
        self.replies.push_back(Err(err));
        self
    }

    pub fn push_reply(&mut self, text: impl Into<String>) {
        self.replies.push_back(Ok(text.into()));
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

#[cfg(any(test, feature = "testing"))]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(&mut self, prompt: &str) -> Result<String, GeneratorError> {
        self.prompts.push(prompt.to_string());
        self.replies
            .pop_front()
            .unwrap_or(Err(GeneratorError::EmptyReply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GeneratorError::Request("x".into()).is_retryable());
        assert!(GeneratorError::Timeout("x".into()).is_retryable());
        assert!(GeneratorError::Parse("x".into()).is_retryable());
        assert!(GeneratorError::Invalid(ValidationError::NoEmployees).is_retryable());
        assert!(!GeneratorError::Auth("x".into()).is_retryable());
        assert!(!GeneratorError::Config("x".into()).is_retryable());
        assert!(!GeneratorError::Offline.is_retryable());
    }

    #[test]
    fn scripted_replays_in_order() {
        let mut g = ScriptedGenerator::new()
            .reply("one")
            .fail(GeneratorError::Timeout("slow".into()));
        assert_eq!(g.generate("p1").unwrap(), "one");
        assert!(matches!(g.generate("p2"), Err(GeneratorError::Timeout(_))));
        assert!(matches!(g.generate("p3"), Err(GeneratorError::EmptyReply)));
        assert_eq!(g.prompts().len(), 3);
        assert_eq!(g.prompts()[0], "p1");
        assert_eq!(g.remaining(), 0);
    }
}
