//! Conversational chat abstraction.
//!
//! The relay only ever talks to a [`ChatSession`]: a handle that retains the
//! history of one conversation and can be sent one more message. Sessions are
//! created by a [`ChatProvider`], which owns the credential and transport.

mod gemini;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Errors reported by an upstream chat provider.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Transport-level failure (connect, TLS, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The provider refused to answer the prompt.
    #[error("prompt blocked: {0}")]
    Blocked(String),

    /// The provider answered without any text.
    #[error("empty response from model")]
    EmptyResponse,
}

/// Options fixed at conversation creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    /// Instruction applied to every turn of the conversation.
    pub system_instruction: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl ChatOptions {
    pub fn new(system_instruction: impl Into<String>, temperature: f32) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            temperature,
        }
    }
}

/// A single conversation with retained history.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Send one user message and wait for the model's reply text.
    async fn send_message(&self, text: &str) -> Result<String, ChatError>;
}

/// Factory for new conversations.
pub trait ChatProvider: Send + Sync {
    /// Start a fresh conversation. No network traffic happens until the first
    /// message is sent.
    fn start_chat(&self, options: ChatOptions) -> Arc<dyn ChatSession>;
}
