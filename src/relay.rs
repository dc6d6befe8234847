//! Move relay: turns "best move for this position" into a chat turn.
//!
//! The relay owns no chess knowledge. The position string is passed through to
//! the model untouched and the reply is only trimmed and lowercased.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::chat::{ChatError, ChatOptions, ChatProvider};
use crate::error::RelayError;
use crate::session::{ContextId, SessionId, SessionStore};
use crate::Result;

/// Sampling temperature used for new conversations.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Build the system instruction for a model playing `color`.
pub fn system_instruction(color: &str) -> String {
    format!(
        "You are a 1800 ELO chess player. You play the {color} pieces.\n\
         Your goal is to play the best strategic move available.\n\
         Reply ONLY when it is your turn and ALWAYS give the move in \
         'fromto' square notation (e.g. e2e4). Never use capture notation such as \
         'exd5' (write e4d5) and never prefix the piece letter (write c8c6, not nc8c6).\n\
         Use the conversation history to keep a consistent strategy and game plan."
    )
}

/// Build the user message asking for a move in position `fen`.
pub fn move_prompt(fen: &str) -> String {
    format!("The current FEN position is: {fen}. Make your move.")
}

/// Normalize a raw model reply into the returned move string.
pub fn normalize_reply(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Require a non-blank request field.
pub fn required(value: Option<String>, name: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RelayError::MissingParameter(name)),
    }
}

/// Validated inputs of a move request.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveParams {
    pub fen: String,
    pub color: String,
    pub session_id: SessionId,
}

impl MoveParams {
    /// Validate raw request fields. Every field must be present and non-blank.
    pub fn new(
        fen: Option<String>,
        color: Option<String>,
        session_id: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            fen: required(fen, "fen")?,
            color: required(color, "color")?,
            session_id: SessionId::from(required(session_id, "sessionId")?),
        })
    }
}

/// Brokers move requests between callers, the session store and the chat provider.
pub struct MoveRelay {
    store: Arc<SessionStore>,
    provider: Option<Arc<dyn ChatProvider>>,
    temperature: f32,
}

impl MoveRelay {
    /// Create a relay. `provider` is `None` when no credential was configured.
    pub fn new(store: Arc<SessionStore>, provider: Option<Arc<dyn ChatProvider>>) -> Self {
        Self {
            store,
            provider,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Whether an upstream chat provider is available.
    pub fn is_ready(&self) -> bool {
        self.provider.is_some()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Ask the session's model for its next move.
    pub async fn request_move(&self, params: MoveParams) -> Result<String> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(RelayError::ServiceUnavailable)?;

        let MoveParams {
            fen,
            color,
            session_id,
        } = params;

        let entry = self.store.get_or_create(&session_id, &color, |color| {
            provider.start_chat(ChatOptions::new(system_instruction(color), self.temperature))
        })?;

        info!(session = %session_id, context = %entry.context_id, color = %entry.color, "requesting move");

        let prompt = move_prompt(&fen);
        let reply = self
            .evict_on_failure(&session_id, entry.context_id, entry.chat.send_message(&prompt))
            .await?;

        let movimento = normalize_reply(&reply);
        info!(session = %session_id, movimento = %movimento, "model replied");
        Ok(movimento)
    }

    /// Forget the conversation of a finished game.
    pub fn end_game(&self, session_id: &SessionId) -> Result<()> {
        if self.store.remove(session_id)? {
            info!(session = %session_id, "session ended");
            Ok(())
        } else {
            Err(RelayError::NotFound(session_id.to_string()))
        }
    }

    /// Await an upstream call; on failure evict the context it used and report
    /// `UpstreamFailure`, so the next request starts a fresh conversation.
    async fn evict_on_failure<T, F>(
        &self,
        session_id: &SessionId,
        context_id: ContextId,
        call: F,
    ) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, ChatError>>,
    {
        match call.await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(session = %session_id, context = %context_id, "upstream call failed: {}", e);
                match self.store.remove_context(session_id, context_id) {
                    Ok(true) => info!(session = %session_id, "evicted chat context after failure"),
                    Ok(false) => {}
                    Err(remove_err) => {
                        warn!(session = %session_id, "failed to evict chat context: {}", remove_err)
                    }
                }
                Err(RelayError::UpstreamFailure(e.to_string()))
            }
        }
    }
}
