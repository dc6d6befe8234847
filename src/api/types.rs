//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request for the model's next move.
///
/// Fields are optional at the wire level so that an absent field is reported
/// as a missing parameter rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveRequest {
    /// Board position in FEN.
    #[serde(default)]
    pub fen: Option<String>,
    /// Side assigned to the model.
    #[serde(default, alias = "cor_ia")]
    pub color: Option<String>,
    /// Game identifier.
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Response carrying the suggested move.
#[derive(Debug, Clone, Serialize)]
pub struct MoveResponse {
    pub movimento: String,
}

/// Request to end a game's conversation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndGameRequest {
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Informational response.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn session_removed() -> Self {
        Self::new("session removed")
    }

    pub fn session_not_found() -> Self {
        Self::new("session not found")
    }
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Short error category.
    pub error: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn missing_parameter() -> Self {
        Self::new("missing parameter")
    }

    pub fn configuration_error() -> Self {
        Self::new("configuration error")
    }

    pub fn upstream_failure(details: impl Into<String>) -> Self {
        Self::new("upstream failure").with_details(details)
    }

    pub fn internal_error(details: impl Into<String>) -> Self {
        Self::new("internal error").with_details(details)
    }
}

/// Upstream readiness reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiStatus {
    Ready,
    CredentialError,
}

/// Service status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub message: String,
    pub endpoint: String,
    pub ai: AiStatus,
}
