//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::types::{
    AiStatus, EndGameRequest, ErrorResponse, MessageResponse, MoveRequest, MoveResponse,
    StatusResponse,
};
use crate::chat::{ChatProvider, GeminiClient};
use crate::config::Config;
use crate::error::RelayError;
use crate::relay::{MoveParams, MoveRelay};
use crate::session::{SessionId, SessionStore};

/// Path of the move endpoint, advertised by the status endpoint.
pub const MOVE_PATH: &str = "/move";

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<MoveRelay>,
}

impl AppState {
    pub fn new(relay: MoveRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }

    /// State without an upstream provider; move requests report a configuration error.
    pub fn unconfigured() -> Self {
        Self::new(MoveRelay::new(Arc::new(SessionStore::new()), None))
    }

    /// Build the state from configuration. A missing or unusable credential
    /// yields an unconfigured relay instead of an error.
    pub fn from_config(config: &Config) -> Self {
        let provider: Option<Arc<dyn ChatProvider>> = match config.gemini.api_key.as_deref() {
            Some(key) if !key.is_empty() => match GeminiClient::new(key) {
                Ok(client) => {
                    let client = client
                        .with_base_url(&config.gemini.base_url)
                        .with_model(&config.gemini.model);
                    tracing::info!("Gemini client ready (model {})", client.model());
                    Some(Arc::new(client) as Arc<dyn ChatProvider>)
                }
                Err(e) => {
                    tracing::error!("failed to initialize Gemini client: {}", e);
                    None
                }
            },
            _ => None,
        };

        let relay = MoveRelay::new(Arc::new(SessionStore::new()), provider)
            .with_temperature(config.gemini.temperature);
        Self::new(relay)
    }
}

fn api_error(err: RelayError) -> ApiError {
    match err {
        RelayError::MissingParameter(_) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::missing_parameter()),
        ),
        RelayError::ServiceUnavailable => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::configuration_error()),
        ),
        RelayError::UpstreamFailure(details) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::upstream_failure(details)),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::internal_error(other.to_string())),
        ),
    }
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// Service status endpoint.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let ai = if state.relay.is_ready() {
        AiStatus::Ready
    } else {
        AiStatus::CredentialError
    };

    Json(StatusResponse {
        ok: true,
        message: "chess-relay is running".to_string(),
        endpoint: MOVE_PATH.to_string(),
        ai,
    })
}

/// Ask the model for its next move.
///
/// A body that is absent, not JSON, or sent without a JSON content type is
/// reported the same way as a body missing its fields.
pub async fn request_move(
    State(state): State<AppState>,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveResponse>, ApiError> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!("rejected move body: {}", rejection.body_text());
            return Err(api_error(RelayError::MissingParameter("body")));
        }
    };

    let params = MoveParams::new(req.fen, req.color, req.session_id).map_err(api_error)?;

    let movimento = state.relay.request_move(params).await.map_err(api_error)?;

    Ok(Json(MoveResponse { movimento }))
}

fn session_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse::session_not_found()),
    )
        .into_response()
}

/// Drop the conversation of a finished game.
///
/// Without a usable `sessionId` there is nothing to remove, which is reported
/// as an unknown session.
pub async fn end_game(
    State(state): State<AppState>,
    body: Result<Json<EndGameRequest>, JsonRejection>,
) -> Response {
    let session_id = body
        .ok()
        .and_then(|Json(req)| req.session_id)
        .filter(|id| !id.trim().is_empty());

    let Some(session_id) = session_id.map(SessionId::from) else {
        return session_not_found();
    };

    match state.relay.end_game(&session_id) {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::session_removed())).into_response(),
        Err(RelayError::NotFound(_)) => session_not_found(),
        Err(e) => api_error(e).into_response(),
    }
}
