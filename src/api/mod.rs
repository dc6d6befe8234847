//! HTTP API for chess-relay.
//!
//! ## Endpoints
//!
//! - `GET /` - Service status and upstream readiness
//! - `GET /health` - Health check
//! - `POST /move` - Ask the model for a move: `{fen, color, sessionId}` -> `{movimento}`
//! - `POST /end-game` - Forget a game's conversation: `{sessionId}`
//!
//! `POST /api/jogada-ia` and `POST /api/fim-partida` are aliases of the last
//! two, kept for the existing browser front-end.
//!
//! ## Example
//!
//! ```no_run
//! use chess_relay::api::{serve, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> chess_relay::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1", 3000);
//!     serve(config, AppState::unconfigured()).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use handlers::AppState;
pub use router::{create_router, serve, ServerConfig};
pub use types::{
    AiStatus, EndGameRequest, ErrorResponse, MessageResponse, MoveRequest, MoveResponse,
    StatusResponse,
};
