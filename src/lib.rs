//! # chess-relay
//!
//! Lightweight HTTP relay that asks a generative-AI chat model for chess moves.
//!
//! Each game gets its own conversation, so the model keeps its plan from one
//! move to the next. The relay itself knows nothing about chess: it passes the
//! FEN position through and returns the model's reply, trimmed and lowercased.
//!
//! ## Features
//!
//! - **Per-game conversations**: one chat context per session id, created lazily
//! - **Self-healing sessions**: a failed upstream call evicts its context
//! - **Degraded mode**: without an API key the server still reports status
//! - **Lightweight**: small dependency set, single binary
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chess_relay::{GeminiClient, MoveParams, MoveRelay, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     chess_relay::logging::try_init().ok();
//!
//!     let client = GeminiClient::new(std::env::var("API_KEY_GEMINI")?)?;
//!     let relay = MoveRelay::new(Arc::new(SessionStore::new()), Some(Arc::new(client)));
//!
//!     let params = MoveParams::new(
//!         Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".into()),
//!         Some("white".into()),
//!         Some("game-1".into()),
//!     )?;
//!     println!("model plays {}", relay.request_move(params).await?);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod relay;
pub mod session;

// Re-export commonly used types
pub use chat::{ChatError, ChatOptions, ChatProvider, ChatSession, GeminiClient};
pub use error::{RelayError, Result};
pub use relay::{MoveParams, MoveRelay};
pub use session::{ContextId, SessionEntry, SessionId, SessionStore};
