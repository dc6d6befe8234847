//! chess-relay binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use chess_relay::api::{serve, AppState};
use chess_relay::cli::{parse_args, print_help, print_version};
use chess_relay::config::Config;
use chess_relay::{logging, session};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Run 'chess-relay --help' for usage.");
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_with_filter(config.log_filter()) {
        eprintln!("warning: logging already initialized: {}", e);
    }

    info!("chess-relay v{}", env!("CARGO_PKG_VERSION"));

    let server_config = match config.to_server_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if !config.has_credential() {
        warn!("API_KEY_GEMINI is not set; move requests will fail with a configuration error");
    }

    let state = AppState::from_config(&config);

    if let Some(ttl) = config.sessions.idle_ttl() {
        info!("evicting sessions idle for more than {}s", ttl.as_secs());
        session::spawn_idle_sweeper(Arc::clone(state.relay.store()), ttl);
    }

    match serve(server_config, state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

