//! Command-line interface for chess-relay.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Unset options leave configuration file and environment values in place.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Gemini model name.
    pub model: Option<String>,
    /// Idle session TTL in seconds.
    pub session_ttl: Option<u64>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('m') | Long("model") => {
                result.model = Some(parser.value()?.parse()?);
            }
            Long("session-ttl") => {
                let value: String = parser.value()?.parse()?;
                result.session_ttl = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("session-ttl", value))?,
                );
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"chess-relay {version}
HTTP relay that asks a Gemini chat model for chess moves

USAGE:
    chess-relay [OPTIONS]

OPTIONS:
    -H, --host <ADDR>         Host address to bind [default: 0.0.0.0]
    -p, --port <PORT>         Port to listen on [default: 3000]
    -c, --config <FILE>       Path to configuration file (JSON)
    -m, --model <NAME>        Gemini model [default: gemini-2.5-flash]
        --session-ttl <SECS>  Evict sessions idle for this long [default: never]
    -l, --log-level <LVL>     Log level (error, warn, info, debug, trace)
    -h, --help                Print help
    -V, --version             Print version

ENVIRONMENT VARIABLES:
    API_KEY_GEMINI            Gemini API key (alias: CHESS_RELAY_API_KEY)
    PORT                      Port number (alias: CHESS_RELAY_PORT)
    CHESS_RELAY_HOST          Host address
    CHESS_RELAY_MODEL         Gemini model
    CHESS_RELAY_SESSION_TTL   Idle session TTL in seconds
    CHESS_RELAY_LOG_LEVEL     Log level
    RUST_LOG                  Alternative log level setting

Without an API key the server still starts; /move then answers with a
configuration error.

EXAMPLES:
    # Start with defaults (0.0.0.0:3000)
    API_KEY_GEMINI=... chess-relay

    # Local only, different port, verbose
    chess-relay -H 127.0.0.1 -p 8080 -l debug

    # Start with config file
    chess-relay -c /etc/chess-relay/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("chess-relay {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
