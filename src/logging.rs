//! Structured logging setup.
//!
//! `RUST_LOG` takes precedence when set. Otherwise only remotify's own events
//! are shown at the configured level and the HTTP stack is kept at `warn`.
//! Output goes to stderr so stdout stays free for the run report.

use std::env;
use std::sync::Once;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "REMOTIFY_LOG_LEVEL";

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub use_json: bool,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: false,
        }
    }
}

impl LoggingConfig {
    /// Picks the level from the flag, then `REMOTIFY_LOG_LEVEL`, then `info`.
    pub fn resolve(flag: Option<&str>, use_json: bool) -> Self {
        let level = match flag {
            Some(level) => parse_level(level),
            None => env::var(LOG_LEVEL_ENV)
                .map(|level| parse_level(&level))
                .unwrap_or(Level::INFO),
        };

        Self {
            level,
            use_json,
            include_target: level >= Level::DEBUG,
        }
    }
}

/// Case-insensitive; unknown names fall back to `info`.
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let directives = format!(
        "remotify={},h2=warn,hyper=warn,reqwest=warn",
        config.level
    );
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("remotify=info"))
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(&config);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target),
                )
                .init();
        }
    });
}
