//! Logging setup.
//!
//! Desktop builds log to stderr through the `tracing-subscriber` fmt layer,
//! which also picks up `log` records, so stdout stays free for CLI output.
//! Android builds route everything to logcat under the `ClickEngine` tag. Installation happens at most once per process.

use once_cell::sync::OnceCell;
use tracing::Level;

/// Environment variable consulted for the desktop log level
pub const LOG_LEVEL_ENV: &str = "CLICK_ENGINE_LOG";

static LOGGING: OnceCell<()> = OnceCell::new();

/// Initialize logging at the level from `CLICK_ENGINE_LOG` (default `info`).
pub fn init_logging() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    init_logging_with_level(level);
}

/// Initialize logging at an explicit level. Later calls are no-ops.
pub fn init_logging_with_level(level: Level) {
    LOGGING.get_or_init(|| install(level));
}

#[cfg(not(target_os = "android"))]
fn install(level: Level) {
    // Another subscriber may already be set by the host (tests, embedding app)
    if tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global subscriber already installed");
    }
}

#[cfg(target_os = "android")]
fn install(level: Level) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    match tracing_android::layer("ClickEngine") {
        Ok(layer) => {
            let _ = tracing_subscriber::registry()
                .with(layer.with_filter(LevelFilter::from_level(level)))
                .try_init();
        }
        Err(err) => {
            log::error!("Failed to create logcat layer: {}", err);
        }
    }
}
