use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

fn log_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("APP_FREEZE_LOG_PATH") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".app_freeze").join("app-freeze.log"))
}

/// Logs go to a file rather than the terminal: the alternate screen owns
/// stdout/stderr for the whole session.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(path) = log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let writer = Arc::new(file);

    if cfg!(debug_assertions) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .with_target(false)
            .with_writer(writer)
            .try_init();
    }
}
