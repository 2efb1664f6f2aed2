use std::fs::create_dir_all;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use relay_core::config::LogsConfig;

fn fallback_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Installs the process-wide subscriber. `RUST_LOG` wins over the configured level.
///
/// With no log file the output is discarded, since the terminal belongs to the UI.
pub fn init_tracing(logs: &LogsConfig, default_file: Option<&Path>) {
    let level = fallback_level(&logs.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let target = logs.file.as_deref().or(default_file);
    let file = target.and_then(|path| {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && create_dir_all(parent).is_err() {
                return None;
            }
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .try_init();
        }
    }
}
