//! Logging setup utilities for the Sketchroom game server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crate targets that always get the default log level.
const LIBRARY_TARGETS: &[&str] = &["sketchroom_server", "sketchroom_shared"];

/// Build the default filter directive for the given binary.
///
/// Every library target of the workspace plus the binary itself is enabled
/// at `default_log_level`; everything else stays at the subscriber default.
/// A binary sharing its target with a library is listed once.
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut targets: Vec<String> = LIBRARY_TARGETS.iter().map(|t| t.to_string()).collect();
    if !targets.contains(&binary_target) {
        targets.push(binary_target);
    }
    targets
        .iter()
        .map(|target| format!("{target}={default_log_level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "sketchroom-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use sketchroom_shared::logger::setup_logger;
///
/// setup_logger("sketchroom-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
