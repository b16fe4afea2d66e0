use std::sync::Once;
use tracing::Level;

/// Set to enable harness logging; `trace` selects the most verbose level.
pub const DEBUG_ENV: &str = "DEPOT_DEBUG";

pub fn is_enabled() -> bool {
    std::env::var_os(DEBUG_ENV).is_some()
}

fn level() -> Level {
    match std::env::var(DEBUG_ENV)
        .unwrap_or_default()
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "info" => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// Installs the test log subscriber, at most once per process and only
/// when [`DEBUG_ENV`] is set.
pub fn init() {
    static ONCE: Once = Once::new();

    ONCE.call_once(|| {
        if !is_enabled() {
            return;
        }

        // another subscriber may already be installed by the test binary
        let _ = tracing_subscriber::fmt()
            .with_max_level(level())
            .with_test_writer()
            .try_init();
    });
}
