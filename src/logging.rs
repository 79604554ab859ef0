//! Tracing bootstrap for processes hosting the initializer.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `info`. Safe to call
/// more than once; only the first call installs anything. Returns whether this call did.
pub fn init_tracing() -> bool {
    init_tracing_with("info")
}

pub fn init_tracing_with(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).try_init().is_ok()
}
