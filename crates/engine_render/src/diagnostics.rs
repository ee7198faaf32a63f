// crates/engine_render/src/diagnostics.rs

use tracing_subscriber::EnvFilter;

/// Installs the default tracing subscriber for applications that have no
/// logging setup of their own. Honors `RUST_LOG`; defaults to `info`.
///
/// Safe to call once; a second call is ignored so embedding applications
/// that already installed a subscriber keep theirs.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
