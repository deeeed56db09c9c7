//! Tracing initialization for embedding binaries and test harnesses.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber with `RUST_LOG`-style filtering and bridges
/// `log` records (the db layer logs through `log`) into tracing.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    // The bridge may already be installed by an outer harness.
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
