#![allow(dead_code)]

use tracing_subscriber::EnvFilter;

/// Installs a per-test subscriber so dispatch logs land in the captured
/// test output. Keep the returned guard alive for the test's duration.
pub struct TestTracing {
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        Self { _guard: guard }
    }
}
