// Logging setup
//
// Console logging through tracing-subscriber. The filter comes from RUST_LOG, then
// LOG_LEVEL, then the crate default.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "contentdesk_control_plane=debug,tower_http=debug,info";

#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub service_version: Option<String>,
    /// Log filter directive (e.g. "info", "contentdesk_control_plane=debug")
    pub log_filter: Option<String>,
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let log_filter = get("RUST_LOG")
            .or_else(|| get("LOG_LEVEL"))
            .filter(|f| !f.trim().is_empty());

        Self {
            log_filter,
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        self.log_filter
            .as_deref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(config: &TelemetryConfig) {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(config.filter());

    tracing_subscriber::registry().with(console_layer).init();

    tracing::debug!(
        service = env!("CARGO_PKG_NAME"),
        version = config.service_version.as_deref().unwrap_or("unknown"),
        "Tracing initialized"
    );
}
