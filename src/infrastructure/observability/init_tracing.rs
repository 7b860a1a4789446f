use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use super::TracingConfig;

const DEFAULT_FILTER: &str = "info,colloquy=debug,tower_http=debug";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter;
/// the output format follows the resolved config.
pub fn init_tracing(config: TracingConfig, port: u16) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    let base = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if config.json_format {
        registry.with(base.json()).init();
    } else {
        registry.with(base).init();
    }

    tracing::info!(
        port,
        environment = %config.environment,
        json_format = config.json_format,
        "Tracing initialized"
    );
}
