use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise structured logging.
/// Emits JSON to stdout; `RUST_LOG` controls the level (default `info`).
pub fn init_telemetry() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .json();

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Telemetry already initialised");
    }
}
