// Path: crates/telemetry/src/init.rs
use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Initializes the global `tracing` subscriber for structured JSON logging.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Records emitted
/// through the `log` facade are forwarded into the same subscriber.
pub fn init_tracing() -> Result<(), anyhow::Error> {
    let fmt_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

static TEST_INIT: Once = Once::new();

/// Installs a human-readable subscriber that writes through the test harness's
/// captured output. Safe to call from every test; only the first call wins.
pub fn init_test_tracing() {
    TEST_INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().with_test_writer().with_target(true));
        // Another harness may already own the global slots.
        let _ = tracing_log::LogTracer::init();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
