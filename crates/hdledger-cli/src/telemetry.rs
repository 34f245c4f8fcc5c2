//! Logging initialization.
//!
//! Sets up structured logging with tracing and optional JSON output. Logs
//! go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the given filter directive.
pub fn init_telemetry(log_level: &str, json_format: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_rejected() {
        assert!(init_telemetry("hdledger=loud", false).is_err());
    }

    use std::io::Write;
    use std::sync::{Arc, Mutex};

    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_pretty_layer_writes_events() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::try_new("info").unwrap())
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_writer(move || Capture(sink.clone())),
            );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("discovery finished");
            tracing::debug!("filtered out");
        });

        let text = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(text.contains("discovery finished"));
        assert!(!text.contains("filtered out"));
        // pretty output puts the source location on its own line
        assert!(text.lines().count() > 1);
    }

    #[test]
    fn test_init_telemetry() {
        // a second init in the same process fails, so only the first matters
        let _ = init_telemetry("info", false);
    }
}
