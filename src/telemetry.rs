use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Installs the stderr subscriber. `RUST_LOG` wins over `log.filter`.
/// Returns false when a global subscriber was already set.
pub fn init_logging(cfg: &LogConfig) -> bool {
    let registry = tracing_subscriber::registry().with(build_filter(cfg));
    let installed = if cfg.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.is_ok()
}

fn build_filter(cfg: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialization_is_refused() {
        let cfg = LogConfig::default();
        init_logging(&cfg);
        assert!(!init_logging(&cfg));
    }

    #[test]
    fn malformed_filter_falls_back() {
        let cfg = LogConfig {
            filter: "[[[".into(),
            json: false,
        };
        let _ = build_filter(&cfg);
    }
}
