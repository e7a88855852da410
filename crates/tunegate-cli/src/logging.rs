//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
///
/// Targets match by prefix, so `tunegate` covers every workspace crate.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "tunegate=debug"
    } else {
        "tunegate=info"
    }
}

/// Installs a stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
