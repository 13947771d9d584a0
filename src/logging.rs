//! Tracing setup for the CLI.
//!
//! Events go to stderr so that JSON reports on stdout stay parseable.

use std::io;
use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber. Later calls are ignored.
///
/// `RUST_LOG` wins when set; otherwise `default_level` is used.
pub fn init_tracing(default_level: &str, json: bool) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let registry = tracing_subscriber::registry().with(env_filter);

        if json {
            registry
                .with(fmt::layer().json().with_target(true).with_writer(io::stderr))
                .try_init()
                .ok();
        } else {
            registry
                .with(fmt::layer().with_target(false).with_writer(io::stderr))
                .try_init()
                .ok();
        }

        tracing::debug!("tracing initialized");
    });
}
