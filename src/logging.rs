//! diagnostic tracing for the lifecourse binary
//!
//! reads LIFECOURSE_LOG (an EnvFilter directive, e.g. `lifecourse=debug`)
//! and defaults to `warn`. output goes to stderr so it never mixes with
//! JSON on stdout.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV_VAR: &str = "LIFECOURSE_LOG";

pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
