//! Diagnostics for the agent loop.
//!
//! stdout belongs to the REPL: the query prompt, step echoes, parse-failure
//! reports and anything an attached command prints. Tracing events (state
//! transitions, dispatch, chat requests) therefore go to stderr, filtered by
//! `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber. Defaults to `warn` when `RUST_LOG` is unset.
///
/// `RUST_LOG=steploop::controller=debug` traces every state transition.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
