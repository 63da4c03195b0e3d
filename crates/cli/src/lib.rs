//! Command line front end for the Licence Finder sector search.
//!
//! The `licence-search` binary imports the sector taxonomy, rebuilds the
//! search index from it and runs ad hoc searches. Configuration comes from
//! flags or `LF_*` environment variables; see [`config`].

pub mod commands;
pub mod config;

pub use commands::{build_client, run};
pub use config::{Cli, Command};

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "licence_finder_cli={level},licence_finder_search={level},licence_finder_taxonomy={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
