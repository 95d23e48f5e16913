//! Converts Scratch 3 projects to Pygame programs by handing their
//! `project.json` to a chat-completion endpoint, and relays plain chat
//! messages to the same endpoint over HTTP.

pub mod archive;
pub mod commands;
pub mod completion;
pub mod config;
pub mod error;
pub mod output;
pub mod templates;
pub mod util;

pub use archive::{materialize, Materialized};
pub use commands::convert::{convert, Conversion};
pub use commands::relay::{serve, Relay};
pub use completion::{ChatCompletionClient, CompletionService};
pub use config::{CompletionConfig, RelayConfig};
pub use error::{ConverterError, Result};
pub use output::write_output;

/// Installs the stderr `tracing` subscriber shared by both binaries.
/// `RUST_LOG` wins when set; otherwise `verbose` picks warn, info, debug or trace.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
