// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]

//! Subgraph tap CLI
//!
//! Writes SCHEMA/RECORD/STATE lines to stdout; logs go to stderr.

use clap::Parser;
use subgraph_tap::cli::{Cli, Runner};
use subgraph_tap::Error;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        match &e {
            Error::Stream { stream, source } => {
                error!(stream = %stream, error = %source, "Stream failed");
            }
            other => error!(error = %other, "Run failed"),
        }
        std::process::exit(1);
    }
}
