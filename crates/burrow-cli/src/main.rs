//! # burrow — lightweight namespace containers
//!
//! Creates containers whose root is an overlay of the host root, runs
//! commands inside them, and stops them. A container is addressed by the
//! pid of its anchor process.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
