//! `burrow run` — Create a container.

use std::path::PathBuf;

use anyhow::Context;
use burrow_common::config::ContainerConfig;
use burrow_common::constants;
use burrow_runtime::Container;
use clap::Args;
use serde::Serialize;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Hostname of the new container.
    #[arg(required_unless_present = "config", conflicts_with = "config")]
    pub hostname: Option<String>,

    /// JSON file with `base_dir` and `hostname`. Takes precedence over
    /// `--base-dir`.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Base directory for `rootfs`, `upper`, and `work`.
    ///
    /// Defaults to `<data dir>/containers/<hostname>`.
    #[arg(long, env = "BURROW_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    pid: i32,
    hostname: &'a str,
    base_dir: &'a std::path::Path,
}

/// Executes the `run` command.
///
/// Prints the anchor pid on stdout.
///
/// # Errors
///
/// Returns an error if the container cannot be created.
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(args.config, args.base_dir, args.hostname)?;
    let container = Container::create(&config)?;

    if args.json {
        let output = RunOutput {
            pid: container.pid().as_raw(),
            hostname: container.hostname(),
            base_dir: container.base_dir(),
        };
        #[allow(clippy::print_stdout)]
        {
            println!("{}", serde_json::to_string(&output)?);
        }
    } else {
        #[allow(clippy::print_stdout)]
        {
            println!("{}", container.pid());
        }
    }
    Ok(())
}

fn load_config(
    file: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    hostname: Option<String>,
) -> anyhow::Result<ContainerConfig> {
    if let Some(file) = file {
        let json = std::fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        return Ok(ContainerConfig::from_json(&json)?);
    }
    let hostname = hostname.context("a hostname or --config is required")?;
    match base_dir {
        Some(base_dir) => Ok(ContainerConfig::new(base_dir, hostname)),
        None => {
            std::fs::create_dir_all(constants::containers_dir())?;
            Ok(ContainerConfig::under(constants::data_dir(), hostname))
        }
    }
}
