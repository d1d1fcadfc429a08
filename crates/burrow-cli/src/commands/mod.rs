//! CLI command definitions and dispatch.

pub mod exec;
pub mod run;
pub mod status;
pub mod stop;

use clap::{Parser, Subcommand};

/// burrow — lightweight namespace containers over an overlay of the host root.
#[derive(Parser, Debug)]
#[command(name = "burrow", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a container and print its anchor pid.
    Run(run::RunArgs),
    /// Execute a command inside a running container.
    Exec(exec::ExecArgs),
    /// Stop a container by killing its anchor.
    Stop(stop::StopArgs),
    /// Show whether a container is running.
    Status(status::StatusArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => run::execute(args),
        Command::Exec(args) => exec::execute(args),
        Command::Stop(args) => stop::execute(args),
        Command::Status(args) => status::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn exec_takes_trailing_command() {
        let cli = Cli::try_parse_from(["burrow", "exec", "42", "--", "ip", "-br", "addr"]).unwrap();
        let Command::Exec(args) = cli.command else {
            panic!("expected exec");
        };
        assert_eq!(args.pid.as_raw(), 42);
        assert_eq!(args.command, ["ip", "-br", "addr"]);
    }

    #[test]
    fn exec_requires_a_command() {
        assert!(Cli::try_parse_from(["burrow", "exec", "42"]).is_err());
    }

    #[test]
    fn run_defaults_base_dir() {
        let cli = Cli::try_parse_from(["burrow", "run", "node1"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.hostname.as_deref(), Some("node1"));
        assert!(args.base_dir.is_none());
        assert!(!args.json);
    }

    #[test]
    fn run_needs_hostname_or_config() {
        assert!(Cli::try_parse_from(["burrow", "run"]).is_err());
        let cli = Cli::try_parse_from(["burrow", "run", "--config", "n.json"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.hostname.is_none());
    }
}
