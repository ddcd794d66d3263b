mod commands;
mod error;
mod mode;
mod output;
mod patch;
mod registry;
mod resource;
mod store;
mod wait;

use anyhow::Context as _;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use kube::Client;

use commands::{Command, Context};
use mode::ExecutionMode;
use output::OutputRouter;
use patch::PatchEngine;
use store::KubeStore;
use wait::ConvergenceWaiter;

const FIELD_MANAGER: &str = "kp";

/// Manage kpack builders and related resources
#[derive(Parser, Debug)]
#[command(name = "kp", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Mode flags live on the subcommand which was actually invoked
fn leaf(matches: &ArgMatches) -> &ArgMatches {
    let mut current = matches;
    while let Some((_, sub)) = current.subcommand() {
        current = sub;
    }
    current
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut matches = Cli::command().get_matches();
    let mode = ExecutionMode::from_matches(leaf(&matches))?;
    let cli = Cli::from_arg_matches_mut(&mut matches)?;
    log::debug!("running with {:?}", mode);

    let out = OutputRouter::stdio(&mode)?;
    let client = Client::try_default()
        .await
        .context("failed to load kubernetes config")?;
    let waiter = ConvergenceWaiter::interruptible(cli.command.wait_timeout());

    let mut ctx = Context {
        mode,
        out,
        store: KubeStore::new(client, FIELD_MANAGER),
        engine: PatchEngine::default(),
        waiter,
    };
    cli.command.run(&mut ctx).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mode_from_leaf() {
        let matches = Cli::command()
            .try_get_matches_from(["kp", "cb", "patch", "b", "--stack", "s", "--dry-run"])
            .unwrap();
        let mode = ExecutionMode::from_matches(leaf(&matches)).unwrap();
        assert_eq!(mode, ExecutionMode::new(true, None, false));
    }

    #[test]
    fn get_accepts_output_only() {
        let matches = Cli::command()
            .try_get_matches_from(["kp", "get", "cb", "b", "--output", "yaml"])
            .unwrap();
        let mode = ExecutionMode::from_matches(leaf(&matches)).unwrap();
        assert_eq!(mode.output_format(), Some("yaml"));
        assert!(Cli::command()
            .try_get_matches_from(["kp", "get", "cb", "b", "--wait"])
            .is_err());
    }
}
