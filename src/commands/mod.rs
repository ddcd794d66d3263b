//! Command tree and the convergence steps every command shares

mod builder;
mod get;

pub use builder::{BuilderCommand, ClusterBuilderCommand};
pub use get::GetArgs;

use std::time::Duration;

use clap::{Args, Subcommand};

use crate::{
    error::Result,
    mode::ExecutionMode,
    output::OutputRouter,
    patch::PatchEngine,
    resource::{Converging, KnownResource},
    store::Store,
    wait::{ConvergenceWaiter, DEFAULT_TIMEOUT},
};

// Flags deciding how a mutation is carried out. They are read back through
// ExecutionMode::from_matches, so unset flags behave the same as undeclared
// ones. Only `wait_timeout` is read from the struct.
#[derive(Args, Debug, Default)]
#[allow(dead_code)]
pub struct ModeFlags {
    /// Show what would happen without submitting anything
    #[arg(long)]
    dry_run: bool,
    /// Print resulting objects in the given format (yaml, json) instead of status text
    #[arg(long, value_name = "FORMAT")]
    output: Option<String>,
    /// Wait until the cluster finishes processing the change
    #[arg(long)]
    wait: bool,
    /// Give up waiting after this many seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    wait_timeout: u64,
}

impl ModeFlags {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage cluster scoped builders
    #[command(name = "clusterbuilder", visible_alias = "cb", subcommand)]
    ClusterBuilder(ClusterBuilderCommand),
    /// Manage namespaced builders
    #[command(visible_alias = "b", subcommand)]
    Builder(BuilderCommand),
    /// Show a single resource
    Get(GetArgs),
}

impl Command {
    pub fn wait_timeout(&self) -> Duration {
        match self {
            Self::ClusterBuilder(cmd) => cmd.wait_timeout(),
            Self::Builder(cmd) => cmd.wait_timeout(),
            Self::Get(_) => DEFAULT_TIMEOUT,
        }
    }

    pub async fn run<S: Store>(self, ctx: &mut Context<'_, S>) -> Result<()> {
        match self {
            Self::ClusterBuilder(cmd) => cmd.run(ctx).await,
            Self::Builder(cmd) => cmd.run(ctx).await,
            Self::Get(args) => args.run(ctx).await,
        }
    }
}

/// Everything a single invocation works with
pub struct Context<'w, S> {
    pub mode: ExecutionMode,
    pub out: OutputRouter<'w>,
    pub store: S,
    pub engine: PatchEngine,
    pub waiter: ConvergenceWaiter,
}

fn name_of<K: KnownResource>(object: &K) -> String {
    object.meta().name.clone().unwrap_or_default()
}

impl<S: Store> Context<'_, S> {
    pub async fn create<K: Converging>(&mut self, namespace: Option<&str>, object: K) -> Result<()> {
        let name = name_of(&object);
        let created = if self.mode.is_dry_run() {
            object
        } else {
            self.store.create(namespace, &object).await?
        };
        let created = self.converge(namespace, created).await?;
        self.out.emit_objects(&[&created])?;
        self.out.emit_result(format_args!("\"{}\" created", name))
    }

    /// Submits the difference between both snapshots, if there is any
    pub async fn patch<K: Converging>(
        &mut self,
        namespace: Option<&str>,
        observed: &K,
        desired: K,
    ) -> Result<()> {
        let name = name_of(observed);
        let patch = self.engine.diff(observed, &desired)?;
        if patch.to_bytes()?.is_empty() {
            self.out.emit_objects(&[observed])?;
            return self.out.emit_result("nothing to patch");
        }
        log::debug!("patch for {} \"{}\": {}", K::TYPE, name, patch);

        let patched = if self.mode.is_dry_run() {
            desired
        } else {
            self.store.patch(namespace, &name, &patch).await?
        };
        let patched = self.converge(namespace, patched).await?;
        self.out.emit_objects(&[&patched])?;
        self.out.emit_result(format_args!("\"{}\" patched", name))
    }

    /// Patches the object if it exists, creates it otherwise
    pub async fn save<K: Converging>(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        update: impl FnOnce(&mut K),
        create: impl FnOnce() -> Result<K>,
    ) -> Result<()> {
        match self.store.get::<K>(namespace, name).await {
            Ok(observed) => {
                let mut desired = observed.clone();
                update(&mut desired);
                self.patch(namespace, &observed, desired).await
            }
            Err(e) if e.is_not_found() => {
                log::debug!("{} \"{}\" not found, creating", K::TYPE, name);
                let object = create()?;
                self.create(namespace, object).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn delete<K: KnownResource>(&mut self, namespace: Option<&str>, name: &str) -> Result<()> {
        if !self.mode.is_dry_run() {
            self.store.delete::<K>(namespace, name).await?;
        }
        self.out.emit_result(format_args!("\"{}\" deleted", name))
    }

    pub async fn show<K: KnownResource>(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        describe: impl FnOnce(&K) -> String,
    ) -> Result<()> {
        let object = self.store.get::<K>(namespace, name).await?;
        if self.mode.output_requested() {
            return self.out.emit_objects(&[&object]);
        }
        self.out
            .emit_line(format_args!("{} \"{}\" {}", K::TYPE, name, describe(&object)))
    }

    async fn converge<K: Converging>(&mut self, namespace: Option<&str>, object: K) -> Result<K> {
        if !self.mode.should_wait() {
            return Ok(object);
        }
        let name = name_of(&object);
        log::debug!("waiting up to {:?} for {} \"{}\"", self.waiter.timeout(), K::TYPE, name);
        self.out.emit_status(format_args!(
            "Waiting for {} \"{}\" to become ready...",
            K::TYPE,
            name
        ))?;
        self.waiter.wait(&self.store, namespace, &name).await
    }
}
