use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Args, Subcommand};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::{Context, ModeFlags};
use crate::{
    error::{Error, Result},
    resource::{
        order::read_order, reference, Builder, BuilderSpec, ClusterBuilder, ClusterBuilderSpec,
        Converging, HasBuilderSpec, NamespacedBuilderSpec, OrderEntry,
    },
    store::Store,
    wait::DEFAULT_TIMEOUT,
};

#[derive(Args, Debug)]
pub struct CreateArgs {
    name: String,
    /// Registry location the builder image is written to
    #[arg(short, long)]
    tag: String,
    /// Stack resource to use
    #[arg(short, long, default_value = "default")]
    stack: String,
    /// Buildpack store to use
    #[arg(long, default_value = "default")]
    store: String,
    /// Path to buildpack order yaml
    #[arg(short, long)]
    order: PathBuf,
    #[command(flatten)]
    mode: ModeFlags,
}

impl CreateArgs {
    /// Everything is validated before the cluster is contacted
    fn spec(&self) -> Result<BuilderSpec> {
        if self.tag.is_empty() {
            return Err(Error::validation("--tag should not be empty"));
        }
        let order = read_order(&self.order)?;
        Ok(BuilderSpec::new(&self.tag, &self.stack, &self.store, order))
    }
}

#[derive(Args, Debug)]
pub struct PatchArgs {
    name: String,
    /// Stack resource to use
    #[arg(short, long)]
    stack: Option<String>,
    /// Buildpack store to use
    #[arg(long)]
    store: Option<String>,
    /// Path to buildpack order yaml
    #[arg(short, long)]
    order: Option<String>,
    #[command(flatten)]
    mode: ModeFlags,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    name: String,
    /// Registry location the builder image is written to, required when creating
    #[arg(short, long)]
    tag: Option<String>,
    /// Stack resource to use
    #[arg(short, long)]
    stack: Option<String>,
    /// Buildpack store to use
    #[arg(long)]
    store: Option<String>,
    /// Path to buildpack order yaml, required when creating
    #[arg(short, long)]
    order: Option<String>,
    #[command(flatten)]
    mode: ModeFlags,
}

// `--dry-run` is read back from the matches into ExecutionMode
#[derive(Args, Debug)]
#[allow(dead_code)]
pub struct DeleteArgs {
    name: String,
    /// Show what would happen without deleting anything
    #[arg(long)]
    dry_run: bool,
}

/// Field updates a patch is allowed to make, empty values are ignored
#[derive(Debug, Default)]
struct Changes {
    tag: Option<String>,
    stack: Option<String>,
    store: Option<String>,
    order: Option<Vec<OrderEntry>>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

impl Changes {
    fn read(
        tag: &Option<String>,
        stack: &Option<String>,
        store: &Option<String>,
        order: &Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            tag: non_empty(tag),
            stack: non_empty(stack),
            store: non_empty(store),
            order: non_empty(order)
                .map(|path| read_order(Path::new(&path)))
                .transpose()?,
        })
    }

    fn apply<K: HasBuilderSpec>(&self, object: &mut K) {
        let spec = object.builder_spec_mut();
        if let Some(tag) = &self.tag {
            spec.tag = tag.clone();
        }
        if let Some(stack) = &self.stack {
            spec.stack.name = Some(stack.clone());
        }
        if let Some(store) = &self.store {
            spec.store.name = Some(store.clone());
        }
        if let Some(order) = &self.order {
            spec.order = order.clone();
        }
    }

    /// Spec for an object which doesn't exist yet
    fn to_spec(&self) -> Result<BuilderSpec> {
        let tag = self
            .tag
            .as_deref()
            .ok_or_else(|| Error::validation("--tag is required when creating a builder"))?;
        let order = self
            .order
            .clone()
            .ok_or_else(|| Error::validation("--order is required when creating a builder"))?;
        Ok(BuilderSpec::new(
            tag,
            self.stack.as_deref().unwrap_or("default"),
            self.store.as_deref().unwrap_or("default"),
            order,
        ))
    }
}

impl PatchArgs {
    fn changes(&self) -> Result<Changes> {
        Changes::read(&None, &self.stack, &self.store, &self.order)
    }
}

impl SaveArgs {
    fn changes(&self) -> Result<Changes> {
        Changes::read(&self.tag, &self.stack, &self.store, &self.order)
    }
}

async fn patch<K, S>(
    ctx: &mut Context<'_, S>,
    namespace: Option<&str>,
    name: &str,
    changes: Changes,
) -> Result<()>
where
    K: Converging + HasBuilderSpec,
    S: Store,
{
    let observed: K = ctx.store.get(namespace, name).await?;
    let mut desired = observed.clone();
    changes.apply(&mut desired);
    ctx.patch(namespace, &observed, desired).await
}

fn metadata(name: &str, namespace: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_owned()),
        namespace: namespace.map(ToOwned::to_owned),
        ..Default::default()
    }
}

#[derive(Args, Debug)]
pub struct ClusterServiceAccount {
    /// Service account used to access the builder registry
    #[arg(long, default_value = "default")]
    service_account_name: String,
    #[arg(long, default_value = "kpack")]
    service_account_namespace: String,
}

impl ClusterServiceAccount {
    fn builder(&self, name: &str, builder: BuilderSpec) -> ClusterBuilder {
        let mut service_account_ref = reference("ServiceAccount", &self.service_account_name);
        service_account_ref.namespace = Some(self.service_account_namespace.clone());
        ClusterBuilder {
            metadata: metadata(name, None),
            spec: ClusterBuilderSpec {
                builder,
                service_account_ref,
            },
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ClusterBuilderCommand {
    /// Create a cluster builder
    Create {
        #[command(flatten)]
        args: CreateArgs,
        #[command(flatten)]
        service_account: ClusterServiceAccount,
    },
    /// Patch an existing cluster builder configuration
    Patch(PatchArgs),
    /// Create a cluster builder, or patch it if it exists
    Save {
        #[command(flatten)]
        args: SaveArgs,
        #[command(flatten)]
        service_account: ClusterServiceAccount,
    },
    /// Delete a cluster builder
    Delete(DeleteArgs),
}

impl ClusterBuilderCommand {
    pub fn wait_timeout(&self) -> Duration {
        match self {
            Self::Create { args, .. } => args.mode.wait_timeout(),
            Self::Patch(args) => args.mode.wait_timeout(),
            Self::Save { args, .. } => args.mode.wait_timeout(),
            Self::Delete(_) => DEFAULT_TIMEOUT,
        }
    }

    pub async fn run<S: Store>(self, ctx: &mut Context<'_, S>) -> Result<()> {
        match self {
            Self::Create {
                args,
                service_account,
            } => {
                let object = service_account.builder(&args.name, args.spec()?);
                ctx.create(None, object).await
            }
            Self::Patch(args) => {
                let changes = args.changes()?;
                patch::<ClusterBuilder, _>(ctx, None, &args.name, changes).await
            }
            Self::Save {
                args,
                service_account,
            } => {
                let changes = args.changes()?;
                ctx.save(
                    None,
                    &args.name,
                    |object: &mut ClusterBuilder| changes.apply(object),
                    || Ok(service_account.builder(&args.name, changes.to_spec()?)),
                )
                .await
            }
            Self::Delete(args) => ctx.delete::<ClusterBuilder>(None, &args.name).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct Namespaced {
    /// Kubernetes namespace, defaults to the one configured in kubeconfig
    #[arg(short, long)]
    namespace: Option<String>,
}

#[derive(Args, Debug)]
pub struct NamespacedServiceAccount {
    /// Service account used to access the builder registry
    #[arg(long, default_value = "default")]
    service_account: String,
}

impl NamespacedServiceAccount {
    fn builder(&self, name: &str, namespace: Option<&str>, builder: BuilderSpec) -> Builder {
        Builder {
            metadata: metadata(name, namespace),
            spec: NamespacedBuilderSpec {
                builder,
                service_account: self.service_account.clone(),
            },
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum BuilderCommand {
    /// Create a builder
    Create {
        #[command(flatten)]
        args: CreateArgs,
        #[command(flatten)]
        ns: Namespaced,
        #[command(flatten)]
        service_account: NamespacedServiceAccount,
    },
    /// Patch an existing builder configuration
    Patch {
        #[command(flatten)]
        args: PatchArgs,
        #[command(flatten)]
        ns: Namespaced,
    },
    /// Create a builder, or patch it if it exists
    Save {
        #[command(flatten)]
        args: SaveArgs,
        #[command(flatten)]
        ns: Namespaced,
        #[command(flatten)]
        service_account: NamespacedServiceAccount,
    },
    /// Delete a builder
    Delete {
        #[command(flatten)]
        args: DeleteArgs,
        #[command(flatten)]
        ns: Namespaced,
    },
}

impl BuilderCommand {
    pub fn wait_timeout(&self) -> Duration {
        match self {
            Self::Create { args, .. } => args.mode.wait_timeout(),
            Self::Patch { args, .. } => args.mode.wait_timeout(),
            Self::Save { args, .. } => args.mode.wait_timeout(),
            Self::Delete { .. } => DEFAULT_TIMEOUT,
        }
    }

    pub async fn run<S: Store>(self, ctx: &mut Context<'_, S>) -> Result<()> {
        match self {
            Self::Create {
                args,
                ns,
                service_account,
            } => {
                let namespace = ns.namespace.as_deref();
                let object = service_account.builder(&args.name, namespace, args.spec()?);
                ctx.create(namespace, object).await
            }
            Self::Patch { args, ns } => {
                let changes = args.changes()?;
                patch::<Builder, _>(ctx, ns.namespace.as_deref(), &args.name, changes).await
            }
            Self::Save {
                args,
                ns,
                service_account,
            } => {
                let namespace = ns.namespace.as_deref();
                let changes = args.changes()?;
                ctx.save(
                    namespace,
                    &args.name,
                    |object: &mut Builder| changes.apply(object),
                    || {
                        Ok(service_account.builder(
                            &args.name,
                            namespace,
                            changes.to_spec()?,
                        ))
                    },
                )
                .await
            }
            Self::Delete { args, ns } => {
                ctx.delete::<Builder>(ns.namespace.as_deref(), &args.name)
                    .await
            }
        }
    }
}
