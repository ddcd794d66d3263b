use clap::Args;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};

use super::Context;
use crate::{
    error::Result,
    registry::ResourceType,
    resource::{Builder, ClusterBuilder, ClusterStack, ClusterStore, Converging, Image},
    store::Store,
};

fn parse_type(name: &str) -> std::result::Result<ResourceType, String> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "secret" | "secrets" => ResourceType::Secret,
        "serviceaccount" | "serviceaccounts" | "sa" => ResourceType::ServiceAccount,
        "image" | "images" | "img" => ResourceType::Image,
        "builder" | "builders" | "bldr" => ResourceType::Builder,
        "clusterbuilder" | "clusterbuilders" | "cb" => ResourceType::ClusterBuilder,
        "clusterstack" | "clusterstacks" | "csk" => ResourceType::ClusterStack,
        "clusterstore" | "clusterstores" | "css" => ResourceType::ClusterStore,
        _ => return Err(format!("unknown resource type {:?}", name)),
    })
}

fn readiness<K: Converging>(object: &K) -> String {
    object.readiness().to_string()
}

// `--output` is read back from the matches into ExecutionMode
#[derive(Args, Debug)]
#[allow(dead_code)]
pub struct GetArgs {
    /// Resource type, such as clusterbuilder or cb
    #[arg(value_parser = parse_type)]
    kind: ResourceType,
    name: String,
    /// Kubernetes namespace, ignored for cluster scoped types
    #[arg(short, long)]
    namespace: Option<String>,
    /// Print the object in the given format (yaml, json)
    #[arg(long, value_name = "FORMAT")]
    output: Option<String>,
}

impl GetArgs {
    pub async fn run<S: Store>(self, ctx: &mut Context<'_, S>) -> Result<()> {
        let namespace = self.namespace.as_deref();
        let name = &self.name;
        match self.kind {
            ResourceType::Secret => ctx.show::<Secret>(namespace, name, |_| "exists".to_owned()).await,
            ResourceType::ServiceAccount => {
                ctx.show::<ServiceAccount>(namespace, name, |_| "exists".to_owned())
                    .await
            }
            ResourceType::Image => ctx.show::<Image>(namespace, name, readiness).await,
            ResourceType::Builder => ctx.show::<Builder>(namespace, name, readiness).await,
            ResourceType::ClusterBuilder => {
                ctx.show::<ClusterBuilder>(None, name, readiness).await
            }
            ResourceType::ClusterStack => ctx.show::<ClusterStack>(None, name, readiness).await,
            ResourceType::ClusterStore => ctx.show::<ClusterStore>(None, name, readiness).await,
        }
    }
}
