//! Typed models of the resources kept in the cluster

mod builder;
mod image;
pub mod order;
mod stack;

pub use builder::{
    reference, Builder, BuilderSpec, BuildpackRef, ClusterBuilder, ClusterBuilderSpec,
    HasBuilderSpec, NamespacedBuilderSpec, OrderEntry,
};
pub use image::Image;
pub use stack::{ClusterStack, ClusterStore};

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::{self, Debug, Display},
};

use duplicate::duplicate_item;
use k8s_openapi::{
    api::core::v1::{Secret, ServiceAccount},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::{
    api::DynamicObject,
    core::{ClusterResourceScope, NamespaceResourceScope},
    Api, Client, Resource,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{ObjectKind, ResourceType};

/// Represents object location
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectLocation {
    pub name: String,
    pub namespace: Option<String>,
}

impl ObjectLocation {
    pub fn new(name: &str, namespace: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.map(ToOwned::to_owned),
        }
    }
}

impl Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.name)?;
        if let Some(ns) = &self.namespace {
            write!(f, " in {}", ns)?;
        }
        Ok(())
    }
}

/// Anything which can be written in output mode
pub trait Printable {
    /// `None` for objects decoded without a static type
    fn resource_type(&self) -> Option<ResourceType>;
    /// Identity embedded in the object itself, may be empty
    fn object_kind(&self) -> ObjectKind;
    fn to_value(&self) -> serde_json::Result<Value>;
}

pub trait KnownResource:
    Resource<DynamicType = ()>
    + Printable
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const TYPE: ResourceType;

    fn api(client: Client, namespace: Option<&str>) -> Api<Self>;
}

fn namespaced_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::default_namespaced(client),
    }
}

fn cluster_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<DynamicType = ()>,
{
    if let Some(ns) = namespace {
        log::debug!("{} is cluster scoped, ignoring namespace {}", K::kind(&()), ns);
    }
    Api::all(client)
}

#[duplicate_item(
    ty make_api;
    [Secret] [namespaced_api(client, namespace)];
    [ServiceAccount] [namespaced_api(client, namespace)];
    [Image] [namespaced_api(client, namespace)];
    [Builder] [namespaced_api(client, namespace)];
    [ClusterBuilder] [cluster_api(client, namespace)];
    [ClusterStack] [cluster_api(client, namespace)];
    [ClusterStore] [cluster_api(client, namespace)];
)]
impl KnownResource for ty {
    const TYPE: ResourceType = ResourceType::ty;

    fn api(client: Client, namespace: Option<&str>) -> Api<Self> {
        make_api
    }
}

// Core types always serialize their apiVersion and kind
#[duplicate_item(ty; [Secret]; [ServiceAccount])]
impl Printable for ty {
    fn resource_type(&self) -> Option<ResourceType> {
        Some(ResourceType::ty)
    }
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::new(&Self::api_version(&()), &Self::kind(&()))
    }
    fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[duplicate_item(
    ty;
    [Image]; [Builder]; [ClusterBuilder]; [ClusterStack]; [ClusterStore];
)]
impl Printable for ty {
    fn resource_type(&self) -> Option<ResourceType> {
        Some(ResourceType::ty)
    }
    fn object_kind(&self) -> ObjectKind {
        self.types
            .as_ref()
            .map(|t| ObjectKind::new(&t.api_version, &t.kind))
            .unwrap_or_default()
    }
    fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl Printable for DynamicObject {
    fn resource_type(&self) -> Option<ResourceType> {
        None
    }
    fn object_kind(&self) -> ObjectKind {
        self.types
            .as_ref()
            .map(|t| ObjectKind::new(&t.api_version, &t.kind))
            .unwrap_or_default()
    }
    fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[duplicate_item(
    ty scope plural_name;
    [Image] [NamespaceResourceScope] ["images"];
    [Builder] [NamespaceResourceScope] ["builders"];
    [ClusterBuilder] [ClusterResourceScope] ["clusterbuilders"];
    [ClusterStack] [ClusterResourceScope] ["clusterstacks"];
    [ClusterStore] [ClusterResourceScope] ["clusterstores"];
)]
impl Resource for ty {
    type DynamicType = ();
    type Scope = scope;

    fn kind(_: &()) -> Cow<'_, str> {
        ResourceType::ty.name().into()
    }
    fn group(_: &()) -> Cow<'_, str> {
        "build.pivotal.io".into()
    }
    fn version(_: &()) -> Cow<'_, str> {
        "v1alpha1".into()
    }
    fn plural(_: &()) -> Cow<'_, str> {
        plural_name.into()
    }
    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }
    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

/// Status shared by every build resource
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_image: Option<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(String),
}

impl Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "not ready"),
            Self::Ready => write!(f, "ready"),
            Self::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Resources reporting a `Ready` condition once the server has processed them
pub trait Converging: KnownResource {
    fn readiness(&self) -> Readiness;
}

#[duplicate_item(
    ty;
    [Image]; [Builder]; [ClusterBuilder]; [ClusterStack]; [ClusterStore];
)]
impl Converging for ty {
    fn readiness(&self) -> Readiness {
        readiness(&self.metadata, self.status.as_ref())
    }
}

fn readiness(meta: &ObjectMeta, status: Option<&Status>) -> Readiness {
    let Some(status) = status else {
        return Readiness::Pending;
    };
    // Conditions describe an older spec until the controller catches up
    if let (Some(generation), Some(observed)) = (meta.generation, status.observed_generation) {
        if observed < generation {
            return Readiness::Pending;
        }
    }
    match status.conditions.iter().find(|c| c.type_ == "Ready") {
        Some(c) if c.status == "True" => Readiness::Ready,
        Some(c) if c.status == "False" => Readiness::Failed(
            c.message
                .clone()
                .or_else(|| c.reason.clone())
                .unwrap_or_else(|| "Ready condition is False".to_owned()),
        ),
        _ => Readiness::Pending,
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use serde_json::json;

    pub fn ready_status(generation: i64, status: &str, message: Option<&str>) -> Status {
        Status {
            observed_generation: Some(generation),
            conditions: vec![Condition {
                type_: "Ready".to_owned(),
                status: status.to_owned(),
                message: message.map(ToOwned::to_owned),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn resource_identity() {
        assert_eq!(Image::plural(&()), "images");
        assert_eq!(ClusterStore::plural(&()), "clusterstores");
        assert_eq!(
            ClusterBuilder::api_version(&()),
            "build.pivotal.io/v1alpha1"
        );
        assert_eq!(Builder::kind(&()), "Builder");
        assert_eq!(<ClusterStack as KnownResource>::TYPE, ResourceType::ClusterStack);
        assert_eq!(<Secret as KnownResource>::TYPE, ResourceType::Secret);
    }

    #[test]
    fn readiness_follows_ready_condition() {
        let mut builder = ClusterBuilder::default();
        assert_eq!(builder.readiness(), Readiness::Pending);

        builder.status = Some(ready_status(1, "Unknown", None));
        assert_eq!(builder.readiness(), Readiness::Pending);

        builder.status = Some(ready_status(1, "True", None));
        assert_eq!(builder.readiness(), Readiness::Ready);

        builder.status = Some(ready_status(1, "False", Some("stack not found")));
        assert_eq!(
            builder.readiness(),
            Readiness::Failed("stack not found".to_owned())
        );
    }

    #[test]
    fn readiness_waits_for_observed_generation() {
        let mut builder = ClusterBuilder::default();
        builder.metadata.generation = Some(3);
        builder.status = Some(ready_status(2, "True", None));
        assert_eq!(builder.readiness(), Readiness::Pending);

        builder.status = Some(ready_status(3, "True", None));
        assert_eq!(builder.readiness(), Readiness::Ready);
    }

    #[test]
    fn embedded_identity() {
        let parsed: ClusterBuilder = serde_json::from_value(json!({
            "apiVersion": "build.pivotal.io/v1alpha1",
            "kind": "ClusterBuilder",
            "metadata": {"name": "default"},
            "spec": {"tag": "registry.io/builder"},
        }))
        .unwrap();
        assert_eq!(
            parsed.object_kind(),
            ObjectKind::new("build.pivotal.io/v1alpha1", "ClusterBuilder")
        );
        assert!(ClusterBuilder::default().object_kind().is_empty());
        assert!(Secret::default().object_kind() == ObjectKind::new("v1", "Secret"));
    }

    #[test]
    fn status_keeps_unknown_fields() {
        let status: Status = serde_json::from_value(json!({
            "observedGeneration": 2,
            "stack": {"id": "io.buildpacks.stacks.bionic"},
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({
                "observedGeneration": 2,
                "stack": {"id": "io.buildpacks.stacks.bionic"},
            })
        );
    }

    #[test]
    fn location() {
        assert_eq!(ObjectLocation::new("b", None).to_string(), "\"b\"");
        assert_eq!(
            ObjectLocation::new("b", Some("team")).to_string(),
            "\"b\" in team"
        );
    }
}
