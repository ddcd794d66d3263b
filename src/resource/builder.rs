use k8s_openapi::{
    api::core::v1::ObjectReference,
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::core::TypeMeta;
use serde::{Deserialize, Serialize};

use super::Status;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildpackRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// One group of buildpacks tried during detection
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderEntry {
    #[serde(default)]
    pub group: Vec<BuildpackRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderSpec {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub stack: ObjectReference,
    #[serde(default)]
    pub store: ObjectReference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<OrderEntry>,
}

impl BuilderSpec {
    pub fn new(tag: &str, stack: &str, store: &str, order: Vec<OrderEntry>) -> Self {
        Self {
            tag: tag.to_owned(),
            stack: reference("ClusterStack", stack),
            store: reference("ClusterStore", store),
            order,
        }
    }
}

pub fn reference(kind: &str, name: &str) -> ObjectReference {
    ObjectReference {
        kind: Some(kind.to_owned()),
        name: Some(name.to_owned()),
        ..Default::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBuilderSpec {
    #[serde(flatten)]
    pub builder: BuilderSpec,
    #[serde(default)]
    pub service_account_ref: ObjectReference,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespacedBuilderSpec {
    #[serde(flatten)]
    pub builder: BuilderSpec,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_account: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterBuilder {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    pub metadata: ObjectMeta,
    pub spec: ClusterBuilderSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Builder {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    pub metadata: ObjectMeta,
    pub spec: NamespacedBuilderSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

/// Builder specs shared between namespaced and cluster builders
pub trait HasBuilderSpec {
    fn builder_spec_mut(&mut self) -> &mut BuilderSpec;
}

impl HasBuilderSpec for ClusterBuilder {
    fn builder_spec_mut(&mut self) -> &mut BuilderSpec {
        &mut self.spec.builder
    }
}

impl HasBuilderSpec for Builder {
    fn builder_spec_mut(&mut self) -> &mut BuilderSpec {
        &mut self.spec.builder
    }
}
