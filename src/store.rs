//! Access to resources kept in the cluster

use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use kube::{
    api::{DeleteParams, Patch, PatchParams, PostParams},
    runtime::{watcher, WatchStreamExt},
    Client,
};

use crate::{
    error::{Error, Result},
    patch::MergePatch,
    resource::{KnownResource, ObjectLocation},
};

/// Verbs the commands need from the cluster
///
/// Errors are reported as-is, retrying is up to the implementation.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn get<K: KnownResource>(&self, namespace: Option<&str>, name: &str) -> Result<K>;
    async fn create<K: KnownResource>(&self, namespace: Option<&str>, object: &K) -> Result<K>;
    async fn patch<K: KnownResource>(
        &self,
        namespace: Option<&str>,
        name: &str,
        patch: &MergePatch,
    ) -> Result<K>;
    async fn delete<K: KnownResource>(&self, namespace: Option<&str>, name: &str) -> Result<()>;
    /// Every observed version of a single object
    fn watch<K: KnownResource>(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> BoxStream<'static, Result<K>>;
}

fn remote<K: KnownResource>(
    op: &'static str,
    namespace: Option<&str>,
    name: &str,
) -> impl FnOnce(kube::Error) -> Error {
    let location = ObjectLocation::new(name, namespace);
    move |source| Error::Remote {
        op,
        kind: K::kind(&()).into_owned(),
        location,
        source,
    }
}

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    manager: String,
}

impl KubeStore {
    pub fn new(client: Client, manager: &str) -> Self {
        Self {
            client,
            manager: manager.to_owned(),
        }
    }
}

impl Store for KubeStore {
    async fn get<K: KnownResource>(&self, namespace: Option<&str>, name: &str) -> Result<K> {
        log::trace!("get {} {}", K::kind(&()), name);
        K::api(self.client.clone(), namespace)
            .get(name)
            .await
            .map_err(remote::<K>("get", namespace, name))
    }

    async fn create<K: KnownResource>(&self, namespace: Option<&str>, object: &K) -> Result<K> {
        let name = object.meta().name.clone().unwrap_or_default();
        log::trace!("create {} {}", K::kind(&()), name);
        let params = PostParams {
            field_manager: Some(self.manager.clone()),
            ..Default::default()
        };
        K::api(self.client.clone(), namespace)
            .create(&params, object)
            .await
            .map_err(remote::<K>("create", namespace, &name))
    }

    async fn patch<K: KnownResource>(
        &self,
        namespace: Option<&str>,
        name: &str,
        patch: &MergePatch,
    ) -> Result<K> {
        log::trace!("patch {} {} with {}", K::kind(&()), name, patch);
        let params = PatchParams {
            field_manager: Some(self.manager.clone()),
            ..Default::default()
        };
        K::api(self.client.clone(), namespace)
            .patch(name, &params, &Patch::Merge(patch))
            .await
            .map_err(remote::<K>("patch", namespace, name))
    }

    async fn delete<K: KnownResource>(&self, namespace: Option<&str>, name: &str) -> Result<()> {
        log::trace!("delete {} {}", K::kind(&()), name);
        K::api(self.client.clone(), namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(remote::<K>("delete", namespace, name))?;
        Ok(())
    }

    fn watch<K: KnownResource>(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> BoxStream<'static, Result<K>> {
        let api = K::api(self.client.clone(), namespace);
        let location = ObjectLocation::new(name, namespace);
        let config = watcher::Config::default().fields(&format!("metadata.name={}", name));
        watcher(api, config)
            .default_backoff()
            .applied_objects()
            .map_err(move |source| Error::Watch {
                kind: K::kind(&()).into_owned(),
                location: location.clone(),
                source,
            })
            .boxed()
    }
}
