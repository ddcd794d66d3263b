//! Blocking until the cluster finishes processing a change

use std::time::Duration;

use futures::{
    future::{BoxFuture, Shared},
    FutureExt, StreamExt,
};

use crate::{
    error::{Error, Result},
    resource::{Converging, ObjectLocation, Readiness},
    store::Store,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

pub type Cancellation = Shared<BoxFuture<'static, ()>>;

/// Follows the watch stream of an object until it becomes ready or fails
///
/// Giving up on the wait leaves the already submitted change in place.
#[derive(Clone)]
pub struct ConvergenceWaiter {
    timeout: Duration,
    cancel: Cancellation,
}

impl ConvergenceWaiter {
    pub fn new(timeout: Duration, cancel: Cancellation) -> Self {
        Self { timeout, cancel }
    }

    /// Cancelled on Ctrl-C
    pub fn interruptible(timeout: Duration) -> Self {
        let cancel = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("failed to listen for interrupts: {}", e);
                futures::future::pending::<()>().await
            }
        };
        Self::new(timeout, cancel.boxed().shared())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn wait<K: Converging, S: Store>(
        &self,
        store: &S,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<K> {
        let location = ObjectLocation::new(name, namespace);
        let kind = K::TYPE.to_string();
        let mut events = store.watch::<K>(namespace, name);

        let converged = async {
            while let Some(object) = events.next().await {
                let object = match object {
                    Ok(object) => object,
                    // The watcher reconnects on its own
                    Err(e @ Error::Watch { .. }) => {
                        log::warn!("{}, still waiting", e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                match object.readiness() {
                    Readiness::Ready => return Ok(object),
                    Readiness::Failed(message) => {
                        return Err(Error::WaitFailed {
                            kind: kind.clone(),
                            location: location.clone(),
                            message,
                        })
                    }
                    Readiness::Pending => log::debug!("{} {} is not ready yet", kind, location),
                }
            }
            Err::<K, _>(Error::WatchClosed {
                kind: kind.clone(),
                location: location.clone(),
            })
        };

        tokio::select! {
            result = tokio::time::timeout(self.timeout, converged) => match result {
                Ok(result) => result,
                Err(_) => Err(Error::WaitTimeout {
                    kind: kind.clone(),
                    location: location.clone(),
                    timeout: self.timeout,
                }),
            },
            _ = self.cancel.clone() => Err(Error::WaitInterrupted {
                kind: kind.clone(),
                location: location.clone(),
            }),
        }
    }
}
