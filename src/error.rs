use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::resource::ObjectLocation;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("failed to {op} {kind} {location}: {source}")]
    Remote {
        op: &'static str,
        kind: String,
        location: ObjectLocation,
        #[source]
        source: kube::Error,
    },
    #[error("failed to output. unknown type {0:?}")]
    UnknownType(String),
    #[error("failed to read order from {path}: {source}")]
    OrderFile {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
    #[error("{kind} {location} failed: {message}")]
    WaitFailed {
        kind: String,
        location: ObjectLocation,
        message: String,
    },
    #[error("timed out after {timeout:?} waiting for {kind} {location}")]
    WaitTimeout {
        kind: String,
        location: ObjectLocation,
        timeout: Duration,
    },
    #[error("interrupted while waiting for {kind} {location}, the change was already applied")]
    WaitInterrupted {
        kind: String,
        location: ObjectLocation,
    },
    #[error("watch for {kind} {location} failed: {source}")]
    Watch {
        kind: String,
        location: ObjectLocation,
        #[source]
        source: kube::runtime::watcher::Error,
    },
    #[error("watch for {kind} {location} ended before it became ready")]
    WatchClosed {
        kind: String,
        location: ObjectLocation,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml_with_quirks::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("path error: {0}")]
    Path(#[from] fieldpath::Error),
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),
}
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Remote {
                source: kube::Error::Api(response),
                ..
            } if response.code == 404
        )
    }
}
