use thiserror::Error;

use crate::PathBuf;

#[derive(Error, Debug)]
pub enum Error {
    #[error("field not found")]
    FieldNotFound,
    #[error("field parent is not an object")]
    NotAnObject,
    #[error("index target is not an array")]
    NotAnArray,
    #[error("index out of bounds")]
    OutOfBounds,
    #[error("path is empty")]
    EmptyPath,
    #[error("at {0}: {1}")]
    AtPath(PathBuf, Box<Error>),
}
pub type Result<T> = std::result::Result<T, Error>;
