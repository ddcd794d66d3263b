//! Addressing of fields inside JSON documents.
//!
//! Paths are printed in the same notation the API server uses in field
//! manager and conflict messages, e.g. `.spec.order[0].group`.

mod error;
pub use error::*;
mod element;
pub use element::Element;
mod ext;
mod path;
pub use ext::FieldpathExt;
pub use path::{Path, PathBuf};
mod walk;
pub use walk::leaves;

/// Construct &Path without allocating
#[macro_export]
macro_rules! path {
    ($(.$text:literal)+) => {
        &[$($crate::Element::StaticField($text)),+][..] as &$crate::Path
    };
}
