//! Merge patch computation (RFC 7386)

use std::fmt::{self, Display};

use fieldpath::{path, FieldpathExt, Path, PathBuf};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Partial document, present fields are set, `null` fields are removed,
/// absent fields are left untouched
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergePatch(Map<String, Value>);

impl MergePatch {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empty patch is encoded as zero bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::to_vec(&self.0)?)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn changed_paths(&self) -> Vec<PathBuf> {
        fieldpath::leaves(&self.as_value())
    }

    pub fn apply_to(&self, target: &mut Value) {
        json_patch::merge(target, &self.as_value())
    }
}

impl Serialize for MergePatch {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl Display for MergePatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

#[derive(Clone, Debug)]
pub struct PatchEngine {
    ignored: Vec<PathBuf>,
}

impl Default for PatchEngine {
    /// Ignores fields owned by the server, drift in them never ends up in a patch
    fn default() -> Self {
        Self::ignoring(&[
            path!(."status"),
            path!(."metadata"."managedFields"),
            path!(."metadata"."resourceVersion"),
            path!(."metadata"."generation"),
            path!(."metadata"."uid"),
            path!(."metadata"."creationTimestamp"),
            path!(."metadata"."selfLink"),
        ])
    }
}

impl PatchEngine {
    pub fn ignoring(paths: &[&Path]) -> Self {
        Self {
            ignored: paths.iter().map(|p| PathBuf::from(*p)).collect(),
        }
    }

    /// Computes the patch turning `observed` into `desired`
    pub fn diff<T: Serialize>(&self, observed: &T, desired: &T) -> Result<MergePatch> {
        let observed = self.strip(serde_json::to_value(observed)?);
        let desired = self.strip(serde_json::to_value(desired)?);

        let patch = match (observed, desired) {
            (Value::Object(observed), Value::Object(desired)) => diff_objects(&observed, &desired),
            (observed, desired) if observed == desired => Map::new(),
            (_, desired) => {
                log::warn!("patched object is not a map, replacing everything");
                match desired {
                    Value::Object(desired) => desired,
                    _ => Map::new(),
                }
            }
        };
        let patch = MergePatch(patch);
        for path in patch.changed_paths() {
            log::trace!("changed {}", path);
        }
        Ok(patch)
    }

    fn strip(&self, mut value: Value) -> Value {
        for path in self.ignored.iter() {
            let _res = value.remove_path(path);
        }
        value
    }
}

fn diff_objects(observed: &Map<String, Value>, desired: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for key in observed.keys() {
        if !desired.contains_key(key) {
            out.insert(key.clone(), Value::Null);
        }
    }
    for (key, desired) in desired {
        match (observed.get(key), desired) {
            (Some(observed), desired) if observed == desired => {}
            (Some(Value::Object(observed)), Value::Object(desired)) => {
                let nested = diff_objects(observed, desired);
                if !nested.is_empty() {
                    out.insert(key.clone(), Value::Object(nested));
                }
            }
            // Merge patch has no way to set a field to null, it can only be removed
            (None, Value::Null) => {}
            (_, desired) => {
                out.insert(key.clone(), desired.clone());
            }
        }
    }
    out
}
