use serde_json::Value;

use crate::{Element, PathBuf};

/// Lists paths to every leaf of a document
///
/// Objects are descended into, anything else (including arrays, `null` and
/// empty objects) is reported as a leaf.
pub fn leaves(value: &Value) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(value, PathBuf::default(), &mut out);
    out
}

fn walk(value: &Value, at: PathBuf, out: &mut Vec<PathBuf>) {
    match value {
        Value::Object(obj) if !obj.is_empty() => {
            for (key, value) in obj {
                walk(value, at.join(Element::Field(key.clone())), out);
            }
        }
        _ if at.is_empty() => {}
        _ => out.push(at),
    }
}
