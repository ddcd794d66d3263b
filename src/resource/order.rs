//! Builder order definitions stored in YAML files

use std::{fs, path::Path};

use serde::Deserialize;
use serde_yaml_with_quirks::DeserializingQuirks;

use super::OrderEntry;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct OrderFile {
    #[serde(default)]
    order: Vec<OrderEntry>,
}

pub fn read_order(path: &Path) -> Result<Vec<OrderEntry>> {
    parse_file(path).map_err(|e| Error::OrderFile {
        path: path.to_owned(),
        source: Box::new(e),
    })
}

fn parse_file(path: &Path) -> Result<Vec<OrderEntry>> {
    let contents = fs::read_to_string(path)?;
    parse_order(&contents)
}

/// Only the first document is read
pub fn parse_order(contents: &str) -> Result<Vec<OrderEntry>> {
    let document = serde_yaml_with_quirks::Deserializer::from_str_with_quirks(
        contents,
        DeserializingQuirks { old_octals: true },
    )
    .next()
    .ok_or_else(|| Error::validation("order file is empty"))?;
    let file = OrderFile::deserialize(document)?;
    if file.order.is_empty() {
        return Err(Error::validation("order file has no entries"));
    }
    Ok(file.order)
}
