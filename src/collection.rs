//! API-collection merge: splice request fragments into the folders of a base
//! Postman collection and write the combined document.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::CollectionConfig;
use crate::error::CollectionError;

/// Where the merge reads from and writes to.
#[derive(Debug, Clone)]
pub struct MergeSpec {
    pub base: PathBuf,
    pub output: PathBuf,
    /// `fragments[i]` replaces `item[i].item` of the base.
    pub fragments: Vec<PathBuf>,
}

impl MergeSpec {
    /// Resolve the configured file names against `dir`.
    pub fn from_config(config: &CollectionConfig, dir: &Path) -> Self {
        Self {
            base: dir.join(&config.base),
            output: dir.join(&config.output),
            fragments: config.parts.iter().map(|p| dir.join(p)).collect(),
        }
    }
}

/// Summary of a completed merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub folders: usize,
    pub requests: usize,
}

fn read_json(path: &Path) -> Result<Value, CollectionError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| CollectionError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CollectionError::Parse {
        path: display,
        source,
    })
}

/// Replace each target folder's items with its fragment. Pure; no I/O.
pub fn merge(
    mut base: Value,
    fragments: Vec<(String, Value)>,
) -> Result<Value, CollectionError> {
    let folders = base
        .get_mut("item")
        .and_then(Value::as_array_mut)
        .ok_or(CollectionError::MissingItems)?;
    let available = folders.len();

    for (index, (name, fragment)) in fragments.into_iter().enumerate() {
        let folder = folders
            .get_mut(index)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| CollectionError::FolderOutOfRange {
                fragment: name.clone(),
                index,
                available,
            })?;
        folder.insert("item".to_string(), fragment);
    }
    Ok(base)
}

/// Read base and fragments, merge, and write the output pretty-printed.
pub fn combine(spec: &MergeSpec) -> Result<MergeSummary, CollectionError> {
    let base = read_json(&spec.base)?;
    let fragments = spec
        .fragments
        .iter()
        .map(|path| read_json(path).map(|v| (path.display().to_string(), v)))
        .collect::<Result<Vec<_>, _>>()?;

    let requests = fragments
        .iter()
        .map(|(_, v)| v.as_array().map_or(1, Vec::len))
        .sum();
    let folders = fragments.len();

    let merged = merge(base, fragments)?;
    let rendered = serde_json::to_string_pretty(&merged).map_err(|source| CollectionError::Parse {
        path: spec.output.display().to_string(),
        source,
    })?;
    std::fs::write(&spec.output, rendered).map_err(|source| CollectionError::Write {
        path: spec.output.display().to_string(),
        source,
    })?;

    tracing::info!(output = %spec.output.display(), folders, requests, "collection written");
    Ok(MergeSummary {
        output: spec.output.clone(),
        folders,
        requests,
    })
}
