//! Output materializer (noun module)
//!
//! Widget values are stored per `(dimension, group_id)` in a sharded
//! concurrent map so that groups running on different threads never contend
//! on one lock. Every read path returns sorted keys, which keeps documents
//! byte-identical whatever order the groups finished in.

mod error;

pub use error::OutputError;

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Widget key -> widget value for one group
pub type GroupOutput = BTreeMap<String, Value>;

/// `(dimension, group_id) -> widget -> value`
#[derive(Debug, Default)]
pub struct OutputStore {
    groups: DashMap<(String, String), GroupOutput>,
}

impl OutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one widget value; last write wins
    pub fn put(&self, dimension: &str, group_id: &str, widget: &str, value: Value) {
        self.groups
            .entry((dimension.to_string(), group_id.to_string()))
            .or_default()
            .insert(widget.to_string(), value);
    }

    /// One widget value
    pub fn get(&self, dimension: &str, group_id: &str, widget: &str) -> Option<Value> {
        self.groups
            .get(&(dimension.to_string(), group_id.to_string()))
            .and_then(|group| group.get(widget).cloned())
    }

    /// Every widget value of a group
    pub fn get_all(&self, dimension: &str, group_id: &str) -> Option<GroupOutput> {
        self.groups
            .get(&(dimension.to_string(), group_id.to_string()))
            .map(|group| group.value().clone())
    }

    /// Number of groups holding at least one value
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Dimensions with output, sorted
    pub fn dimensions(&self) -> Vec<String> {
        let dims: BTreeSet<String> = self.groups.iter().map(|e| e.key().0.clone()).collect();
        dims.into_iter().collect()
    }

    /// Group ids of a dimension, sorted
    pub fn group_ids(&self, dimension: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .groups
            .iter()
            .filter(|e| e.key().0 == dimension)
            .map(|e| e.key().1.clone())
            .collect();
        ids.sort();
        ids
    }

    /// `group_id -> widget -> value` for one dimension, group ids sorted
    pub fn document(&self, dimension: &str) -> BTreeMap<String, GroupOutput> {
        self.groups
            .iter()
            .filter(|e| e.key().0 == dimension)
            .map(|e| (e.key().1.clone(), e.value().clone()))
            .collect()
    }

    /// The whole store as one JSON value: `dimension -> group_id -> widget -> value`
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for dimension in self.dimensions() {
            let groups = self
                .document(&dimension)
                .into_iter()
                .map(|(id, widgets)| (id, Value::Object(widgets.into_iter().collect())))
                .collect();
            out.insert(dimension, Value::Object(groups));
        }
        Value::Object(out)
    }

    /// Write `<dir>/<dimension>/<group_id>.json`, pretty-printed, one file per group.
    ///
    /// Ids are percent-encoded into file names, so distinct ids never share a
    /// file. Two ids differing only by letter case are rejected before anything
    /// is written, since case-insensitive file systems would merge them.
    ///
    /// Returns the number of files written.
    pub fn write_dir(&self, dir: impl AsRef<Path>) -> Result<usize, OutputError> {
        let dir = dir.as_ref();
        let dimensions = self.dimensions();
        check_stems("", &dimensions)?;
        let documents: Vec<(String, BTreeMap<String, GroupOutput>)> = dimensions
            .into_iter()
            .map(|dimension| -> Result<_, OutputError> {
                let document = self.document(&dimension);
                let ids: Vec<String> = document.keys().cloned().collect();
                check_stems(&dimension, &ids)?;
                Ok((dimension, document))
            })
            .collect::<Result<_, OutputError>>()?;

        let mut written = 0;
        for (dimension, document) in documents {
            let dim_dir = dir.join(file_stem(&dimension));
            fs::create_dir_all(&dim_dir).map_err(|source| OutputError::Io {
                path: dim_dir.display().to_string(),
                source,
            })?;
            for (group_id, widgets) in document {
                let path = dim_dir.join(format!("{}.json", file_stem(&group_id)));
                let mut text = serde_json::to_string_pretty(&widgets)?;
                text.push('\n');
                fs::write(&path, text).map_err(|source| OutputError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                written += 1;
            }
        }
        debug!(dir = %dir.display(), files = written, "wrote outputs");
        Ok(written)
    }
}

/// Reversible, file-system safe stem for an id
fn file_stem(id: &str) -> String {
    match id {
        // never produced by percent-encoding
        "" => "%".to_string(),
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => urlencoding::encode(id).into_owned(),
    }
}

/// Fail when two ids would land in the same file on a case-insensitive file system
fn check_stems(dimension: &str, ids: &[String]) -> Result<(), OutputError> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(ids.len());
    for id in ids {
        if let Some(first) = seen.insert(file_stem(id).to_lowercase(), id.as_str()) {
            return Err(OutputError::NameCollision {
                dimension: dimension.to_string(),
                first: first.to_string(),
                second: id.clone(),
            });
        }
    }
    Ok(())
}
