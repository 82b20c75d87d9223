use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;

use super::request::GroupingRequest;
use super::{GraphDataService, ServiceError};
use crate::graph_utils::graph::{GraphPayload, KeySet};

pub const KEYS_FILE: &str = "keys.json";
pub const GRAPH_FILE: &str = "graph.json";
pub const GROUPED_FILE: &str = "grouped.json";

/// Data service backed by a directory tree: every subdirectory holding a `keys.json` is a
/// database, with `graph.json` for the whole graph and an optional precomputed
/// `grouped.json` answering grouping queries.
#[derive(Debug, Clone)]
pub struct DirectoryDataService {
    root: PathBuf,
}

impl DirectoryDataService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn database_dir(&self, name: &str) -> Result<PathBuf, ServiceError> {
        // names come from the listing; refuse anything that would leave the root
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ServiceError::UnknownDatabase(name.to_string()));
        }
        let dir = self.root.join(name);
        if dir.join(KEYS_FILE).is_file() {
            Ok(dir)
        } else {
            Err(ServiceError::UnknownDatabase(name.to_string()))
        }
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ServiceError> {
        debug!("reading {}", path.display());
        let s = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&s)?)
    }
}

impl GraphDataService for DirectoryDataService {
    fn list_databases(&self) -> Result<Vec<String>, ServiceError> {
        let mut out = Vec::new();
        for e in fs::read_dir(&self.root)? {
            let p = e?.path();
            if p.join(KEYS_FILE).is_file()
                && let Some(name) = p.file_name().and_then(|s| s.to_str())
            {
                out.push(name.to_string());
            }
        }
        out.sort();
        Ok(out)
    }

    fn get_keys(&self, database: &str) -> Result<KeySet, ServiceError> {
        Self::read_json(&self.database_dir(database)?.join(KEYS_FILE))
    }

    fn get_whole_graph(&self, database: &str) -> Result<GraphPayload, ServiceError> {
        Self::read_json(&self.database_dir(database)?.join(GRAPH_FILE))
    }

    fn run_grouping_query(&self, request: &GroupingRequest) -> Result<GraphPayload, ServiceError> {
        let path = self.database_dir(&request.db_name)?.join(GROUPED_FILE);
        if !path.is_file() {
            return Err(ServiceError::Unsupported("grouping"));
        }
        Self::read_json(&path)
    }
}
