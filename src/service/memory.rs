use std::collections::BTreeMap;

use super::request::GroupingRequest;
use super::{GraphDataService, ServiceError};
use crate::graph_utils::graph::{GraphPayload, KeySet};

#[derive(Debug, Clone, Default)]
struct Database {
    keys: KeySet,
    graph: GraphPayload,
    grouped: Option<GraphPayload>,
}

/// In-process data service holding a fixed set of databases.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataService {
    databases: BTreeMap<String, Database>,
}

impl MemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, name: impl Into<String>, keys: KeySet, graph: GraphPayload) -> Self {
        self.databases.insert(name.into(), Database { keys, graph, grouped: None });
        self
    }

    // Canned answer for every grouping query against `name`
    pub fn with_grouping_result(mut self, name: &str, grouped: GraphPayload) -> Self {
        if let Some(db) = self.databases.get_mut(name) {
            db.grouped = Some(grouped);
        }
        self
    }

    fn database(&self, name: &str) -> Result<&Database, ServiceError> {
        self.databases.get(name).ok_or_else(|| ServiceError::UnknownDatabase(name.to_string()))
    }
}

impl GraphDataService for MemoryDataService {
    fn list_databases(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.databases.keys().cloned().collect())
    }

    fn get_keys(&self, database: &str) -> Result<KeySet, ServiceError> {
        Ok(self.database(database)?.keys.clone())
    }

    fn get_whole_graph(&self, database: &str) -> Result<GraphPayload, ServiceError> {
        Ok(self.database(database)?.graph.clone())
    }

    fn run_grouping_query(&self, request: &GroupingRequest) -> Result<GraphPayload, ServiceError> {
        self.database(&request.db_name)?
            .grouped
            .clone()
            .ok_or(ServiceError::Unsupported("grouping"))
    }
}
