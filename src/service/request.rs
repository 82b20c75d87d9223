use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Database combo placeholder; never a real database.
pub const NO_DATABASE: &str = "Select a database";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("no database selected")]
    NoDatabase,
    #[error("select at least one vertex key")]
    NoVertexKeys,
}

/// Body of a grouping query, in the server's camelCase JSON form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingRequest {
    pub db_name: String,
    pub vertex_keys: Vec<String>,
    pub edge_keys: Vec<String>,
    pub vertex_aggr_funcs: Vec<String>,
    pub edge_aggr_funcs: Vec<String>,
    pub vertex_filters: Vec<String>,
    pub edge_filters: Vec<String>,
    pub filter_all_edges: bool,
}

impl GroupingRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.db_name == NO_DATABASE || self.db_name.trim().is_empty() {
            return Err(RequestError::NoDatabase);
        }
        if self.vertex_keys.is_empty() {
            return Err(RequestError::NoVertexKeys);
        }
        Ok(())
    }
}
