use thiserror::Error;

use crate::graph_utils::graph::{GraphPayload, KeySet};
use request::GroupingRequest;

pub mod broker;
pub mod directory;
pub mod memory;
pub mod request;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unknown database '{0}'")]
    UnknownDatabase(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0} is not supported by this data service")]
    Unsupported(&'static str),
    #[error("data service worker is gone")]
    Disconnected,
}

/// The server side of the front-end: database listing, key discovery and graph fetches.
pub trait GraphDataService: Send {
    fn list_databases(&self) -> Result<Vec<String>, ServiceError>;
    fn get_keys(&self, database: &str) -> Result<KeySet, ServiceError>;
    fn get_whole_graph(&self, database: &str) -> Result<GraphPayload, ServiceError>;
    fn run_grouping_query(&self, request: &GroupingRequest) -> Result<GraphPayload, ServiceError>;
}

impl<T: GraphDataService + ?Sized> GraphDataService for Box<T> {
    fn list_databases(&self) -> Result<Vec<String>, ServiceError> { (**self).list_databases() }
    fn get_keys(&self, database: &str) -> Result<KeySet, ServiceError> { (**self).get_keys(database) }
    fn get_whole_graph(&self, database: &str) -> Result<GraphPayload, ServiceError> { (**self).get_whole_graph(database) }
    fn run_grouping_query(&self, request: &GroupingRequest) -> Result<GraphPayload, ServiceError> {
        (**self).run_grouping_query(request)
    }
}
