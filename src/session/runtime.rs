//! The contract this crate consumes from the wrapped driver runtime.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cluster::Node;
use crate::session::errors::ExecutionError;
use crate::session::pending::RequestFrame;

/// A plain tuple-shaped row as returned by the wrapped driver.
pub type Row = Vec<serde_json::Value>;

/// The driver runtime underneath a [`GraphSession`](crate::session::GraphSession).
///
/// Implementations wrap the actual wire-protocol driver: `execute_internal`
/// runs a side query on the session with plain row decoding, and `send`
/// dispatches one request using an explicit ordered candidate list in place
/// of policy-computed routing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriverRuntime: Send + Sync {
    /// Execute an internal (non-graph) query on the session.
    async fn execute_internal(&self, query: &str) -> Result<Vec<Row>, ExecutionError>;

    /// Send one request to the first responsive node of `plan`.
    async fn send(&self, frame: &RequestFrame, plan: Vec<Arc<Node>>)
        -> Result<Vec<Row>, ExecutionError>;
}
