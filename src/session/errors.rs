use std::time::Duration;

use thiserror::Error;

/// Failures reported by the wrapped driver runtime.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("no node available to satisfy the query plan")]
    NoHostAvailable,

    #[error("server error: {0}")]
    Server(String),

    #[error("connection to the session was closed")]
    ConnectionClosed,
}

/// User-visible failures of the graph execution API.
///
/// Analytics master discovery failures never appear here; they degrade to
/// default routing inside the redirection protocol.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("graph execution misconfigured: {0}")]
    Configuration(String),

    #[error("graph request timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("failed to decode graph result: {0}")]
    Decode(String),
}
