//! Graph session execution entry points.
//!
//! A [`GraphSession`] sits on top of a [`DriverRuntime`] and the active
//! load-balancing policy. It resolves each statement's effective options
//! into the request's custom payload, computes the routing plan, and either
//! dispatches immediately or hands the request to the analytics master
//! redirection protocol when the resolved traversal source is
//! analytics-backed.

pub mod errors;
pub mod pending;
pub mod runtime;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::cluster::ClusterMetadata;
use crate::config::GraphClientConfig;
use crate::graph::options::{self, GraphOptions};
use crate::graph::result::{graph_object_row_factory, GraphResultSet, RowFactory};
use crate::graph::statement::{SimpleGraphStatement, Statement};
use crate::routing::analytics::AnalyticsMasterRouter;
use crate::routing::LoadBalancingPolicy;
use crate::session::pending::PendingGraphRequest;

pub use errors::{ExecutionError, GraphError};
pub use pending::RequestFrame;
pub use runtime::{DriverRuntime, Row};

/// Named execution defaults applied between the session tier and the
/// per-statement tier.
#[derive(Debug, Clone, Default)]
pub struct ExecutionProfile {
    /// Graph option defaults for this profile. A profile without graph
    /// options cannot execute graph queries.
    pub graph_options: Option<GraphOptions>,
    /// Per-profile request timeout; falls back to the session default.
    pub request_timeout: Option<Duration>,
}

/// A session extension adding the graph execution API on top of a wrapped
/// driver runtime.
pub struct GraphSession {
    runtime: Arc<dyn DriverRuntime>,
    metadata: Arc<ClusterMetadata>,
    policy: Arc<dyn LoadBalancingPolicy>,
    /// Default options for graph queries; overridden per profile and per
    /// statement.
    pub default_graph_options: GraphOptions,
    default_timeout: Duration,
    profiles: HashMap<String, ExecutionProfile>,
    row_factory: RowFactory,
}

impl GraphSession {
    /// Build a session on top of an already-populated policy: the wrapped
    /// driver's cluster machinery calls `populate` and drives the `on_*`
    /// topology hooks.
    pub fn new(
        runtime: Arc<dyn DriverRuntime>,
        metadata: Arc<ClusterMetadata>,
        policy: Arc<dyn LoadBalancingPolicy>,
        config: &GraphClientConfig,
    ) -> Self {
        let default_graph_options = GraphOptions::new()
            .with_graph_source(config.graph_source.clone())
            .with_graph_language(config.graph_language.clone());

        Self {
            runtime,
            metadata,
            policy,
            default_graph_options,
            default_timeout: config.graph_timeout(),
            profiles: HashMap::new(),
            row_factory: graph_object_row_factory,
        }
    }

    /// Register a named execution profile.
    pub fn add_profile(&mut self, name: impl Into<String>, profile: ExecutionProfile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Replace the row factory used to materialize graph results.
    pub fn set_row_factory(&mut self, row_factory: RowFactory) {
        self.row_factory = row_factory;
    }

    pub fn metadata(&self) -> &Arc<ClusterMetadata> {
        &self.metadata
    }

    /// Execute a Gremlin query string with the session defaults.
    pub async fn execute_graph(&self, query: &str) -> Result<GraphResultSet, GraphError> {
        self.execute_graph_statement(&SimpleGraphStatement::new(query), None)
            .await
    }

    /// Execute a graph statement. `parameters` must be a JSON object of
    /// named parameters; unnamed parameters are not supported.
    pub async fn execute_graph_statement(
        &self,
        statement: &SimpleGraphStatement,
        parameters: Option<&Value>,
    ) -> Result<GraphResultSet, GraphError> {
        self.execute_inner(statement, parameters, None).await
    }

    /// Execute a graph statement under a named execution profile. The
    /// profile's options sit between the session defaults and the
    /// statement's own overrides.
    pub async fn execute_graph_with_profile(
        &self,
        profile: &str,
        statement: &SimpleGraphStatement,
        parameters: Option<&Value>,
    ) -> Result<GraphResultSet, GraphError> {
        self.execute_inner(statement, parameters, Some(profile)).await
    }

    async fn execute_inner(
        &self,
        statement: &SimpleGraphStatement,
        parameters: Option<&Value>,
        profile: Option<&str>,
    ) -> Result<GraphResultSet, GraphError> {
        let (profile_options, timeout) = self.resolve_profile(profile)?;
        let payload = options::resolve(
            &self.default_graph_options,
            profile_options,
            &statement.options,
        );

        let parameters = parameters.map(encode_parameters).transpose()?;
        let frame = RequestFrame::new(statement.query_string(), parameters, payload);

        // The timer starts here: for analytics requests the deadline budget
        // includes the master discovery round trip.
        let deadline = Instant::now() + timeout;
        let plan: Vec<_> = self
            .policy
            .make_query_plan(None, Some(statement as &dyn Statement))
            .collect();
        let (pending, rx) = PendingGraphRequest::new(frame, plan, deadline);

        if options::payload_is_analytics(&pending.frame().payload) && self.policy.supports_targeting()
        {
            AnalyticsMasterRouter::new(Arc::clone(&self.runtime), Arc::clone(&self.policy))
                .spawn(Arc::clone(&pending), statement.clone());
        } else {
            submit(Arc::clone(&self.runtime), Arc::clone(&pending));
        }

        match tokio::time::timeout_at(pending.deadline(), rx).await {
            Ok(Ok(Ok(rows))) => (self.row_factory)(&rows).map(GraphResultSet::new),
            Ok(Ok(Err(err))) => Err(err.into()),
            Ok(Err(_closed)) => Err(ExecutionError::ConnectionClosed.into()),
            Err(_elapsed) => {
                pending.cancel();
                Err(GraphError::Timeout(timeout))
            }
        }
    }

    fn resolve_profile(
        &self,
        profile: Option<&str>,
    ) -> Result<(Option<&GraphOptions>, Duration), GraphError> {
        let Some(name) = profile else {
            return Ok((None, self.default_timeout));
        };
        let profile = self.profiles.get(name).ok_or_else(|| {
            GraphError::Configuration(format!("unknown execution profile {:?}", name))
        })?;
        let graph_options = profile.graph_options.as_ref().ok_or_else(|| {
            GraphError::Configuration(format!(
                "execution profile {:?} does not support graph options",
                name
            ))
        })?;
        Ok((
            Some(graph_options),
            profile.request_timeout.unwrap_or(self.default_timeout),
        ))
    }
}

/// Submit a pending request for sending on the session's execution context.
pub(crate) fn submit(runtime: Arc<dyn DriverRuntime>, pending: Arc<PendingGraphRequest>) {
    tokio::spawn(async move {
        let plan = pending.plan_snapshot();
        let outcome = runtime.send(pending.frame(), plan).await;
        pending.complete(outcome);
    });
}

fn encode_parameters(parameters: &Value) -> Result<String, GraphError> {
    if !parameters.is_object() {
        return Err(GraphError::Configuration(
            "graph parameters must be a JSON object; unnamed parameters are not allowed".into(),
        ));
    }
    serde_json::to_string(parameters)
        .map_err(|e| GraphError::Decode(format!("failed to encode graph parameters: {}", e)))
}
