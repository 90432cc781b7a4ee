//! Analytics master redirection.
//!
//! Analytics (Spark-backed) graph queries should land on the current
//! analytics master. The master's location is discovered with a side query
//! on the same session, and the pending request's routing plan is rewritten
//! before it is sent. Discovery failures degrade to default routing; they
//! are a routing-precision concern, never a request failure.

use std::sync::Arc;

use serde_json::Value;

use crate::cluster::Node;
use crate::graph::statement::{SimpleGraphStatement, Statement, TargetedStatement};
use crate::routing::LoadBalancingPolicy;
use crate::session::pending::PendingGraphRequest;
use crate::session::runtime::{DriverRuntime, Row};
use crate::session::submit;

/// Fixed server-side protocol contract for locating the analytics master.
/// The response is a single-column row shaped `{location: "<address>[:<port>]"}`.
pub(crate) const MASTER_LOCATION_QUERY: &str = "CALL DseClientTool.getAnalyticsGraphServer()";

/// Redirection progress for one primary request.
#[derive(Debug)]
enum RedirectState {
    Init,
    MasterQueryPending,
    MasterResolved(String),
    MasterFailed,
    Dispatched,
}

/// Drives the two-phase discovery-then-dispatch flow for one analytics
/// request.
pub(crate) struct AnalyticsMasterRouter {
    runtime: Arc<dyn DriverRuntime>,
    policy: Arc<dyn LoadBalancingPolicy>,
}

impl AnalyticsMasterRouter {
    pub(crate) fn new(
        runtime: Arc<dyn DriverRuntime>,
        policy: Arc<dyn LoadBalancingPolicy>,
    ) -> Self {
        Self { runtime, policy }
    }

    /// Entry point: ensure `pending` is dispatched, targeting the analytics
    /// master if it can be discovered within the request's deadline budget.
    /// Runs on the session's execution context.
    pub(crate) fn spawn(self, pending: Arc<PendingGraphRequest>, statement: SimpleGraphStatement) {
        tokio::spawn(async move {
            self.run(pending, statement).await;
        });
    }

    async fn run(&self, pending: Arc<PendingGraphRequest>, statement: SimpleGraphStatement) {
        let mut state = RedirectState::Init;
        loop {
            state = match state {
                RedirectState::Init => RedirectState::MasterQueryPending,
                RedirectState::MasterQueryPending => self.discover_master(&pending).await,
                RedirectState::MasterResolved(address) => {
                    // The primary request may have timed out while the
                    // discovery was in flight; its plan must not change
                    // after that.
                    if pending.is_completed() {
                        log::debug!(
                            "request {}: completed before master discovery, dropping redirect",
                            pending.id()
                        );
                        return;
                    }
                    self.retarget(&pending, &statement, &address);
                    RedirectState::Dispatched
                }
                RedirectState::MasterFailed => RedirectState::Dispatched,
                RedirectState::Dispatched => {
                    if pending.is_completed() {
                        return;
                    }
                    submit(Arc::clone(&self.runtime), pending);
                    return;
                }
            };
        }
    }

    async fn discover_master(&self, pending: &PendingGraphRequest) -> RedirectState {
        let budget = pending.remaining();
        let outcome =
            tokio::time::timeout(budget, self.runtime.execute_internal(MASTER_LOCATION_QUERY))
                .await;

        match outcome {
            Ok(Ok(rows)) => match parse_master_location(&rows) {
                Some(location) => {
                    RedirectState::MasterResolved(strip_port(&location).to_string())
                }
                None => {
                    log::warn!(
                        "request {}: analytics master response had no usable location",
                        pending.id()
                    );
                    RedirectState::MasterFailed
                }
            },
            Ok(Err(err)) => {
                log::debug!(
                    "request {}: analytics master discovery failed: {}",
                    pending.id(),
                    err
                );
                RedirectState::MasterFailed
            }
            Err(_elapsed) => {
                log::debug!(
                    "request {}: analytics master discovery timed out",
                    pending.id()
                );
                RedirectState::MasterFailed
            }
        }
    }

    fn retarget(
        &self,
        pending: &PendingGraphRequest,
        statement: &SimpleGraphStatement,
        address: &str,
    ) {
        log::debug!(
            "request {}: analytics master resolved to {}, retargeting",
            pending.id(),
            address
        );
        let targeted = TargetedStatement::attach(statement.clone(), address);
        let plan: Vec<Arc<Node>> = self
            .policy
            .make_query_plan(None, Some(&targeted as &dyn Statement))
            .collect();
        pending.replace_plan(plan);
    }
}

/// Extract the `location` member from the discovery response rows.
fn parse_master_location(rows: &[Row]) -> Option<String> {
    let column = rows.first()?.first()?;
    let document: Value = match column {
        Value::Object(_) => column.clone(),
        Value::String(raw) => serde_json::from_str(raw).ok()?,
        _ => return None,
    };
    document
        .get("location")?
        .as_str()
        .map(str::to_owned)
}

/// Strip a trailing `:port` segment from a master location. The port is
/// recognized only when the last colon is at a non-leading position; bare
/// IPv6 literals are not handled.
fn strip_port(location: &str) -> &str {
    match location.rfind(':') {
        Some(idx) if idx > 0 => &location[..idx],
        _ => location,
    }
}
