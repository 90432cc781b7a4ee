//! Request routing: the load-balancing policy contract and its variants.

pub mod analytics;
mod round_robin;
mod targeting;
mod wrapper;

pub use round_robin::RoundRobinPolicy;
pub use targeting::HostTargetingPolicy;
pub use wrapper::WrapperPolicy;

use std::sync::Arc;

use crate::cluster::{ClusterMetadata, Node, NodeDistance};
use crate::graph::statement::Statement;

/// Ordered candidate nodes for one request, in preference order.
///
/// Plans are finite, lazily produced, and single-use; a second attempt
/// sequence requires recomputation, not a restart.
pub type QueryPlan = Box<dyn Iterator<Item = Arc<Node>> + Send>;

/// The load-balancing policy contract.
///
/// `populate` and the `on_*` hooks are driven by the wrapped driver's
/// topology tracking; `make_query_plan` is called once per request on the
/// dispatch path. A plan must never contain duplicates nor a node known to
/// be down at construction time.
pub trait LoadBalancingPolicy: Send + Sync {
    /// Distance classification for a node, controlling pooling behavior.
    fn distance(&self, node: &Node) -> NodeDistance;

    /// Called once at session setup with the cluster view and the initial
    /// node list.
    fn populate(&self, metadata: &Arc<ClusterMetadata>, nodes: &[Arc<Node>]);

    fn on_up(&self, node: &Arc<Node>);

    fn on_down(&self, node: &Arc<Node>);

    fn on_add(&self, node: &Arc<Node>);

    fn on_remove(&self, node: &Arc<Node>);

    /// Produce the ordered candidate sequence for one request. A statement
    /// keyspace hint wins over `working_keyspace`.
    fn make_query_plan(
        &self,
        working_keyspace: Option<&str>,
        statement: Option<&dyn Statement>,
    ) -> QueryPlan;

    /// Whether this policy honors a statement's preferred target address.
    /// Analytics master redirection is only attempted when it does.
    fn supports_targeting(&self) -> bool {
        false
    }
}
