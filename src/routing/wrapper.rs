//! Pass-through policy wrapper.

use std::sync::Arc;

use crate::cluster::{ClusterMetadata, Node, NodeDistance};
use crate::graph::statement::Statement;
use crate::routing::{LoadBalancingPolicy, QueryPlan};

/// Forwards every policy operation to a wrapped child policy.
///
/// Exists so behavior can be layered onto any base policy without
/// reimplementing topology tracking; see
/// [`HostTargetingPolicy`](crate::routing::HostTargetingPolicy).
pub struct WrapperPolicy {
    child: Arc<dyn LoadBalancingPolicy>,
}

impl WrapperPolicy {
    pub fn new(child: Arc<dyn LoadBalancingPolicy>) -> Self {
        Self { child }
    }

    pub fn child(&self) -> &Arc<dyn LoadBalancingPolicy> {
        &self.child
    }
}

impl LoadBalancingPolicy for WrapperPolicy {
    fn distance(&self, node: &Node) -> NodeDistance {
        self.child.distance(node)
    }

    fn populate(&self, metadata: &Arc<ClusterMetadata>, nodes: &[Arc<Node>]) {
        self.child.populate(metadata, nodes);
    }

    fn on_up(&self, node: &Arc<Node>) {
        self.child.on_up(node);
    }

    fn on_down(&self, node: &Arc<Node>) {
        self.child.on_down(node);
    }

    fn on_add(&self, node: &Arc<Node>) {
        self.child.on_add(node);
    }

    fn on_remove(&self, node: &Arc<Node>) {
        self.child.on_remove(node);
    }

    fn make_query_plan(
        &self,
        working_keyspace: Option<&str>,
        statement: Option<&dyn Statement>,
    ) -> QueryPlan {
        self.child.make_query_plan(working_keyspace, statement)
    }

    fn supports_targeting(&self) -> bool {
        self.child.supports_targeting()
    }
}
