//! Host-targeting load balancing.

use std::iter;
use std::sync::{Arc, PoisonError, RwLock};

use crate::cluster::{ClusterMetadata, Node, NodeDistance};
use crate::graph::statement::Statement;
use crate::routing::{LoadBalancingPolicy, QueryPlan, WrapperPolicy};

/// A policy wrapper that adds the ability to target a specific node first.
///
/// If the statement carries no target address, or the address does not
/// resolve to a live node, the child policy's query plan is used as is.
pub struct HostTargetingPolicy {
    wrapper: WrapperPolicy,
    metadata: RwLock<Option<Arc<ClusterMetadata>>>,
}

impl HostTargetingPolicy {
    pub fn new(child: Arc<dyn LoadBalancingPolicy>) -> Self {
        Self {
            wrapper: WrapperPolicy::new(child),
            metadata: RwLock::new(None),
        }
    }

    fn resolve_target(&self, address: &str) -> Option<Arc<Node>> {
        self.metadata
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|metadata| metadata.node_by_address(address))
    }
}

impl LoadBalancingPolicy for HostTargetingPolicy {
    fn distance(&self, node: &Node) -> NodeDistance {
        self.wrapper.distance(node)
    }

    fn populate(&self, metadata: &Arc<ClusterMetadata>, nodes: &[Arc<Node>]) {
        *self
            .metadata
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(metadata));
        self.wrapper.populate(metadata, nodes);
    }

    fn on_up(&self, node: &Arc<Node>) {
        self.wrapper.on_up(node);
    }

    fn on_down(&self, node: &Arc<Node>) {
        self.wrapper.on_down(node);
    }

    fn on_add(&self, node: &Arc<Node>) {
        self.wrapper.on_add(node);
    }

    fn on_remove(&self, node: &Arc<Node>) {
        self.wrapper.on_remove(node);
    }

    fn make_query_plan(
        &self,
        working_keyspace: Option<&str>,
        statement: Option<&dyn Statement>,
    ) -> QueryPlan {
        let keyspace = statement
            .and_then(|s| s.keyspace())
            .or(working_keyspace);

        let target = statement
            .and_then(|s| s.target_host())
            .and_then(|address| self.resolve_target(address));

        let child_plan = self.wrapper.child().make_query_plan(keyspace, statement);

        match target {
            Some(node) if node.is_up() => {
                let yielded = Arc::clone(&node);
                Box::new(iter::once(node).chain(
                    child_plan.filter(move |n| n.address() != yielded.address()),
                ))
            }
            _ => child_plan,
        }
    }

    fn supports_targeting(&self) -> bool {
        true
    }
}
