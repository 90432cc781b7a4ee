//! Round-robin load balancing over the live nodes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::cluster::{ClusterMetadata, Node, NodeDistance};
use crate::graph::statement::Statement;
use crate::routing::{LoadBalancingPolicy, QueryPlan};

/// Rotates the plan's starting node across successive requests so load
/// spreads evenly over the live nodes.
#[derive(Debug, Default)]
pub struct RoundRobinPolicy {
    live: RwLock<Vec<Arc<Node>>>,
    position: AtomicUsize,
}

impl RoundRobinPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_live(&self, node: &Arc<Node>) {
        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
        if !live.iter().any(|n| n.address() == node.address()) {
            live.push(Arc::clone(node));
        }
    }

    fn drop_live(&self, node: &Arc<Node>) {
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|n| n.address() != node.address());
    }
}

impl LoadBalancingPolicy for RoundRobinPolicy {
    fn distance(&self, _node: &Node) -> NodeDistance {
        NodeDistance::Local
    }

    fn populate(&self, _metadata: &Arc<ClusterMetadata>, nodes: &[Arc<Node>]) {
        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
        *live = nodes.iter().filter(|n| n.is_up()).cloned().collect();
    }

    fn on_up(&self, node: &Arc<Node>) {
        self.add_live(node);
    }

    fn on_down(&self, node: &Arc<Node>) {
        self.drop_live(node);
    }

    fn on_add(&self, node: &Arc<Node>) {
        self.add_live(node);
    }

    fn on_remove(&self, node: &Arc<Node>) {
        self.drop_live(node);
    }

    fn make_query_plan(
        &self,
        _working_keyspace: Option<&str>,
        _statement: Option<&dyn Statement>,
    ) -> QueryPlan {
        // Snapshot under a short-lived lock; the plan itself holds no lock.
        let snapshot: Vec<Arc<Node>> = self
            .live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|n| n.is_up())
            .cloned()
            .collect();

        if snapshot.is_empty() {
            return Box::new(std::iter::empty());
        }

        let len = snapshot.len();
        let start = self.position.fetch_add(1, Ordering::Relaxed) % len;
        Box::new((0..len).map(move |i| Arc::clone(&snapshot[(start + i) % len])))
    }
}
