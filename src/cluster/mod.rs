//! Cluster topology view shared with the routing layer.
//!
//! Node membership and liveness are owned by the wrapped driver's topology
//! tracking; this module only holds the address-keyed view the routing
//! policies read. Every lookup takes a snapshot under a short-lived lock so
//! concurrent topology updates never stall plan construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Distance classification a load-balancing policy assigns to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeDistance {
    Local,
    Remote,
    Ignored,
}

/// A cluster node, identified by its network address.
///
/// Routing components hold `Arc<Node>` references for ordering decisions
/// only; the liveness flag is flipped by topology events from the driver.
#[derive(Debug)]
pub struct Node {
    address: String,
    up: AtomicBool,
}

impl Node {
    pub fn new(address: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            address: address.into(),
            up: AtomicBool::new(true),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::Acquire)
    }

    /// Flip the liveness flag. Called from topology-tracking machinery, not
    /// from the routing layer.
    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::Release);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// Address-keyed view of the cluster, updated by topology events.
#[derive(Debug, Default)]
pub struct ClusterMetadata {
    nodes: RwLock<HashMap<String, Arc<Node>>>,
}

impl ClusterMetadata {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Build a metadata view from an initial node list.
    pub fn with_nodes(nodes: impl IntoIterator<Item = Arc<Node>>) -> Arc<Self> {
        let metadata = Self::default();
        {
            let mut map = metadata
                .nodes
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for node in nodes {
                map.insert(node.address().to_string(), node);
            }
        }
        Arc::new(metadata)
    }

    /// Resolve a node by its network address. Returns `None` for addresses
    /// the topology has never seen or has since removed.
    pub fn node_by_address(&self, address: &str) -> Option<Arc<Node>> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }

    /// Snapshot of all known nodes, in no particular order.
    pub fn all_nodes(&self) -> Vec<Arc<Node>> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn add_node(&self, node: Arc<Node>) {
        self.nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(node.address().to_string(), node);
    }

    pub fn remove_node(&self, address: &str) -> Option<Arc<Node>> {
        self.nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(address)
    }
}
