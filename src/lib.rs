//! Cassgraph - Graph query extension for Cassandra-compatible clusters
//!
//! This crate layers graph-query support on top of a Cassandra wire-protocol
//! driver runtime through:
//! - Graph options with layered override semantics, resolved into the
//!   custom payload attached to each request
//! - Load-balancing policies, including a host-targeting wrapper that can
//!   pin a specific node ahead of any base policy's ordering
//! - Analytics (Spark) master discovery that retargets a pending request
//!   before it is sent
//! - Graph result materialization (vertices, edges, paths)
//!
//! The wire protocol, connection pooling, and retry execution stay in the
//! wrapped driver; see [`session::DriverRuntime`] for the consumed contract.

pub mod cluster;
pub mod config;
pub mod graph;
pub mod routing;
pub mod session;
