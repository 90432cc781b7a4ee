//! Graph statements and the targeted-statement adapter.

use std::ops::Deref;
use std::sync::Arc;

use crate::graph::options::GraphOptions;

/// What the routing layer is allowed to read from a request.
///
/// The layer never mutates a statement; targeting decoration is additive
/// (see [`TargetedStatement`]).
pub trait Statement: Send + Sync {
    fn query_string(&self) -> &str;

    /// Keyspace/context hint carried by the statement, if any.
    fn keyspace(&self) -> Option<&str> {
        None
    }

    /// Preferred target node address, if any. Policies treat an address
    /// that does not resolve to a live node as "no preference".
    fn target_host(&self) -> Option<&str> {
        None
    }
}

impl<S: Statement + ?Sized> Statement for &S {
    fn query_string(&self) -> &str {
        (**self).query_string()
    }

    fn keyspace(&self) -> Option<&str> {
        (**self).keyspace()
    }

    fn target_host(&self) -> Option<&str> {
        (**self).target_host()
    }
}

impl<S: Statement + ?Sized> Statement for Arc<S> {
    fn query_string(&self) -> &str {
        (**self).query_string()
    }

    fn keyspace(&self) -> Option<&str> {
        (**self).keyspace()
    }

    fn target_host(&self) -> Option<&str> {
        (**self).target_host()
    }
}

/// A graph statement: a query string plus per-statement [`GraphOptions`]
/// overriding the session defaults.
#[derive(Debug, Clone, Default)]
pub struct SimpleGraphStatement {
    query: String,
    /// Options for this statement. Anything set here overrides the session
    /// and profile defaults.
    pub options: GraphOptions,
    keyspace: Option<String>,
}

impl SimpleGraphStatement {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            options: GraphOptions::new(),
            keyspace: None,
        }
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    pub fn with_options(mut self, options: GraphOptions) -> Self {
        self.options = options;
        self
    }
}

impl Statement for SimpleGraphStatement {
    fn query_string(&self) -> &str {
        &self.query
    }

    fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }
}

impl From<&str> for SimpleGraphStatement {
    fn from(query: &str) -> Self {
        Self::new(query)
    }
}

impl From<String> for SimpleGraphStatement {
    fn from(query: String) -> Self {
        Self::new(query)
    }
}

/// Attaches a preferred target address to any statement without touching
/// the statement itself.
///
/// The wrapper forwards the whole [`Statement`] surface to the inner value
/// and overrides only `target_host`, so it behaves as the original for
/// every other consumer; `Deref` exposes the inner statement's own API.
#[derive(Debug, Clone)]
pub struct TargetedStatement<S> {
    inner: S,
    target_host: String,
}

impl<S: Statement> TargetedStatement<S> {
    pub fn attach(inner: S, target_host: impl Into<String>) -> Self {
        Self {
            inner,
            target_host: target_host.into(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Statement> Statement for TargetedStatement<S> {
    fn query_string(&self) -> &str {
        self.inner.query_string()
    }

    fn keyspace(&self) -> Option<&str> {
        self.inner.keyspace()
    }

    fn target_host(&self) -> Option<&str> {
        Some(&self.target_host)
    }
}

impl<S> Deref for TargetedStatement<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.inner
    }
}
