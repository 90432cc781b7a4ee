//! Graph query options with layered override semantics.
//!
//! Options live in three tiers: session defaults, execution-profile
//! defaults, and per-statement overrides. A tier only carries the keys
//! explicitly set on it; resolution merges narrower tiers over broader ones.
//! Values are normalized to their UTF-8 wire encoding at set time, since the
//! resolved map is attached verbatim to the request's custom payload.

use std::borrow::Cow;
use std::collections::HashMap;

use bytes::Bytes;

/// Wire-keyed option map, as attached to a request's custom payload.
pub type OptionsMap = HashMap<&'static str, Bytes>;

pub(crate) const GRAPH_NAME_KEY: &str = "graph-name";
pub(crate) const GRAPH_SOURCE_KEY: &str = "graph-source";
pub(crate) const GRAPH_LANGUAGE_KEY: &str = "graph-language";
pub(crate) const GRAPH_ALIAS_KEY: &str = "graph-alias";

/// The analytics (Spark) traversal source. Requests carrying it are routed
/// through analytics master discovery.
const SOURCE_ANALYTICS: &[u8] = b"a";
const SOURCE_GRAPH: &[u8] = b"g";
const SOURCE_DEFAULT: &[u8] = b"default";

/// Generates the get/set/unset/builder accessors for one recognized option.
/// The option set is closed and known ahead of time, so accessors are
/// expanded from this table rather than synthesized at runtime.
macro_rules! graph_option_accessors {
    ($(#[$doc:meta])* $getter:ident, $setter:ident, $unsetter:ident, $with:ident, $key:expr) => {
        $(#[$doc])*
        pub fn $getter(&self) -> Option<&Bytes> {
            self.options.get($key)
        }

        /// Set the option. `None` or an empty value removes the key instead
        /// of storing it.
        pub fn $setter<V: Into<Bytes>>(&mut self, value: Option<V>) {
            self.set_raw($key, value);
        }

        /// Explicitly unset the option on this object.
        pub fn $unsetter(&mut self) {
            self.options.remove($key);
        }

        /// Builder-style variant of the setter.
        pub fn $with<V: Into<Bytes>>(mut self, value: V) -> Self {
            self.set_raw($key, Some(value));
            self
        }
    };
}

/// Options for graph query execution.
///
/// An instance only carries the keys explicitly set on it. Merging follows
/// override precedence: per-statement options win over execution-profile
/// defaults, which win over session defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphOptions {
    options: OptionsMap,
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    graph_option_accessors!(
        /// Name of the targeted graph.
        graph_name, set_graph_name, unset_graph_name, with_graph_name, GRAPH_NAME_KEY
    );

    graph_option_accessors!(
        /// The graph traversal source, configured on the server side.
        graph_source, set_graph_source, unset_graph_source, with_graph_source, GRAPH_SOURCE_KEY
    );

    graph_option_accessors!(
        /// The language used in the queries (default "gremlin-groovy").
        graph_language, set_graph_language, unset_graph_language, with_graph_language, GRAPH_LANGUAGE_KEY
    );

    graph_option_accessors!(
        /// Name of the graph in the query (default "g").
        graph_alias, set_graph_alias, unset_graph_alias, with_graph_alias, GRAPH_ALIAS_KEY
    );

    /// Route queries to the analytics (Spark) traversal source.
    pub fn set_source_analytics(&mut self) {
        self.set_graph_source(Some(SOURCE_ANALYTICS));
    }

    /// Route queries to the in-process graph traversal source.
    pub fn set_source_graph(&mut self) {
        self.set_graph_source(Some(SOURCE_GRAPH));
    }

    /// Route queries to the server-configured default traversal source.
    pub fn set_source_default(&mut self) {
        self.set_graph_source(Some(SOURCE_DEFAULT));
    }

    /// Whether the traversal source set on this object is analytics-backed.
    pub fn is_analytics_source(&self) -> bool {
        self.options
            .get(GRAPH_SOURCE_KEY)
            .is_some_and(|v| v.as_ref() == SOURCE_ANALYTICS)
    }

    /// Copy the keys explicitly set on `other` into this object. Keys never
    /// set on `other` are left untouched, so an unset key is not propagated.
    pub fn update(&mut self, other: &GraphOptions) {
        self.options
            .extend(other.options.iter().map(|(k, v)| (*k, v.clone())));
    }

    /// The effective map for `base` overridden by this object's options.
    ///
    /// When nothing is set on the receiver, this returns `base`'s own map by
    /// reference instead of copying it; callers must treat the result as
    /// read-only since it may alias `base`.
    pub fn effective_map<'a>(&'a self, base: &'a GraphOptions) -> Cow<'a, OptionsMap> {
        if self.options.is_empty() {
            Cow::Borrowed(&base.options)
        } else {
            let mut merged = base.options.clone();
            merged.extend(self.options.iter().map(|(k, v)| (*k, v.clone())));
            Cow::Owned(merged)
        }
    }

    /// Number of keys explicitly set on this object.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub(crate) fn as_map(&self) -> &OptionsMap {
        &self.options
    }

    fn set_raw(&mut self, key: &'static str, value: Option<impl Into<Bytes>>) {
        match value.map(Into::into) {
            Some(bytes) if !bytes.is_empty() => {
                self.options.insert(key, bytes);
            }
            _ => {
                self.options.remove(key);
            }
        }
    }
}

/// Resolve the effective per-request options across all three tiers:
/// statement overrides win over profile defaults, which win over session
/// defaults.
pub fn resolve(
    session: &GraphOptions,
    profile: Option<&GraphOptions>,
    statement: &GraphOptions,
) -> OptionsMap {
    let mut effective = session.as_map().clone();
    if let Some(profile) = profile {
        effective.extend(profile.as_map().iter().map(|(k, v)| (*k, v.clone())));
    }
    effective.extend(statement.as_map().iter().map(|(k, v)| (*k, v.clone())));
    effective
}

/// Whether a resolved payload routes to the analytics traversal source.
pub(crate) fn payload_is_analytics(payload: &OptionsMap) -> bool {
    payload
        .get(GRAPH_SOURCE_KEY)
        .is_some_and(|v| v.as_ref() == SOURCE_ANALYTICS)
}
