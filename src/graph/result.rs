//! Graph result materialization.
//!
//! Graph queries come back as plain rows whose single column is a JSON
//! document with the payload under a top-level `result` member. Row
//! factories turn raw rows into [`GraphResult`] values; element conversions
//! (`as_vertex`, `as_edge`, `as_path`) materialize the common shapes.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::session::errors::GraphError;
use crate::session::runtime::Row;

/// Row factory signature: transforms raw driver rows into graph results.
pub type RowFactory = fn(&[Row]) -> Result<Vec<GraphResult>, GraphError>;

/// A deserialized graph result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GraphResult {
    value: Value,
}

impl GraphResult {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Member access for object-shaped results.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.value.as_i64()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    pub fn as_vertex(&self) -> Result<Vertex, GraphError> {
        let element = self.element_parts("vertex")?;
        Ok(Vertex {
            id: element.id,
            label: element.label,
            properties: unwrap_vertex_properties(element.properties)?,
        })
    }

    pub fn as_edge(&self) -> Result<Edge, GraphError> {
        let element = self.element_parts("edge")?;
        Ok(Edge {
            id: element.id,
            label: element.label,
            properties: element.properties,
            in_v: self.required("inV")?.clone(),
            in_v_label: self.required_str("inVLabel")?,
            out_v: self.required("outV")?.clone(),
            out_v_label: self.required_str("outVLabel")?,
        })
    }

    pub fn as_path(&self) -> Result<Path, GraphError> {
        let labels = self
            .required("labels")?
            .as_array()
            .cloned()
            .ok_or_else(|| decode_error("path labels are not a list"))?;
        let objects = self
            .required("objects")?
            .as_array()
            .map(|objects| objects.iter().cloned().map(GraphResult::new).collect())
            .ok_or_else(|| decode_error("path objects are not a list"))?;
        Ok(Path { labels, objects })
    }

    fn element_parts(&self, expected_type: &str) -> Result<ElementParts, GraphError> {
        let element_type = self.required_str("type")?;
        if element_type != expected_type {
            return Err(decode_error(format!(
                "expected a {} element, found {:?}",
                expected_type, element_type
            )));
        }
        let properties = match self.get("properties") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => HashMap::new(),
        };
        Ok(ElementParts {
            id: self.required("id")?.clone(),
            label: self.required_str("label")?,
            properties,
        })
    }

    fn required(&self, key: &str) -> Result<&Value, GraphError> {
        self.get(key)
            .ok_or_else(|| decode_error(format!("result has no member {:?}", key)))
    }

    fn required_str(&self, key: &str) -> Result<String, GraphError> {
        self.required(key)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| decode_error(format!("member {:?} is not a string", key)))
    }
}

impl fmt::Display for GraphResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

struct ElementParts {
    id: Value,
    label: String,
    properties: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vertex {
    pub id: Value,
    pub label: String,
    pub properties: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: Value,
    pub label: String,
    pub properties: HashMap<String, Value>,
    pub in_v: Value,
    pub in_v_label: String,
    pub out_v: Value,
    pub out_v_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    pub labels: Vec<Value>,
    pub objects: Vec<GraphResult>,
}

/// Vertex properties arrive as single-item lists of `{"value": v}` maps;
/// keep only the value.
fn unwrap_vertex_properties(
    properties: HashMap<String, Value>,
) -> Result<HashMap<String, Value>, GraphError> {
    properties
        .into_iter()
        .map(|(name, entry)| {
            let value = entry
                .as_array()
                .and_then(|list| list.first())
                .and_then(|item| item.get("value"))
                .cloned()
                .ok_or_else(|| {
                    decode_error(format!("vertex property {:?} has unexpected shape", name))
                })?;
            Ok((name, value))
        })
        .collect()
}

/// Returns the raw JSON string value of each graph result row.
pub fn single_object_row_factory(rows: &[Row]) -> Result<Vec<GraphResult>, GraphError> {
    rows.iter()
        .map(|row| Ok(GraphResult::new(first_column(row)?.clone())))
        .collect()
}

/// Deserializes each row's JSON document and unpacks the top-level `result`
/// member. This is the session default.
pub fn graph_object_row_factory(rows: &[Row]) -> Result<Vec<GraphResult>, GraphError> {
    rows.iter()
        .map(|row| {
            let column = first_column(row)?;
            let document: Value = match column {
                Value::String(raw) => serde_json::from_str(raw)
                    .map_err(|e| decode_error(format!("result row is not valid JSON: {}", e)))?,
                other => other.clone(),
            };
            let result = document
                .get("result")
                .cloned()
                .ok_or_else(|| decode_error("result row has no top-level 'result' member"))?;
            Ok(GraphResult::new(result))
        })
        .collect()
}

fn first_column(row: &Row) -> Result<&Value, GraphError> {
    row.first()
        .ok_or_else(|| decode_error("result row has no columns"))
}

fn decode_error(message: impl Into<String>) -> GraphError {
    GraphError::Decode(message.into())
}

/// The materialized results of one graph query.
#[derive(Debug, Clone, Default)]
pub struct GraphResultSet {
    results: Vec<GraphResult>,
}

impl GraphResultSet {
    pub fn new(results: Vec<GraphResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn first(&self) -> Option<&GraphResult> {
        self.results.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GraphResult> {
        self.results.iter()
    }
}

impl IntoIterator for GraphResultSet {
    type Item = GraphResult;
    type IntoIter = std::vec::IntoIter<GraphResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a GraphResultSet {
    type Item = &'a GraphResult;
    type IntoIter = std::slice::Iter<'a, GraphResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
