use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// Basic type aliases for clarity
pub type Label = String;
pub type ElementId = String;

/// Which half of the graph a menu, key or filter belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl ElementKind {
    pub const ALL: [ElementKind; 2] = [ElementKind::Vertex, ElementKind::Edge];
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => f.write_str("vertex"),
            ElementKind::Edge => f.write_str("edge"),
        }
    }
}

/// A property key as reported by the data service, with the labels that declare it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyKey {
    pub name: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub numerical: bool,
}

impl PropertyKey {
    pub fn new(name: impl Into<String>, labels: &[&str], numerical: bool) -> Self {
        Self {
            name: name.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            numerical,
        }
    }

    // Menu caption in the "<A, B>.name" form
    pub fn caption(&self) -> String {
        format!("<{}>.{}", self.labels.join(", "), self.name)
    }
}

/// Keys document returned for one database.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySet {
    #[serde(default)]
    pub vertex_keys: Vec<PropertyKey>,
    #[serde(default)]
    pub edge_keys: Vec<PropertyKey>,
    #[serde(default)]
    pub vertex_labels: Vec<Label>,
    #[serde(default)]
    pub edge_labels: Vec<Label>,
}

impl KeySet {
    pub fn new(vertex_keys: Vec<PropertyKey>, edge_keys: Vec<PropertyKey>) -> Self {
        Self { vertex_keys, edge_keys, vertex_labels: Vec::new(), edge_labels: Vec::new() }
    }

    pub fn keys(&self, kind: ElementKind) -> &[PropertyKey] {
        match kind {
            ElementKind::Vertex => &self.vertex_keys,
            ElementKind::Edge => &self.edge_keys,
        }
    }

    /// Filterable labels: the explicit list first, then any label a key declares that the
    /// explicit list is missing, in first-seen order.
    pub fn labels(&self, kind: ElementKind) -> Vec<Label> {
        let explicit = match kind {
            ElementKind::Vertex => &self.vertex_labels,
            ElementKind::Edge => &self.edge_labels,
        };
        let mut out: Vec<Label> = Vec::with_capacity(explicit.len());
        let declared = self.keys(kind).iter().flat_map(|k| k.labels.iter());
        for label in explicit.iter().chain(declared) {
            if !out.contains(label) {
                out.push(label.clone());
            }
        }
        out
    }
}

/// A vertex or edge of a graph payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ElementRepr")]
pub struct Element {
    pub id: ElementId,
    pub label: Label,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ElementId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementId>,
    pub properties: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct ElementFields {
    #[serde(deserialize_with = "id_from_any")]
    id: ElementId,
    #[serde(default)]
    label: Label,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    source: Option<ElementId>,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    target: Option<ElementId>,
    #[serde(default)]
    properties: BTreeMap<String, Value>,
}

// The grouping server wraps every element as {"data": {...}}; fixtures usually don't.
#[derive(Deserialize)]
#[serde(untagged)]
enum ElementRepr {
    Wrapped { data: ElementFields },
    Bare(ElementFields),
}

impl From<ElementRepr> for Element {
    fn from(repr: ElementRepr) -> Self {
        let f = match repr {
            ElementRepr::Wrapped { data } => data,
            ElementRepr::Bare(fields) => fields,
        };
        Element { id: f.id, label: f.label, source: f.source, target: f.target, properties: f.properties }
    }
}

fn id_from_any<'de, D: serde::Deserializer<'de>>(d: D) -> Result<ElementId, D::Error> {
    Ok(value_text(&Value::deserialize(d)?))
}

fn opt_id_from_any<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<ElementId>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Ok(Some(value_text(&v))),
    }
}

// Strings render without quotes, everything else as JSON
pub fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Element {
    pub fn vertex(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into(), source: None, target: None, properties: BTreeMap::new() }
    }

    pub fn edge(id: impl Into<String>, label: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            source: Some(source.into()),
            target: Some(target.into()),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property_text(&self, key: &str) -> Option<String> {
        self.properties.get(key).map(value_text)
    }

    // The aggregated group size, if the element is the result of a grouping
    pub fn count(&self) -> Option<f64> {
        match self.properties.get("count")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source.as_deref() == Some(node_id) || self.target.as_deref() == Some(node_id)
    }
}

/// Vertices and edges of one fetched graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<Element>,
    #[serde(default)]
    pub edges: Vec<Element>,
}

impl GraphPayload {
    pub fn new(nodes: Vec<Element>, edges: Vec<Element>) -> Self {
        Self { nodes, edges }
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }
}
