use log::info;

use crate::graph_utils::graph::{ElementKind, KeySet, Label, PropertyKey};

/// Property keys and filterable labels known for the selected database, per element kind.
///
/// Replaced wholesale on every key load; there is no incremental merge.
#[derive(Clone, Debug, Default)]
pub struct KeyRegistry {
    vertex: KindKeys,
    edge: KindKeys,
}

#[derive(Clone, Debug, Default)]
struct KindKeys {
    keys: Vec<PropertyKey>,
    labels: Vec<Label>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_keys(&mut self, vertex_keys: Vec<PropertyKey>, edge_keys: Vec<PropertyKey>) {
        self.load_key_set(KeySet::new(vertex_keys, edge_keys));
    }

    pub fn load_key_set(&mut self, set: KeySet) {
        let vertex_labels = set.labels(ElementKind::Vertex);
        let edge_labels = set.labels(ElementKind::Edge);
        self.vertex = KindKeys { keys: set.vertex_keys, labels: vertex_labels };
        self.edge = KindKeys { keys: set.edge_keys, labels: edge_labels };
        info!(
            "key registry loaded: {} vertex keys / {} labels, {} edge keys / {} labels",
            self.vertex.keys.len(),
            self.vertex.labels.len(),
            self.edge.keys.len(),
            self.edge.labels.len()
        );
    }

    fn kind(&self, kind: ElementKind) -> &KindKeys {
        match kind {
            ElementKind::Vertex => &self.vertex,
            ElementKind::Edge => &self.edge,
        }
    }

    pub fn keys(&self, kind: ElementKind) -> &[PropertyKey] {
        &self.kind(kind).keys
    }

    pub fn labels(&self, kind: ElementKind) -> &[Label] {
        &self.kind(kind).labels
    }

    pub fn key(&self, kind: ElementKind, name: &str) -> Option<&PropertyKey> {
        self.keys(kind).iter().find(|k| k.name == name)
    }

    // Labels that declare `key` for this kind
    pub fn labels_declaring(&self, kind: ElementKind, key: &str) -> &[Label] {
        self.key(kind, key).map(|k| k.labels.as_slice()).unwrap_or(&[])
    }
}
