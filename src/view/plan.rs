use std::collections::HashSet;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::graph_utils::graph::{Element, ElementId, GraphPayload, value_text};
use crate::selection::session::LABEL_KEY;

/// Property value the grouping server uses for "no value in this group".
pub const NULL_GROUP: &str = "NULL";

const DEFAULT_NODE_DIAMETER: f64 = 60.0;
const DEFAULT_FONT_SIZE: f64 = 10.0;
const DEFAULT_EDGE_WIDTH: f64 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Force,
    RadialRandom,
}

/// Display toggles that shape the plan but not the selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub show_edge_labels: bool,
    pub show_count_as_size: bool,
    pub hide_null_groups: bool,
    pub hide_disconnected: bool,
}

/// Which property names the captions and null-group check use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSelection {
    pub use_default_label: bool,
    pub vertex_label_key: String,
    pub edge_label_key: String,
    pub vertex_keys: Vec<String>,
    pub edge_keys: Vec<String>,
}

impl Default for LabelSelection {
    fn default() -> Self {
        Self {
            use_default_label: true,
            vertex_label_key: LABEL_KEY.to_string(),
            edge_label_key: LABEL_KEY.to_string(),
            vertex_keys: Vec::new(),
            edge_keys: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
    pub id: ElementId,
    pub label: String,
    pub caption: String,
    pub diameter: f64,
    pub font_size: f64,
    pub tooltip: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderEdge {
    pub id: ElementId,
    pub source: Option<ElementId>,
    pub target: Option<ElementId>,
    pub caption: String,
    pub width: f64,
    pub font_size: f64,
    pub tooltip: Vec<(String, String)>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub vertex_count: usize,
    pub edge_count: usize,
}

/// Everything the renderer needs for one draw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub layout: LayoutMode,
    pub stats: GraphStats,
    pub max_vertex_count: f64,
    pub max_edge_count: f64,
}

impl RenderPlan {
    /// The node itself, its incident edges and the nodes at their other ends.
    pub fn neighborhood(&self, node_id: &str) -> HashSet<ElementId> {
        let mut out = HashSet::new();
        if !self.nodes.iter().any(|n| n.id == node_id) {
            return out;
        }
        out.insert(node_id.to_string());
        for e in &self.edges {
            let (s, t) = (e.source.as_deref(), e.target.as_deref());
            if s == Some(node_id) || t == Some(node_id) {
                out.insert(e.id.clone());
                out.extend(s.into_iter().chain(t).map(str::to_string));
            }
        }
        out
    }
}

fn max_count(elements: &[Element]) -> f64 {
    elements.iter().filter_map(Element::count).fold(0.0, f64::max)
}

// Caption text: the element label, or the value of the chosen key, plus " (count)"
pub fn caption(element: &Element, key: &str, use_default_label: bool) -> String {
    let mut text = if !use_default_label && key != LABEL_KEY {
        element.property_text(key).unwrap_or_default()
    } else {
        element.label.clone()
    };
    if let Some(count) = element.properties.get("count") {
        text.push_str(&format!(" ({})", value_text(count)));
    }
    text
}

fn tooltip(element: &Element) -> Vec<(String, String)> {
    let mut lines = vec![("id".to_string(), element.id.clone()), ("label".to_string(), element.label.clone())];
    if let Some(s) = &element.source {
        lines.push(("source".to_string(), s.clone()));
    }
    if let Some(t) = &element.target {
        lines.push(("target".to_string(), t.clone()));
    }
    lines.extend(element.properties.iter().map(|(k, v)| (k.clone(), value_text(v))));
    lines
}

fn has_null_group(element: &Element, keys: &[String]) -> bool {
    keys.iter().any(|k| element.property_text(k).as_deref() == Some(NULL_GROUP))
}

// Ratio of this element's count to the largest one, when sizing by count applies
fn count_ratio(element: &Element, max: f64, options: &DisplayOptions) -> Option<f64> {
    if !options.show_count_as_size || max <= 0.0 {
        return None;
    }
    element.count().map(|c| c / max)
}

fn font_size(ratio: Option<f64>) -> f64 {
    ratio.map(|r| (r * 10_000.0 / PI).sqrt().max(2.0)).unwrap_or(DEFAULT_FONT_SIZE)
}

pub fn prepare(payload: &GraphPayload, options: &DisplayOptions, labels: &LabelSelection, layout: LayoutMode) -> RenderPlan {
    let max_vertex_count = max_count(&payload.nodes);
    let max_edge_count = max_count(&payload.edges);

    let mut nodes: Vec<&Element> = payload.nodes.iter().collect();
    let mut edges: Vec<&Element> = payload.edges.iter().collect();
    if options.hide_null_groups {
        nodes.retain(|n| !has_null_group(n, &labels.vertex_keys));
        edges.retain(|e| !has_null_group(e, &labels.edge_keys));
    }

    // an edge cannot outlive either endpoint
    let present: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    edges.retain(|e| [&e.source, &e.target].iter().all(|end| end.as_deref().is_none_or(|id| present.contains(id))));

    if options.hide_disconnected {
        nodes.retain(|n| edges.iter().any(|e| e.touches(&n.id)));
    }

    let nodes = nodes
        .into_iter()
        .map(|n| {
            let ratio = count_ratio(n, max_vertex_count, options);
            RenderNode {
                id: n.id.clone(),
                label: n.label.clone(),
                caption: caption(n, &labels.vertex_label_key, labels.use_default_label),
                diameter: ratio.map(|r| (r * 1_000_000.0 / PI).sqrt()).unwrap_or(DEFAULT_NODE_DIAMETER),
                font_size: font_size(ratio),
                tooltip: tooltip(n),
            }
        })
        .collect();

    let edges = edges
        .into_iter()
        .map(|e| {
            let ratio = count_ratio(e, max_edge_count, options);
            RenderEdge {
                id: e.id.clone(),
                source: e.source.clone(),
                target: e.target.clone(),
                caption: if options.show_edge_labels {
                    caption(e, &labels.edge_label_key, labels.use_default_label)
                } else {
                    String::new()
                },
                width: ratio.map(|r| (r * 1000.0).sqrt()).unwrap_or(DEFAULT_EDGE_WIDTH),
                font_size: font_size(ratio),
                tooltip: tooltip(e),
            }
        })
        .collect();

    RenderPlan {
        nodes,
        edges,
        layout,
        stats: GraphStats { vertex_count: payload.node_count(), edge_count: payload.edge_count() },
        max_vertex_count,
        max_edge_count,
    }
}
