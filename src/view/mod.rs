//! Turning fetched graphs into renderer input.

use std::collections::HashSet;

use log::debug;

use crate::graph_utils::graph::{ElementId, ElementKind, GraphPayload};
use crate::selection::session::{LABEL_KEY, SelectionSession, SurfaceKind};

pub mod plan;

pub use plan::{DisplayOptions, GraphStats, LabelSelection, LayoutMode, RenderEdge, RenderNode, RenderPlan};

/// The external renderer: lays out and paints a plan, and fades everything outside a focus set.
pub trait GraphRenderer {
    fn render(&mut self, plan: &RenderPlan);
    fn highlight(&mut self, focus: Option<&HashSet<ElementId>>);
}

/// Where a payload came from; decides captions and layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawSource {
    WholeGraph,
    Grouping,
}

/// Buffers the last payload so display toggles can redraw without a new fetch.
#[derive(Debug, Default)]
pub struct GraphView {
    buffered: Option<GraphPayload>,
    use_default_label: bool,
    layout: LayoutMode,
    plan: Option<RenderPlan>,
}

impl GraphView {
    pub fn new() -> Self {
        Self { use_default_label: true, ..Default::default() }
    }

    pub fn plan(&self) -> Option<&RenderPlan> {
        self.plan.as_ref()
    }

    pub fn has_buffer(&self) -> bool {
        self.buffered.is_some()
    }

    pub fn clear(&mut self) {
        self.buffered = None;
        self.plan = None;
    }

    fn labels(&self, session: &SelectionSession) -> LabelSelection {
        let key = |kind| session.primary_label_key(kind).unwrap_or(LABEL_KEY).to_string();
        LabelSelection {
            use_default_label: self.use_default_label,
            vertex_label_key: key(ElementKind::Vertex),
            edge_label_key: key(ElementKind::Edge),
            vertex_keys: session.checked(ElementKind::Vertex, SurfaceKind::Keys).to_vec(),
            edge_keys: session.checked(ElementKind::Edge, SurfaceKind::Keys).to_vec(),
        }
    }

    fn redraw<R: GraphRenderer>(&mut self, session: &SelectionSession, options: &DisplayOptions, renderer: &mut R) {
        let Some(payload) = &self.buffered else { return };
        let plan = plan::prepare(payload, options, &self.labels(session), self.layout);
        debug!("drawing {} nodes / {} edges ({:?})", plan.nodes.len(), plan.edges.len(), plan.layout);
        renderer.render(&plan);
        self.plan = Some(plan);
    }

    /// Draw a freshly fetched payload.
    ///
    /// Whole graphs use element labels on a radial random layout and leave the session marked
    /// changed; grouping results use the chosen label keys on a force layout.
    pub fn draw<R: GraphRenderer>(
        &mut self,
        payload: GraphPayload,
        source: DrawSource,
        session: &mut SelectionSession,
        options: &DisplayOptions,
        renderer: &mut R,
    ) {
        (self.use_default_label, self.layout) = match source {
            DrawSource::WholeGraph => (true, LayoutMode::RadialRandom),
            DrawSource::Grouping => (false, LayoutMode::Force),
        };
        self.buffered = Some(payload);
        self.redraw(session, options, renderer);
        match source {
            DrawSource::WholeGraph => session.mark_changed(),
            DrawSource::Grouping => session.mark_drawn(),
        }
    }

    /// Redraw the buffer with the chosen label keys, but only if the selection still matches
    /// what produced it. Returns whether a draw happened.
    pub fn redraw_if_unchanged<R: GraphRenderer>(
        &mut self,
        session: &mut SelectionSession,
        options: &DisplayOptions,
        renderer: &mut R,
    ) -> bool {
        if session.is_changed() || self.buffered.is_none() {
            return false;
        }
        self.use_default_label = false;
        self.layout = LayoutMode::Force;
        self.redraw(session, options, renderer);
        session.mark_drawn();
        true
    }

    // Tap on a node: fade everything outside its neighborhood
    pub fn focus<R: GraphRenderer>(&self, node_id: &str, renderer: &mut R) {
        if let Some(plan) = &self.plan {
            let hood = plan.neighborhood(node_id);
            if !hood.is_empty() {
                renderer.highlight(Some(&hood));
            }
        }
    }

    pub fn clear_focus<R: GraphRenderer>(&self, renderer: &mut R) {
        renderer.highlight(None);
    }
}
