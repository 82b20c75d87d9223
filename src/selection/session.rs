use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::filter_map::{FilterMap, SupportChange, SupportEntry};
use super::registry::KeyRegistry;
use super::surface::{IgnoreReason, MenuItem, SelectionSurface};
use crate::graph_utils::graph::{ElementKind, KeySet, PropertyKey};
use crate::service::request::GroupingRequest;

/// Built-in key option that is always offered: group/display by the element label.
pub const LABEL_KEY: &str = "label";
/// Built-in aggregate function with no property key behind it.
pub const COUNT_FUNCTION: &str = "count";
pub const AGGREGATE_PREFIXES: [&str; 3] = ["min", "max", "sum"];

pub fn aggregate_name(prefix: &str, key: &str) -> String {
    format!("{} {}", prefix, key)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Filters,
    Keys,
    AggregateFunctions,
}

/// A change the menu renderer has to mirror.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEffect {
    Enabled { kind: ElementKind, surface: SurfaceKind, name: String },
    Disabled { kind: ElementKind, surface: SurfaceKind, name: String },
    Checked { kind: ElementKind, surface: SurfaceKind, name: String },
    Unchecked { kind: ElementKind, surface: SurfaceKind, name: String },
    PrimaryChanged { kind: ElementKind, primary: Option<String> },
    NoneFilter { active: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Applied(Vec<UiEffect>),
    Ignored(IgnoreReason),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn effects(&self) -> &[UiEffect] {
        match self {
            Transition::Applied(effects) => effects,
            Transition::Ignored(_) => &[],
        }
    }
}

/// User actions the session reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    ToggleFilter { kind: ElementKind, label: String, checked: bool },
    ToggleKey { kind: ElementKind, name: String, checked: bool },
    ToggleAggregateFunction { kind: ElementKind, name: String, checked: bool },
    ToggleNoneFilter { checked: bool },
}

/// What leaving the NONE edge filter does to edge keys and aggregate functions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoneRestorePolicy {
    /// Enable every edge key and function regardless of support counts.
    #[default]
    EnableAll,
    /// Enable only what the current support counts justify.
    Recompute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeFilterMode {
    Normal,
    NoneActive,
}

#[derive(Clone, Debug, Default)]
struct KindState {
    filter_map: FilterMap,
    filters: SelectionSurface,
    keys: SelectionSurface,
    functions: SelectionSurface,
}

impl KindState {
    fn build(keys: &[PropertyKey], labels: &[String]) -> Self {
        let mut state = KindState { filter_map: FilterMap::build(keys), ..Default::default() };
        for label in labels {
            state.filters.push(label.clone(), label.clone(), true);
        }
        state.keys.push(LABEL_KEY, LABEL_KEY, true);
        state.functions.push(COUNT_FUNCTION, COUNT_FUNCTION, true);
        // Nothing is filtered in yet, so every real key starts unsupported
        for key in keys {
            state.keys.push(key.name.clone(), key.caption(), false);
            if key.numerical {
                for prefix in AGGREGATE_PREFIXES {
                    let name = aggregate_name(prefix, &key.name);
                    state.functions.push(name.clone(), name, false);
                }
            }
        }
        state
    }

    fn surface(&self, surface: SurfaceKind) -> &SelectionSurface {
        match surface {
            SurfaceKind::Filters => &self.filters,
            SurfaceKind::Keys => &self.keys,
            SurfaceKind::AggregateFunctions => &self.functions,
        }
    }

    fn surface_mut(&mut self, surface: SurfaceKind) -> &mut SelectionSurface {
        match surface {
            SurfaceKind::Filters => &mut self.filters,
            SurfaceKind::Keys => &mut self.keys,
            SurfaceKind::AggregateFunctions => &mut self.functions,
        }
    }

    // The key itself plus whichever aggregate functions exist for it. A real key named
    // `label` shares the built-in's menu entry, which stays enabled.
    fn dependents(&self, key: &str) -> Vec<(SurfaceKind, String)> {
        let mut out = Vec::new();
        if key != LABEL_KEY {
            out.push((SurfaceKind::Keys, key.to_string()));
        }
        for prefix in AGGREGATE_PREFIXES {
            let name = aggregate_name(prefix, key);
            if self.functions.contains(&name) {
                out.push((SurfaceKind::AggregateFunctions, name));
            }
        }
        out
    }

    fn set_enabled(&mut self, kind: ElementKind, surface: SurfaceKind, name: &str, enabled: bool, effects: &mut Vec<UiEffect>) {
        let target = self.surface_mut(surface);
        if !target.contains(name) || target.is_enabled(name) == enabled {
            return;
        }
        let unchecked = target.set_enabled(name, enabled);
        if unchecked {
            effects.push(UiEffect::Unchecked { kind, surface, name: name.to_string() });
        }
        let name = name.to_string();
        effects.push(if enabled {
            UiEffect::Enabled { kind, surface, name }
        } else {
            UiEffect::Disabled { kind, surface, name }
        });
    }
}

/// Selection state for one loaded database: filter, key and aggregate function menus for
/// vertices and edges, kept mutually consistent as the user toggles entries.
///
/// A key (and its aggregate functions) is enabled while at least one checked filter label
/// declares it, and a disabled entry is never checked.
#[derive(Clone, Debug)]
pub struct SelectionSession {
    registry: KeyRegistry,
    vertex: KindState,
    edge: KindState,
    edge_mode: EdgeFilterMode,
    none_restore: NoneRestorePolicy,
    changed: bool,
}

impl Default for SelectionSession {
    fn default() -> Self {
        Self::new(NoneRestorePolicy::default())
    }
}

impl SelectionSession {
    pub fn new(none_restore: NoneRestorePolicy) -> Self {
        Self {
            registry: KeyRegistry::new(),
            vertex: KindState::default(),
            edge: KindState::default(),
            edge_mode: EdgeFilterMode::Normal,
            none_restore,
            changed: false,
        }
    }

    pub fn from_key_set(set: KeySet, none_restore: NoneRestorePolicy) -> Self {
        let mut session = Self::new(none_restore);
        session.load_key_set(set);
        session
    }

    pub fn load_keys(&mut self, vertex_keys: Vec<PropertyKey>, edge_keys: Vec<PropertyKey>) {
        self.load_key_set(KeySet::new(vertex_keys, edge_keys));
    }

    /// Full reset: registry, filter maps, selections and the NONE override start over.
    pub fn load_key_set(&mut self, set: KeySet) {
        self.registry.load_key_set(set);
        self.vertex = KindState::build(self.registry.keys(ElementKind::Vertex), self.registry.labels(ElementKind::Vertex));
        self.edge = KindState::build(self.registry.keys(ElementKind::Edge), self.registry.labels(ElementKind::Edge));
        self.edge_mode = EdgeFilterMode::Normal;
        self.changed = true;
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    pub fn none_restore_policy(&self) -> NoneRestorePolicy {
        self.none_restore
    }

    pub fn set_none_restore_policy(&mut self, policy: NoneRestorePolicy) {
        self.none_restore = policy;
    }

    fn state(&self, kind: ElementKind) -> &KindState {
        match kind {
            ElementKind::Vertex => &self.vertex,
            ElementKind::Edge => &self.edge,
        }
    }

    fn state_mut(&mut self, kind: ElementKind) -> &mut KindState {
        match kind {
            ElementKind::Vertex => &mut self.vertex,
            ElementKind::Edge => &mut self.edge,
        }
    }

    pub fn apply(&mut self, event: SessionEvent) -> Transition {
        let transition = match &event {
            SessionEvent::ToggleFilter { kind, label, checked } => self.toggle_filter(*kind, label, *checked),
            SessionEvent::ToggleKey { kind, name, checked } => self.toggle_key(*kind, name, *checked),
            SessionEvent::ToggleAggregateFunction { kind, name, checked } => {
                self.toggle_aggregate_function(*kind, name, *checked)
            }
            SessionEvent::ToggleNoneFilter { checked } => self.toggle_none_filter(*checked),
        };
        if let Transition::Ignored(reason) = &transition {
            debug!("ignored {:?}: {}", event, reason);
        }
        transition
    }

    pub fn toggle_filter(&mut self, kind: ElementKind, label: &str, checked: bool) -> Transition {
        if checked && kind == ElementKind::Edge && self.edge_mode == EdgeFilterMode::NoneActive {
            return Transition::Ignored(IgnoreReason::NoneFilterActive);
        }
        let primary_before = self.primary_label_key(kind).map(str::to_string);
        let mut effects = Vec::new();
        if let Err(reason) = self.filter_step(kind, label, checked, &mut effects) {
            return Transition::Ignored(reason);
        }
        self.push_primary_change(kind, primary_before, &mut effects);
        self.changed = true;
        Transition::Applied(effects)
    }

    // Check/uncheck one filter and propagate the support counts of the keys it declares
    fn filter_step(&mut self, kind: ElementKind, label: &str, checked: bool, effects: &mut Vec<UiEffect>) -> Result<(), IgnoreReason> {
        let state = self.state_mut(kind);
        let surface = SurfaceKind::Filters;
        if checked {
            state.filters.check(label)?;
            effects.push(UiEffect::Checked { kind, surface, name: label.to_string() });
        } else {
            state.filters.uncheck(label)?;
            effects.push(UiEffect::Unchecked { kind, surface, name: label.to_string() });
        }

        let ids = state.filter_map.entries_for(label).to_vec();
        for id in ids {
            let change = if checked { state.filter_map.increment(id) } else { state.filter_map.decrement(id) };
            let key = state.filter_map.entry(id).key.name.clone();
            let enable = match change {
                SupportChange::Gained => true,
                SupportChange::Lost => false,
                SupportChange::Unchanged | SupportChange::Clamped => continue,
            };
            debug!("{} key '{}' {} via filter '{}'", kind, key, if enable { "enabled" } else { "disabled" }, label);
            for (surface, name) in state.dependents(&key) {
                state.set_enabled(kind, surface, &name, enable, effects);
            }
        }
        Ok(())
    }

    pub fn toggle_key(&mut self, kind: ElementKind, name: &str, checked: bool) -> Transition {
        let primary_before = self.primary_label_key(kind).map(str::to_string);
        let mut effects = Vec::new();
        if let Err(reason) = self.item_step(kind, SurfaceKind::Keys, name, checked, &mut effects) {
            return Transition::Ignored(reason);
        }
        self.push_primary_change(kind, primary_before, &mut effects);
        Transition::Applied(effects)
    }

    pub fn toggle_aggregate_function(&mut self, kind: ElementKind, name: &str, checked: bool) -> Transition {
        let mut effects = Vec::new();
        match self.item_step(kind, SurfaceKind::AggregateFunctions, name, checked, &mut effects) {
            Ok(()) => Transition::Applied(effects),
            Err(reason) => Transition::Ignored(reason),
        }
    }

    fn item_step(&mut self, kind: ElementKind, surface: SurfaceKind, name: &str, checked: bool, effects: &mut Vec<UiEffect>) -> Result<(), IgnoreReason> {
        let suppressed = kind == ElementKind::Edge && self.edge_mode == EdgeFilterMode::NoneActive;
        let target = self.state_mut(kind).surface_mut(surface);
        if checked {
            match target.check(name) {
                Err(IgnoreReason::Disabled) if suppressed => return Err(IgnoreReason::NoneFilterActive),
                other => other?,
            }
            effects.push(UiEffect::Checked { kind, surface, name: name.to_string() });
        } else {
            target.uncheck(name)?;
            effects.push(UiEffect::Unchecked { kind, surface, name: name.to_string() });
        }
        self.changed = true;
        Ok(())
    }

    /// Enter or leave the edge-only NONE override.
    pub fn toggle_none_filter(&mut self, checked: bool) -> Transition {
        let kind = ElementKind::Edge;
        let primary_before = self.primary_label_key(kind).map(str::to_string);
        let mut effects = Vec::new();
        match (self.edge_mode, checked) {
            (EdgeFilterMode::Normal, true) => {
                let active: Vec<String> = self.edge.filters.checked().to_vec();
                for label in active {
                    // the label is known to be checked, so this cannot be refused
                    let _ = self.filter_step(kind, &label, false, &mut effects);
                }
                let edge = &mut self.edge;
                for surface in [SurfaceKind::Filters, SurfaceKind::Keys, SurfaceKind::AggregateFunctions] {
                    let names: Vec<String> = edge.surface(surface).names().map(str::to_string).collect();
                    for name in names {
                        edge.set_enabled(kind, surface, &name, false, &mut effects);
                    }
                }
                self.edge_mode = EdgeFilterMode::NoneActive;
                info!("NONE edge filter active; edge filters, keys and functions suppressed");
            }
            (EdgeFilterMode::NoneActive, false) => {
                let policy = self.none_restore;
                let edge = &mut self.edge;
                let filters: Vec<String> = edge.filters.names().map(str::to_string).collect();
                for name in filters {
                    edge.set_enabled(kind, SurfaceKind::Filters, &name, true, &mut effects);
                }
                for surface in [SurfaceKind::Keys, SurfaceKind::AggregateFunctions] {
                    let names: Vec<String> = edge.surface(surface).names().map(str::to_string).collect();
                    for name in names {
                        let enable = match policy {
                            NoneRestorePolicy::EnableAll => true,
                            NoneRestorePolicy::Recompute => Self::supported(edge, surface, &name),
                        };
                        edge.set_enabled(kind, surface, &name, enable, &mut effects);
                    }
                }
                self.edge_mode = EdgeFilterMode::Normal;
                info!("NONE edge filter cleared ({:?})", policy);
            }
            _ => return Transition::Ignored(IgnoreReason::Unchanged),
        }
        effects.push(UiEffect::NoneFilter { active: checked });
        self.push_primary_change(kind, primary_before, &mut effects);
        self.changed = true;
        Transition::Applied(effects)
    }

    // Whether support counts alone would enable this key or function
    fn supported(state: &KindState, surface: SurfaceKind, name: &str) -> bool {
        if name == LABEL_KEY && surface == SurfaceKind::Keys {
            return true;
        }
        if name == COUNT_FUNCTION && surface == SurfaceKind::AggregateFunctions {
            return true;
        }
        let key = match surface {
            SurfaceKind::AggregateFunctions => AGGREGATE_PREFIXES
                .iter()
                .find_map(|p| name.strip_prefix(p).and_then(|rest| rest.strip_prefix(' ')))
                .unwrap_or(name),
            _ => name,
        };
        state.filter_map.entry_for_key(key).is_some_and(SupportEntry::is_supported)
    }

    fn push_primary_change(&self, kind: ElementKind, before: Option<String>, effects: &mut Vec<UiEffect>) {
        let after = self.primary_label_key(kind).map(str::to_string);
        if before != after {
            effects.push(UiEffect::PrimaryChanged { kind, primary: after });
        }
    }

    /// Enabled state of a property key or aggregate function.
    pub fn is_enabled(&self, kind: ElementKind, name: &str) -> bool {
        let state = self.state(kind);
        if state.keys.contains(name) {
            return state.keys.is_enabled(name);
        }
        state.functions.is_enabled(name)
    }

    pub fn is_filter_enabled(&self, kind: ElementKind, label: &str) -> bool {
        self.state(kind).filters.is_enabled(label)
    }

    pub fn is_checked(&self, kind: ElementKind, surface: SurfaceKind, name: &str) -> bool {
        self.state(kind).surface(surface).is_checked(name)
    }

    pub fn support_count(&self, kind: ElementKind, key: &str) -> u32 {
        self.state(kind).filter_map.support(key)
    }

    pub fn filter_map(&self, kind: ElementKind) -> &FilterMap {
        &self.state(kind).filter_map
    }

    pub fn primary_label_key(&self, kind: ElementKind) -> Option<&str> {
        self.state(kind).keys.primary()
    }

    pub fn edge_mode(&self) -> EdgeFilterMode {
        self.edge_mode
    }

    pub fn is_none_filter_active(&self) -> bool {
        self.edge_mode == EdgeFilterMode::NoneActive
    }

    pub fn checked(&self, kind: ElementKind, surface: SurfaceKind) -> &[String] {
        self.state(kind).surface(surface).checked()
    }

    pub fn filters(&self, kind: ElementKind) -> Vec<MenuItem> {
        self.state(kind).filters.items()
    }

    pub fn keys(&self, kind: ElementKind) -> Vec<MenuItem> {
        self.state(kind).keys.items()
    }

    pub fn aggregate_functions(&self, kind: ElementKind) -> Vec<MenuItem> {
        self.state(kind).functions.items()
    }

    /// Assemble a grouping request from the checked entries, in check order.
    pub fn grouping_request(&self, db_name: &str) -> GroupingRequest {
        let none = self.is_none_filter_active();
        GroupingRequest {
            db_name: db_name.to_string(),
            vertex_keys: self.vertex.keys.checked().to_vec(),
            edge_keys: self.edge.keys.checked().to_vec(),
            vertex_aggr_funcs: self.vertex.functions.checked().to_vec(),
            edge_aggr_funcs: self.edge.functions.checked().to_vec(),
            vertex_filters: self.vertex.filters.checked().to_vec(),
            edge_filters: if none { Vec::new() } else { self.edge.filters.checked().to_vec() },
            filter_all_edges: none,
        }
    }

    /// True when the selection moved since the last draw.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn mark_drawn(&mut self) {
        self.changed = false;
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }
}
