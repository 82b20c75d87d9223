use std::collections::HashSet;

use eframe::egui::{self, Color32, RichText};
use log::{info, warn};

use crate::graph_utils::graph::{ElementId, ElementKind};
use crate::persistence::settings::AppSettings;
use crate::selection::session::{NoneRestorePolicy, SelectionSession, SessionEvent, SurfaceKind};
use crate::selection::surface::MenuItem;
use crate::service::broker::{ReplyPayload, RequestKind, ServiceBroker, ServiceJob, ServiceReply};
use crate::service::GraphDataService;
use crate::service::request::NO_DATABASE;
use crate::view::{DisplayOptions, DrawSource, GraphRenderer, GraphView, LayoutMode, RenderPlan};

/// Renderer that lists the plan's elements instead of painting a layout.
#[derive(Debug, Default)]
pub struct ListRenderer {
    plan: Option<RenderPlan>,
    focus: Option<HashSet<ElementId>>,
}

impl GraphRenderer for ListRenderer {
    fn render(&mut self, plan: &RenderPlan) {
        self.plan = Some(plan.clone());
        self.focus = None;
    }

    fn highlight(&mut self, focus: Option<&HashSet<ElementId>>) {
        self.focus = focus.cloned();
    }
}

impl ListRenderer {
    fn faded(&self, id: &str) -> bool {
        self.focus.as_ref().is_some_and(|f| !f.contains(id))
    }

    fn text(&self, id: &str, caption: &str) -> RichText {
        let t = RichText::new(caption);
        if self.faded(id) { t.weak() } else { t }
    }

    // Returns the node the user clicked, if any
    fn show(&self, ui: &mut egui::Ui) -> Option<ElementId> {
        let plan = self.plan.as_ref()?;
        let mut tapped = None;
        egui::Grid::new("stats").show(ui, |ui| {
            ui.label("Vertex Count");
            ui.label(plan.stats.vertex_count.to_string());
            ui.end_row();
            ui.label("Edge Count");
            ui.label(plan.stats.edge_count.to_string());
            ui.end_row();
            ui.label("Layout");
            ui.label(match plan.layout {
                LayoutMode::Force => "force",
                LayoutMode::RadialRandom => "radial random",
            });
            ui.end_row();
        });
        ui.separator();
        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            ui.heading("Vertices");
            for n in &plan.nodes {
                let caption = if n.caption.is_empty() { n.id.as_str() } else { n.caption.as_str() };
                let resp = ui
                    .selectable_label(false, self.text(&n.id, caption).size(n.font_size as f32))
                    .on_hover_ui(|ui| tooltip(ui, &n.tooltip));
                if resp.clicked() {
                    tapped = Some(n.id.clone());
                }
            }
            ui.add_space(8.0);
            ui.heading("Edges");
            for e in &plan.edges {
                let ends = format!(
                    "{} -> {}",
                    e.source.as_deref().unwrap_or("?"),
                    e.target.as_deref().unwrap_or("?")
                );
                let line = if e.caption.is_empty() { ends } else { format!("{}  {}", ends, e.caption) };
                ui.label(self.text(&e.id, &line)).on_hover_ui(|ui| tooltip(ui, &e.tooltip));
            }
        });
        tapped
    }
}

fn tooltip(ui: &mut egui::Ui, lines: &[(String, String)]) {
    for (k, v) in lines {
        ui.label(format!("{} : {}", k, v));
    }
}

pub struct GroupingApp {
    settings: AppSettings,
    broker: ServiceBroker,
    databases: Vec<String>,
    selected_db: String,
    keys_loaded: bool,
    session: SelectionSession,
    view: GraphView,
    renderer: ListRenderer,
    options: DisplayOptions,
    loading: bool,
    alert: Option<String>,
}

impl GroupingApp {
    pub fn new<S: GraphDataService + 'static>(settings: AppSettings, service: S, ctx: egui::Context) -> std::io::Result<Self> {
        let broker = ServiceBroker::spawn_with_notify(service, Box::new(move || ctx.request_repaint()))?;
        let mut app = Self {
            session: SelectionSession::new(settings.none_restore),
            options: settings.display_options(),
            settings,
            broker,
            databases: Vec::new(),
            selected_db: NO_DATABASE.to_string(),
            keys_loaded: false,
            view: GraphView::new(),
            renderer: ListRenderer::default(),
            loading: false,
            alert: None,
        };
        app.submit(ServiceJob::ListDatabases);
        Ok(app)
    }

    fn submit(&mut self, job: ServiceJob) {
        if let Err(e) = self.broker.submit(job) {
            self.alert = Some(e.to_string());
        }
    }

    fn handle_reply(&mut self, reply: ServiceReply) {
        match reply.result {
            Ok(ReplyPayload::Databases(names)) => self.databases = names,
            Ok(ReplyPayload::Keys { database, .. }) if database != self.selected_db => {
                info!("ignoring keys for '{}', no longer selected", database);
            }
            Ok(ReplyPayload::Keys { database, keys }) => {
                info!("keys loaded for '{}'", database);
                self.session.load_key_set(keys);
                self.keys_loaded = true;
            }
            Ok(ReplyPayload::WholeGraph(payload)) => {
                self.loading = false;
                self.view.draw(payload, DrawSource::WholeGraph, &mut self.session, &self.options, &mut self.renderer);
            }
            Ok(ReplyPayload::Grouped(payload)) => {
                self.loading = false;
                self.view.draw(payload, DrawSource::Grouping, &mut self.session, &self.options, &mut self.renderer);
            }
            Err(e) => {
                self.loading = false;
                self.alert = Some(e.to_string());
            }
        }
    }

    fn select_database(&mut self) {
        self.session.mark_changed();
        self.view.clear();
        self.keys_loaded = false;
        self.loading = false;
        // replies for the previous database, keys or graphs, are stale from here on
        self.broker.invalidate(RequestKind::Keys);
        if self.selected_db != NO_DATABASE {
            let database = self.selected_db.clone();
            self.submit(ServiceJob::LoadKeys { database });
        }
    }

    fn execute(&mut self) {
        let request = self.session.grouping_request(&self.selected_db);
        match request.validate() {
            Ok(()) => {
                self.loading = true;
                self.submit(ServiceJob::Grouping(request));
            }
            Err(e) => self.alert = Some(format!("Not a valid request: {}", e)),
        }
    }

    fn whole_graph(&mut self) {
        if self.selected_db == NO_DATABASE {
            self.alert = Some("Select a database first".into());
            return;
        }
        self.loading = true;
        let database = self.selected_db.clone();
        self.submit(ServiceJob::WholeGraph { database });
    }

    fn options_changed(&mut self) {
        self.settings.set_display_options(self.options);
        self.settings.none_restore = self.session.none_restore_policy();
        if let Err(e) = self.settings.save() {
            warn!("failed to save settings: {}", e);
        }
        self.view.redraw_if_unchanged(&mut self.session, &self.options, &mut self.renderer);
    }
}

fn menu(
    ui: &mut egui::Ui,
    title: &str,
    kind: ElementKind,
    surface: SurfaceKind,
    items: Vec<MenuItem>,
    primary: Option<&str>,
    events: &mut Vec<SessionEvent>,
) {
    egui::CollapsingHeader::new(title).id_salt((title, kind as u8)).default_open(false).show(ui, |ui| {
        if !items.iter().any(|i| i.checked) {
            ui.small("Select...");
        }
        for item in items {
            let mut checked = item.checked;
            let mut text = RichText::new(&item.caption);
            if !item.enabled {
                text = text.color(Color32::GRAY);
            } else if primary == Some(item.name.as_str()) {
                text = text.strong();
            }
            if ui.add_enabled(item.enabled, egui::Checkbox::new(&mut checked, text)).changed() {
                let name = item.name;
                events.push(match surface {
                    SurfaceKind::Filters => SessionEvent::ToggleFilter { kind, label: name, checked },
                    SurfaceKind::Keys => SessionEvent::ToggleKey { kind, name, checked },
                    SurfaceKind::AggregateFunctions => SessionEvent::ToggleAggregateFunction { kind, name, checked },
                });
            }
        }
    });
}

impl eframe::App for GroupingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for reply in self.broker.poll() {
            self.handle_reply(reply);
        }

        if let Some(msg) = self.alert.clone() {
            let mut dismiss = false;
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(msg);
                    if ui.button("OK").clicked() {
                        dismiss = true;
                    }
                });
            if dismiss {
                self.alert = None;
            }
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Graph-Lens");
                let before = self.selected_db.clone();
                egui::ComboBox::from_id_salt("database")
                    .selected_text(self.selected_db.as_str())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.selected_db, NO_DATABASE.to_string(), NO_DATABASE);
                        for name in &self.databases {
                            ui.selectable_value(&mut self.selected_db, name.clone(), name.as_str());
                        }
                    });
                if self.selected_db != before {
                    self.select_database();
                }
                if self.keys_loaded {
                    if ui.button("Execute").clicked() {
                        self.execute();
                    }
                    if ui.button("Show whole graph").clicked() {
                        self.whole_graph();
                    }
                }
                if self.loading {
                    ui.spinner();
                }
            });
        });

        if self.keys_loaded {
            let mut events = Vec::new();
            egui::SidePanel::left("selection_menus")
                .resizable(true)
                .default_width(280.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                        let s = &self.session;
                        for kind in ElementKind::ALL {
                            let noun = match kind {
                                ElementKind::Vertex => "Vertex",
                                ElementKind::Edge => "Edge",
                            };
                            ui.heading(format!("{} selection", noun));
                            menu(ui, &format!("{} filters", noun), kind, SurfaceKind::Filters, s.filters(kind), None, &mut events);
                            if kind == ElementKind::Edge {
                                let mut none = s.is_none_filter_active();
                                if ui.checkbox(&mut none, "NONE").on_hover_text("Group all edges regardless of label").changed() {
                                    events.push(SessionEvent::ToggleNoneFilter { checked: none });
                                }
                            }
                            let primary = s.primary_label_key(kind);
                            menu(ui, &format!("{} property keys", noun), kind, SurfaceKind::Keys, s.keys(kind), primary, &mut events);
                            menu(
                                ui,
                                &format!("{} aggregate functions", noun),
                                kind,
                                SurfaceKind::AggregateFunctions,
                                s.aggregate_functions(kind),
                                None,
                                &mut events,
                            );
                            ui.separator();
                        }

                        ui.heading("Display");
                        let mut changed = false;
                        changed |= ui.checkbox(&mut self.options.show_edge_labels, "Show edge labels").changed();
                        changed |= ui.checkbox(&mut self.options.show_count_as_size, "Show count as size").changed();
                        changed |= ui.checkbox(&mut self.options.hide_null_groups, "Hide NULL groups").changed();
                        changed |= ui.checkbox(&mut self.options.hide_disconnected, "Hide disconnected vertices").changed();
                        let mut recompute = self.session.none_restore_policy() == NoneRestorePolicy::Recompute;
                        if ui
                            .checkbox(&mut recompute, "Recompute edge keys after NONE")
                            .on_hover_text("Otherwise every edge key is re-enabled when NONE is cleared")
                            .changed()
                        {
                            self.session.set_none_restore_policy(if recompute {
                                NoneRestorePolicy::Recompute
                            } else {
                                NoneRestorePolicy::EnableAll
                            });
                            changed = true;
                        }
                        if changed {
                            self.options_changed();
                        }
                    });
                });
            for event in events {
                self.session.apply(event);
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.view.has_buffer() {
                ui.label("Pick a database, choose keys and press Execute.");
                return;
            }
            if ui.button("Clear highlight").clicked() {
                self.view.clear_focus(&mut self.renderer);
            }
            if let Some(node) = self.renderer.show(ui) {
                self.view.focus(&node, &mut self.renderer);
            }
        });
    }
}
