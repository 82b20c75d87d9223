use graph_lens::graph_utils::graph::{ElementKind, KeySet, PropertyKey};
use graph_lens::selection::session::{
    EdgeFilterMode, NoneRestorePolicy, SelectionSession, SessionEvent, SurfaceKind, Transition, UiEffect,
};
use graph_lens::selection::surface::IgnoreReason;
use graph_lens::service::request::{GroupingRequest, NO_DATABASE, RequestError};

use ElementKind::{Edge, Vertex};

fn age_session() -> SelectionSession {
    let mut s = SelectionSession::default();
    s.load_keys(vec![PropertyKey::new("age", &["Person"], true)], vec![]);
    s
}

fn shared_name_session() -> SelectionSession {
    let mut s = SelectionSession::default();
    s.load_keys(vec![PropertyKey::new("name", &["Person", "Company"], false)], vec![]);
    s
}

fn edge_session(policy: NoneRestorePolicy) -> SelectionSession {
    let set = KeySet {
        vertex_keys: vec![PropertyKey::new("name", &["Person"], false)],
        edge_keys: vec![
            PropertyKey::new("since", &["knows"], true),
            PropertyKey::new("role", &["worksAt"], false),
        ],
        vertex_labels: vec![],
        edge_labels: vec!["knows".into(), "worksAt".into()],
    };
    SelectionSession::from_key_set(set, policy)
}

const AGE_ITEMS: [&str; 4] = ["age", "min age", "max age", "sum age"];

#[test]
fn scenario_a_single_label_gates_key_and_functions() {
    let mut s = age_session();
    for item in AGE_ITEMS {
        assert!(!s.is_enabled(Vertex, item), "{} should start disabled", item);
    }

    assert!(s.toggle_filter(Vertex, "Person", true).is_applied());
    for item in AGE_ITEMS {
        assert!(s.is_enabled(Vertex, item), "{} should be enabled", item);
    }

    assert!(s.toggle_key(Vertex, "age", true).is_applied());
    assert!(s.toggle_aggregate_function(Vertex, "max age", true).is_applied());

    let t = s.toggle_filter(Vertex, "Person", false);
    assert!(t.effects().contains(&UiEffect::Unchecked {
        kind: Vertex,
        surface: SurfaceKind::Keys,
        name: "age".into()
    }));
    for item in AGE_ITEMS {
        assert!(!s.is_enabled(Vertex, item), "{} should be disabled", item);
    }
    assert!(!s.is_checked(Vertex, SurfaceKind::Keys, "age"));
    assert!(!s.is_checked(Vertex, SurfaceKind::AggregateFunctions, "max age"));
    assert!(s.checked(Vertex, SurfaceKind::AggregateFunctions).is_empty());
}

#[test]
fn scenario_b_shared_key_counts_across_labels() {
    let mut s = shared_name_session();
    s.toggle_filter(Vertex, "Person", true);
    assert!(s.is_enabled(Vertex, "name"));
    assert_eq!(s.support_count(Vertex, "name"), 1);

    s.toggle_filter(Vertex, "Company", true);
    assert!(s.is_enabled(Vertex, "name"));
    assert_eq!(s.support_count(Vertex, "name"), 2);

    s.toggle_filter(Vertex, "Person", false);
    assert!(s.is_enabled(Vertex, "name"));
    assert_eq!(s.support_count(Vertex, "name"), 1);

    s.toggle_filter(Vertex, "Company", false);
    assert!(!s.is_enabled(Vertex, "name"));
    assert_eq!(s.support_count(Vertex, "name"), 0);
}

#[test]
fn scenario_c_none_filter_suppresses_edges_and_shapes_request() {
    let mut s = edge_session(NoneRestorePolicy::EnableAll);
    s.toggle_filter(Vertex, "Person", true);
    s.toggle_key(Vertex, "name", true);
    s.toggle_filter(Edge, "knows", true);
    s.toggle_key(Edge, "since", true);
    s.toggle_aggregate_function(Edge, "sum since", true);

    let t = s.toggle_none_filter(true);
    assert!(t.effects().contains(&UiEffect::NoneFilter { active: true }));
    assert_eq!(s.edge_mode(), EdgeFilterMode::NoneActive);

    for f in s.filters(Edge) {
        assert!(!f.enabled && !f.checked, "edge filter {} still live", f.name);
    }
    assert!(!s.is_filter_enabled(Edge, "knows"));
    assert!(s.is_filter_enabled(Vertex, "Person"));
    for k in s.keys(Edge).into_iter().chain(s.aggregate_functions(Edge)) {
        assert!(!k.enabled && !k.checked, "edge item {} still live", k.name);
    }
    // the unchecked filter gave its support back
    assert_eq!(s.support_count(Edge, "since"), 0);
    // vertices are untouched
    assert!(s.is_checked(Vertex, SurfaceKind::Keys, "name"));

    let request = s.grouping_request("social");
    assert!(request.filter_all_edges);
    assert!(request.edge_filters.is_empty());
    assert!(request.edge_keys.is_empty());
    assert!(request.edge_aggr_funcs.is_empty());
    assert_eq!(request.vertex_keys, vec!["name".to_string()]);
    assert_eq!(request.validate(), Ok(()));
}

#[test]
fn scenario_d_placeholder_database_is_rejected() {
    let request = GroupingRequest {
        db_name: NO_DATABASE.to_string(),
        vertex_keys: vec!["label".into()],
        edge_keys: vec!["label".into()],
        vertex_aggr_funcs: vec!["count".into()],
        vertex_filters: vec!["Person".into()],
        ..Default::default()
    };
    assert_eq!(request.validate(), Err(RequestError::NoDatabase));

    let no_keys = GroupingRequest { db_name: "social".into(), ..Default::default() };
    assert_eq!(no_keys.validate(), Err(RequestError::NoVertexKeys));
}

#[test]
fn duplicate_check_does_not_double_count() {
    let mut s = age_session();
    assert!(s.toggle_filter(Vertex, "Person", true).is_applied());
    assert_eq!(s.toggle_filter(Vertex, "Person", true), Transition::Ignored(IgnoreReason::Unchanged));
    assert_eq!(s.support_count(Vertex, "age"), 1);

    // one uncheck is enough to release the key
    s.toggle_filter(Vertex, "Person", false);
    assert!(!s.is_enabled(Vertex, "age"));
}

#[test]
fn unchecking_a_never_checked_filter_is_ignored() {
    let mut s = age_session();
    assert_eq!(s.toggle_filter(Vertex, "Person", false), Transition::Ignored(IgnoreReason::Unchanged));
    assert_eq!(s.support_count(Vertex, "age"), 0);
    assert_eq!(s.toggle_filter(Vertex, "Robot", true), Transition::Ignored(IgnoreReason::UnknownItem));
}

#[test]
fn label_without_keys_toggles_cleanly() {
    let set = KeySet {
        vertex_keys: vec![PropertyKey::new("age", &["Person"], true)],
        vertex_labels: vec!["Tag".into()],
        ..Default::default()
    };
    let mut s = SelectionSession::from_key_set(set, NoneRestorePolicy::default());
    let names: Vec<String> = s.filters(Vertex).into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["Tag".to_string(), "Person".to_string()]);

    let t = s.toggle_filter(Vertex, "Tag", true);
    assert_eq!(
        t.effects(),
        &[UiEffect::Checked { kind: Vertex, surface: SurfaceKind::Filters, name: "Tag".into() }]
    );
    assert!(!s.is_enabled(Vertex, "age"));
    assert_eq!(s.grouping_request("db").vertex_filters, vec!["Tag".to_string()]);
}

#[test]
fn keys_do_not_feed_back_into_filters() {
    let mut s = age_session();
    s.toggle_filter(Vertex, "Person", true);
    s.toggle_key(Vertex, "age", true);
    s.toggle_key(Vertex, "age", false);
    assert_eq!(s.support_count(Vertex, "age"), 1);
    assert!(s.is_checked(Vertex, SurfaceKind::Filters, "Person"));
}

#[test]
fn disabled_items_cannot_be_checked() {
    let mut s = age_session();
    assert_eq!(s.toggle_key(Vertex, "age", true), Transition::Ignored(IgnoreReason::Disabled));
    assert_eq!(
        s.toggle_aggregate_function(Vertex, "min age", true),
        Transition::Ignored(IgnoreReason::Disabled)
    );
    // built-ins are always available
    assert!(s.toggle_key(Vertex, "label", true).is_applied());
    assert!(s.toggle_aggregate_function(Vertex, "count", true).is_applied());
    assert_eq!(s.toggle_aggregate_function(Vertex, "avg age", true), Transition::Ignored(IgnoreReason::UnknownItem));
}

#[test]
fn non_numerical_keys_have_no_aggregate_functions() {
    let s = shared_name_session();
    let names: Vec<String> = s.aggregate_functions(Vertex).into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["count".to_string()]);
    let key = s.keys(Vertex).into_iter().find(|k| k.name == "name").unwrap();
    assert_eq!(key.caption, "<Person, Company>.name");
    assert!(!s.registry().key(Vertex, "name").unwrap().numerical);
    assert_eq!(s.registry().labels(Vertex), ["Person".to_string(), "Company".to_string()]);
}

#[test]
fn primary_label_follows_first_remaining_checked_key() {
    let mut s = SelectionSession::default();
    s.load_keys(
        vec![
            PropertyKey::new("name", &["Person"], false),
            PropertyKey::new("city", &["Person"], false),
        ],
        vec![],
    );
    s.toggle_filter(Vertex, "Person", true);
    assert_eq!(s.primary_label_key(Vertex), None);

    let t = s.toggle_key(Vertex, "city", true);
    assert!(t.effects().contains(&UiEffect::PrimaryChanged { kind: Vertex, primary: Some("city".into()) }));
    let t = s.toggle_key(Vertex, "name", true);
    assert!(!t.effects().iter().any(|e| matches!(e, UiEffect::PrimaryChanged { .. })));
    assert_eq!(s.primary_label_key(Vertex), Some("city"));

    s.toggle_key(Vertex, "label", true);
    s.toggle_key(Vertex, "city", false);
    assert_eq!(s.primary_label_key(Vertex), Some("name"));

    // losing the filter drops the primary through the disable path
    let t = s.toggle_filter(Vertex, "Person", false);
    assert!(t.effects().contains(&UiEffect::PrimaryChanged { kind: Vertex, primary: Some("label".into()) }));
    assert_eq!(s.grouping_request("db").vertex_keys, vec!["label".to_string()]);
}

#[test]
fn none_filter_refuses_edge_toggles() {
    let mut s = edge_session(NoneRestorePolicy::EnableAll);
    s.toggle_none_filter(true);
    assert_eq!(s.toggle_filter(Edge, "knows", true), Transition::Ignored(IgnoreReason::NoneFilterActive));
    assert_eq!(s.toggle_key(Edge, "label", true), Transition::Ignored(IgnoreReason::NoneFilterActive));
    assert_eq!(
        s.toggle_aggregate_function(Edge, "count", true),
        Transition::Ignored(IgnoreReason::NoneFilterActive)
    );
    assert_eq!(s.toggle_none_filter(true), Transition::Ignored(IgnoreReason::Unchanged));
    assert_eq!(s.support_count(Edge, "since"), 0);
}

#[test]
fn leaving_none_enables_everything_under_enable_all() {
    let mut s = edge_session(NoneRestorePolicy::EnableAll);
    s.toggle_none_filter(true);
    s.toggle_none_filter(false);
    assert_eq!(s.edge_mode(), EdgeFilterMode::Normal);

    // no edge filter is checked, yet every edge key and function is enabled
    for item in ["label", "since", "role", "count", "min since", "max since", "sum since"] {
        assert!(s.is_enabled(Edge, item), "{} should be enabled", item);
    }
    assert_eq!(s.support_count(Edge, "since"), 0);
    assert!(s.filters(Edge).iter().all(|f| f.enabled && !f.checked));

    // a later filter round trip brings gating back
    s.toggle_filter(Edge, "knows", true);
    s.toggle_filter(Edge, "knows", false);
    assert!(!s.is_enabled(Edge, "since"));
    assert!(s.is_enabled(Edge, "role"));
}

#[test]
fn leaving_none_recomputes_under_recompute() {
    let mut s = edge_session(NoneRestorePolicy::Recompute);
    s.toggle_none_filter(true);
    s.toggle_none_filter(false);
    for item in ["label", "count"] {
        assert!(s.is_enabled(Edge, item), "{} should be enabled", item);
    }
    for item in ["since", "role", "min since", "sum since"] {
        assert!(!s.is_enabled(Edge, item), "{} should stay disabled", item);
    }
    s.toggle_filter(Edge, "worksAt", true);
    assert!(s.is_enabled(Edge, "role"));
}

#[test]
fn key_load_resets_everything() {
    let mut s = edge_session(NoneRestorePolicy::EnableAll);
    s.toggle_filter(Vertex, "Person", true);
    s.toggle_key(Vertex, "name", true);
    s.toggle_none_filter(true);
    s.mark_drawn();

    s.load_keys(vec![PropertyKey::new("name", &["Person"], false)], vec![]);
    assert!(s.is_changed());
    assert!(!s.is_none_filter_active());
    assert!(s.checked(Vertex, SurfaceKind::Keys).is_empty());
    assert_eq!(s.support_count(Vertex, "name"), 0);
    assert!(!s.is_enabled(Vertex, "name"));
    assert!(s.filters(Edge).is_empty());
    // the empty edge side still offers its built-ins
    let edge_keys: Vec<String> = s.keys(Edge).into_iter().map(|k| k.name).collect();
    assert_eq!(edge_keys, vec!["label".to_string()]);
}

#[test]
fn events_route_to_transitions() {
    let mut s = age_session();
    let t = s.apply(SessionEvent::ToggleFilter { kind: Vertex, label: "Person".into(), checked: true });
    assert!(t.is_applied());
    let t = s.apply(SessionEvent::ToggleKey { kind: Vertex, name: "age".into(), checked: true });
    assert!(t.is_applied());
    let t = s.apply(SessionEvent::ToggleAggregateFunction { kind: Vertex, name: "sum age".into(), checked: true });
    assert!(t.is_applied());
    let t = s.apply(SessionEvent::ToggleNoneFilter { checked: false });
    assert_eq!(t, Transition::Ignored(IgnoreReason::Unchanged));

    let request = s.grouping_request("people");
    assert_eq!(request.vertex_keys, vec!["age".to_string()]);
    assert_eq!(request.vertex_aggr_funcs, vec!["sum age".to_string()]);
    assert_eq!(request.vertex_filters, vec!["Person".to_string()]);
    assert!(!request.filter_all_edges);
}

#[test]
fn grouping_request_serializes_in_camel_case() {
    let mut s = age_session();
    s.toggle_key(Vertex, "label", true);
    let json = serde_json::to_value(s.grouping_request("people")).unwrap();
    assert_eq!(json["dbName"], "people");
    assert_eq!(json["vertexKeys"][0], "label");
    assert_eq!(json["filterAllEdges"], false);
    assert!(json["edgeAggrFuncs"].as_array().unwrap().is_empty());
}

#[test]
fn real_label_key_leaves_builtin_label_available() {
    let mut s = SelectionSession::default();
    s.load_keys(vec![PropertyKey::new("label", &["Person"], true)], vec![]);
    assert!(s.is_enabled(Vertex, "label"));
    assert!(!s.is_enabled(Vertex, "min label"));

    s.toggle_filter(Vertex, "Person", true);
    assert!(s.toggle_key(Vertex, "label", true).is_applied());
    assert!(s.is_enabled(Vertex, "min label"));

    let t = s.toggle_filter(Vertex, "Person", false);
    assert!(!t.effects().iter().any(|e| matches!(e, UiEffect::Disabled { name, .. } if name == "label")));
    assert!(s.is_enabled(Vertex, "label"));
    assert!(s.is_checked(Vertex, SurfaceKind::Keys, "label"));
    assert!(!s.is_enabled(Vertex, "min label"));
    assert_eq!(s.grouping_request("db").vertex_keys, vec!["label".to_string()]);
}
