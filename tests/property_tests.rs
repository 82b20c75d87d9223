use proptest::prelude::*;

use graph_lens::graph_utils::graph::{ElementKind, KeySet, PropertyKey};
use graph_lens::selection::session::{
    AGGREGATE_PREFIXES, NoneRestorePolicy, SelectionSession, SessionEvent, SurfaceKind, aggregate_name,
};

const VERTEX_LABELS: [&str; 3] = ["Person", "Company", "City"];
const EDGE_LABELS: [&str; 2] = ["knows", "worksAt"];

fn key_set() -> KeySet {
    KeySet::new(
        vec![
            PropertyKey::new("name", &["Person", "Company", "City"], false),
            PropertyKey::new("age", &["Person"], true),
            PropertyKey::new("founded", &["Company", "City"], true),
        ],
        vec![
            PropertyKey::new("since", &["knows", "worksAt"], true),
            PropertyKey::new("role", &["worksAt"], false),
        ],
    )
}

fn menu_names(kind: ElementKind, surface: SurfaceKind) -> Vec<String> {
    let s = SelectionSession::from_key_set(key_set(), NoneRestorePolicy::default());
    let items = match surface {
        SurfaceKind::AggregateFunctions => s.aggregate_functions(kind),
        _ => s.keys(kind),
    };
    items.into_iter().map(|i| i.name).collect()
}

fn kind_strategy() -> impl Strategy<Value = ElementKind> {
    prop_oneof![Just(ElementKind::Vertex), Just(ElementKind::Edge)]
}

fn event_strategy() -> impl Strategy<Value = SessionEvent> {
    prop_oneof![
        (0..VERTEX_LABELS.len(), any::<bool>()).prop_map(|(i, checked)| SessionEvent::ToggleFilter {
            kind: ElementKind::Vertex,
            label: VERTEX_LABELS[i].to_string(),
            checked
        }),
        (0..EDGE_LABELS.len(), any::<bool>()).prop_map(|(i, checked)| SessionEvent::ToggleFilter {
            kind: ElementKind::Edge,
            label: EDGE_LABELS[i].to_string(),
            checked
        }),
        (kind_strategy(), 0..8usize, any::<bool>()).prop_map(|(kind, i, checked)| {
            let names = menu_names(kind, SurfaceKind::Keys);
            SessionEvent::ToggleKey { kind, name: names[i % names.len()].clone(), checked }
        }),
        (kind_strategy(), 0..8usize, any::<bool>()).prop_map(|(kind, i, checked)| {
            let names = menu_names(kind, SurfaceKind::AggregateFunctions);
            SessionEvent::ToggleAggregateFunction { kind, name: names[i % names.len()].clone(), checked }
        }),
        any::<bool>().prop_map(|checked| SessionEvent::ToggleNoneFilter { checked }),
    ]
}

fn policy_strategy() -> impl Strategy<Value = NoneRestorePolicy> {
    prop_oneof![Just(NoneRestorePolicy::EnableAll), Just(NoneRestorePolicy::Recompute)]
}

// Support of every key equals the number of checked filters declaring it
fn assert_counts_match(s: &SelectionSession) -> Result<(), TestCaseError> {
    for kind in ElementKind::ALL {
        let checked = s.checked(kind, SurfaceKind::Filters);
        for key in s.registry().keys(kind) {
            let declaring = s.registry().labels_declaring(kind, &key.name);
            let expected = declaring.iter().filter(|l| checked.contains(*l)).count() as u32;
            prop_assert_eq!(s.support_count(kind, &key.name), expected, "{} key {}", kind, key.name);
        }
    }
    Ok(())
}

// Every real key, and every aggregate function over it, is enabled iff its support is positive
fn assert_enabled_tracks_support(s: &SelectionSession) -> Result<(), TestCaseError> {
    for kind in ElementKind::ALL {
        for key in s.registry().keys(kind) {
            let supported = s.support_count(kind, &key.name) > 0;
            prop_assert_eq!(s.is_enabled(kind, &key.name), supported, "{} key {}", kind, key.name);
            if key.numerical {
                for prefix in AGGREGATE_PREFIXES {
                    let name = aggregate_name(prefix, &key.name);
                    prop_assert_eq!(s.is_enabled(kind, &name), supported, "{} function {}", kind, name);
                }
            }
        }
    }
    Ok(())
}

fn assert_checked_implies_enabled(s: &SelectionSession) -> Result<(), TestCaseError> {
    for kind in ElementKind::ALL {
        for item in s.filters(kind).into_iter().chain(s.keys(kind)).chain(s.aggregate_functions(kind)) {
            prop_assert!(!item.checked || item.enabled, "{} {} checked while disabled", kind, item.name);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn selection_stays_consistent(policy in policy_strategy(), events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut s = SelectionSession::from_key_set(key_set(), policy);
        // leaving NONE under EnableAll enables unsupported edge items on purpose
        let mut restored_all = false;
        for event in events {
            let was_none = s.is_none_filter_active();
            s.apply(event);
            if was_none && !s.is_none_filter_active() && policy == NoneRestorePolicy::EnableAll {
                restored_all = true;
            }
            assert_counts_match(&s)?;
            if !restored_all {
                assert_enabled_tracks_support(&s)?;
            }
            assert_checked_implies_enabled(&s)?;

            for kind in ElementKind::ALL {
                let keys = s.checked(kind, SurfaceKind::Keys);
                prop_assert_eq!(s.primary_label_key(kind), keys.first().map(String::as_str));
            }

            if s.is_none_filter_active() {
                prop_assert!(s.checked(ElementKind::Edge, SurfaceKind::Filters).is_empty());
                prop_assert!(s.checked(ElementKind::Edge, SurfaceKind::Keys).is_empty());
                prop_assert!(s.checked(ElementKind::Edge, SurfaceKind::AggregateFunctions).is_empty());
                let request = s.grouping_request("db");
                prop_assert!(request.filter_all_edges && request.edge_filters.is_empty());
            }
        }
    }

    #[test]
    fn repeated_events_are_idempotent(events in prop::collection::vec(event_strategy(), 1..30)) {
        let mut once = SelectionSession::default();
        let mut twice = SelectionSession::default();
        once.load_key_set(key_set());
        twice.load_key_set(key_set());
        for event in events {
            once.apply(event.clone());
            twice.apply(event.clone());
            twice.apply(event);
        }
        for kind in ElementKind::ALL {
            for surface in [SurfaceKind::Filters, SurfaceKind::Keys, SurfaceKind::AggregateFunctions] {
                prop_assert_eq!(once.checked(kind, surface), twice.checked(kind, surface));
            }
            for key in once.registry().keys(kind) {
                prop_assert_eq!(once.support_count(kind, &key.name), twice.support_count(kind, &key.name));
                prop_assert_eq!(once.is_enabled(kind, &key.name), twice.is_enabled(kind, &key.name));
            }
        }
        prop_assert_eq!(once.is_none_filter_active(), twice.is_none_filter_active());
    }
}
