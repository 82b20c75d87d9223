use std::collections::HashMap;

use log::debug;

use crate::graph_utils::graph::{Label, PropertyKey};

/// Handle to a [`SupportEntry`] owned by a [`FilterMap`].
///
/// Every label that declares a key holds the same handle, so a count changed through one
/// label is the count seen through all of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupportEntry {
    pub key: PropertyKey,
    support_count: u32,
}

impl SupportEntry {
    pub fn support_count(&self) -> u32 {
        self.support_count
    }

    pub fn is_supported(&self) -> bool {
        self.support_count > 0
    }
}

/// Effect of one count adjustment on the supported/unsupported state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupportChange {
    // 0 -> 1
    Gained,
    // 1 -> 0
    Lost,
    Unchanged,
    // decrement at zero, ignored
    Clamped,
}

/// Label -> support entries for the keys that label declares.
#[derive(Clone, Debug, Default)]
pub struct FilterMap {
    entries: Vec<SupportEntry>,
    by_label: HashMap<Label, Vec<EntryId>>,
    by_key: HashMap<String, EntryId>,
}

impl FilterMap {
    pub fn build(keys: &[PropertyKey]) -> Self {
        let mut map = FilterMap::default();
        for key in keys {
            let id = match map.by_key.get(&key.name) {
                Some(&id) => id,
                None => {
                    let id = EntryId(map.entries.len());
                    map.entries.push(SupportEntry { key: PropertyKey { labels: Vec::new(), ..key.clone() }, support_count: 0 });
                    map.by_key.insert(key.name.clone(), id);
                    id
                }
            };
            for label in &key.labels {
                let list = map.by_label.entry(label.clone()).or_default();
                if !list.contains(&id) {
                    list.push(id);
                    map.entries[id.0].key.labels.push(label.clone());
                }
            }
        }
        map
    }

    pub fn entries_for(&self, label: &str) -> &[EntryId] {
        self.by_label.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entry(&self, id: EntryId) -> &SupportEntry {
        &self.entries[id.0]
    }

    pub fn entry_for_key(&self, name: &str) -> Option<&SupportEntry> {
        self.by_key.get(name).map(|&id| self.entry(id))
    }

    pub fn support(&self, name: &str) -> u32 {
        self.entry_for_key(name).map(SupportEntry::support_count).unwrap_or(0)
    }

    pub fn entries(&self) -> impl Iterator<Item = &SupportEntry> {
        self.entries.iter()
    }

    pub fn increment(&mut self, id: EntryId) -> SupportChange {
        let entry = &mut self.entries[id.0];
        entry.support_count += 1;
        if entry.support_count == 1 { SupportChange::Gained } else { SupportChange::Unchanged }
    }

    pub fn decrement(&mut self, id: EntryId) -> SupportChange {
        let entry = &mut self.entries[id.0];
        if entry.support_count == 0 {
            debug!("support count for '{}' already zero; decrement ignored", entry.key.name);
            return SupportChange::Clamped;
        }
        entry.support_count = entry.support_count.saturating_sub(1);
        if entry.support_count == 0 { SupportChange::Lost } else { SupportChange::Unchanged }
    }
}
