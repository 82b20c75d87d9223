use std::fmt;

/// Why a toggle left the state untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownItem,
    Disabled,
    NoneFilterActive,
    // already in the requested state
    Unchanged,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IgnoreReason::UnknownItem => "unknown item",
            IgnoreReason::Disabled => "item is disabled",
            IgnoreReason::NoneFilterActive => "the NONE edge filter is active",
            IgnoreReason::Unchanged => "already in that state",
        };
        f.write_str(s)
    }
}

/// Read-only view of one menu entry for the renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub name: String,
    pub caption: String,
    pub checked: bool,
    pub enabled: bool,
}

#[derive(Clone, Debug)]
struct Entry {
    name: String,
    caption: String,
    enabled: bool,
}

/// One checkbox menu: its entries in menu order, their enabled flags, and the checked
/// entries in the order they were checked.
#[derive(Clone, Debug, Default)]
pub struct SelectionSurface {
    entries: Vec<Entry>,
    checked: Vec<String>,
}

impl SelectionSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, caption: impl Into<String>, enabled: bool) {
        let name = name.into();
        if self.contains(&name) {
            return;
        }
        self.entries.push(Entry { name, caption: caption.into(), enabled });
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.entry(name).map(|e| e.enabled).unwrap_or(false)
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.checked.iter().any(|c| c == name)
    }

    pub fn check(&mut self, name: &str) -> Result<(), IgnoreReason> {
        match self.entry(name) {
            None => Err(IgnoreReason::UnknownItem),
            Some(e) if !e.enabled => Err(IgnoreReason::Disabled),
            Some(_) if self.is_checked(name) => Err(IgnoreReason::Unchanged),
            Some(_) => {
                self.checked.push(name.to_string());
                Ok(())
            }
        }
    }

    pub fn uncheck(&mut self, name: &str) -> Result<(), IgnoreReason> {
        if !self.contains(name) {
            return Err(IgnoreReason::UnknownItem);
        }
        let before = self.checked.len();
        self.checked.retain(|c| c != name);
        if self.checked.len() == before { Err(IgnoreReason::Unchanged) } else { Ok(()) }
    }

    /// Set the enabled flag. Disabling a checked entry unchecks it in the same step;
    /// returns true when that happened.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) else {
            return false;
        };
        entry.enabled = enabled;
        if enabled {
            return false;
        }
        self.uncheck(name).is_ok()
    }

    // First remaining checked entry in check order
    pub fn primary(&self) -> Option<&str> {
        self.checked.first().map(String::as_str)
    }

    pub fn checked(&self) -> &[String] {
        &self.checked
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn items(&self) -> Vec<MenuItem> {
        self.entries
            .iter()
            .map(|e| MenuItem {
                name: e.name.clone(),
                caption: e.caption.clone(),
                checked: self.is_checked(&e.name),
                enabled: e.enabled,
            })
            .collect()
    }
}
