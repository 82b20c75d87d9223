use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::selection::session::NoneRestorePolicy;
use crate::view::DisplayOptions;

const SETTINGS_FILE: &str = "settings.json";
const LEGACY_SETTINGS_FILE: &str = "settings.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // If None, databases are read from ./data
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    // Display toggles start cleared, like a freshly loaded page
    #[serde(default)]
    pub show_edge_labels: bool,
    #[serde(default)]
    pub show_count_as_size: bool,
    #[serde(default)]
    pub hide_null_groups: bool,
    #[serde(default)]
    pub hide_disconnected: bool,
    // What leaving the NONE edge filter re-enables
    #[serde(default)]
    pub none_restore: NoneRestorePolicy,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            show_edge_labels: false,
            show_count_as_size: false,
            hide_null_groups: false,
            hide_disconnected: false,
            none_restore: NoneRestorePolicy::default(),
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Graph-Lens
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Graph-Lens");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Graph-Lens
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("Graph-Lens");
            }
            return PathBuf::from("Graph-Lens");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Graph-Lens or ~/.config/Graph-Lens
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("Graph-Lens");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("Graph-Lens");
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_dir())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_dir())
    }

    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let json_path = dir.join(SETTINGS_FILE);
        if json_path.exists() {
            let mut f = fs::File::open(json_path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            let v: Self = serde_json::from_str(&s)?;
            return Ok(v);
        }
        // Migrate from legacy RON if present
        let ron_path = dir.join(LEGACY_SETTINGS_FILE);
        if ron_path.exists() {
            let mut f = fs::File::open(&ron_path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            let v: Self = ron::from_str(&s)?;
            // Save immediately to JSON for future reads, ignore errors silently
            let _ = v.save_to(dir);
            return Ok(v);
        }
        Ok(Self::default())
    }

    pub fn save_to(&self, dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir)?;
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(dir.join(SETTINGS_FILE))?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(p) = &self.data_dir { return p.clone(); }
        PathBuf::from("data")
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            show_edge_labels: self.show_edge_labels,
            show_count_as_size: self.show_count_as_size,
            hide_null_groups: self.hide_null_groups,
            hide_disconnected: self.hide_disconnected,
        }
    }

    pub fn set_display_options(&mut self, options: DisplayOptions) {
        self.show_edge_labels = options.show_edge_labels;
        self.show_count_as_size = options.show_count_as_size;
        self.hide_null_groups = options.hide_null_groups;
        self.hide_disconnected = options.hide_disconnected;
    }
}
