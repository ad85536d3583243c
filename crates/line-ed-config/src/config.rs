/// Editor configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Upper bound for `print_count`.
const MAX_PRINT_COUNT: usize = 10_000;

/// Flags applied to every search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    /// Treat search text as a regular expression.
    pub use_regex: bool,
    pub case_sensitive: bool,
    pub whole_word: bool,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            use_regex: true,
            case_sensitive: true,
            whole_word: false,
        }
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub search: SearchDefaults,
    /// Lines shown by a bare `p` command.
    pub print_count: usize,
    /// Write the file back after a script finishes.
    pub save_after_script: bool,
    /// Copy the original file to `<file>.bak` before saving.
    pub backup_on_save: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            search: SearchDefaults::default(),
            print_count: 1,
            save_after_script: true,
            backup_on_save: false,
        }
    }
}

impl EditorConfig {
    /// Resolves the config file path.
    ///
    /// Resolution order:
    /// 1. `LINE_ED_CONFIG` environment variable
    /// 2. `line-ed/config.json` under the platform config directory
    /// 3. `line-ed.json` in the working directory
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LINE_ED_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .map(|dir| dir.join("line-ed").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("line-ed.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    ///
    /// A file that can't be read or parsed is left in place for the user to
    /// fix, and defaults are used for this run.
    pub fn load_or_create(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            return config;
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Reads and sanitizes the config at `path`.
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&contents).map_err(std::io::Error::other)?;
        for field in config.sanitize() {
            tracing::warn!(
                "Config {field} in {} is out of range, using {}",
                path.display(),
                config.print_count
            );
        }
        Ok(config)
    }

    /// Saves config to `path` as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges and returns the names of changed fields.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let mut clamped = Vec::new();
        let print_count = self.print_count.clamp(1, MAX_PRINT_COUNT);
        if print_count != self.print_count {
            self.print_count = print_count;
            clamped.push("print_count");
        }
        clamped
    }
}
