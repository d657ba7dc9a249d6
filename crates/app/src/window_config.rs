//! Persisted window settings, loaded before the window opens.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub format_version: u32,
    pub width: i32,
    pub height: i32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { format_version: 1, width: 1280, height: 800, fullscreen: false }
    }
}

impl WindowConfig {
    pub fn get_default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "Gloomcrawl").map(|proj_dirs| {
            let mut path = proj_dirs.config_dir().to_path_buf();
            path.push("window.json");
            path
        })
    }

    /// Loads the config, falling back to defaults when the file is missing
    /// or unreadable. A bad config is never fatal.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        path.and_then(|p| Self::load(p).ok()).unwrap_or_default()
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// The same settings with the window's current size captured, for
    /// persisting on exit.
    pub fn resized(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn write_atomic(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_roundtrip() {
        let config =
            WindowConfig { format_version: 1, width: 1024, height: 768, fullscreen: true };
        let json = serde_json::to_string(&config).unwrap();
        let decoded: WindowConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, decoded);
    }

    #[test]
    fn atomic_write_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("window.json");
        let config = WindowConfig { width: 640, ..WindowConfig::default() };
        config.write_atomic(&path).unwrap();
        assert_eq!(WindowConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn resized_updates_dimensions_and_keeps_the_rest() {
        let config = WindowConfig { fullscreen: true, ..WindowConfig::default() };
        let resized = config.resized(800, 600);
        assert_eq!(resized.width, 800);
        assert_eq!(resized.height, 600);
        assert!(resized.fullscreen);
        assert_eq!(resized.format_version, WindowConfig::default().format_version);
    }

    #[test]
    fn a_garbled_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("window.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(WindowConfig::load_or_default(Some(&path)), WindowConfig::default());
    }
}
