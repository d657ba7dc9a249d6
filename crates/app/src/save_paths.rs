//! Where the run lives on disk, and the save-or-clear rule: a defeated run
//! is erased instead of saved, so death is permanent.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use game_core::engine::Engine;
use game_core::persist::{SaveError, save_to_path};
use game_core::types::GameStatus;

pub fn default_save_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "Gloomcrawl").map(|proj_dirs| {
        let mut path = proj_dirs.data_dir().to_path_buf();
        path.push("run.sav");
        path
    })
}

/// Persists the engine, unless the run ended in defeat, in which case any
/// existing save is removed.
pub fn save_or_clear(engine: &Engine, path: &Path) -> Result<(), SaveError> {
    if engine.status() == GameStatus::Defeat {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SaveError::Io(e)),
        }
    } else {
        save_to_path(engine, path)
    }
}
