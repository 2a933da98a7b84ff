//! Local persistent slots — one named JSON file per slot under the data
//! directory. The dossier slot is the sole source of truth between sessions.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::AppError;

/// Slot holding the serialized canonical dossier.
pub const DOSSIER_SLOT: &str = "dossier";
/// Slot holding display preferences (light/dark theme).
pub const PREFS_SLOT: &str = "prefs";
/// Slot holding the persisted auth session.
pub const SESSION_SLOT: &str = "session";

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Opens the store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(dir)?;
        Ok(LocalStore {
            dir: dir.to_path_buf(),
        })
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }

    /// Raw contents of a slot; `None` if the slot has never been written.
    pub fn read(&self, slot: &str) -> Result<Option<String>, AppError> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write(&self, slot: &str, contents: &str) -> Result<(), AppError> {
        fs::write(self.slot_path(slot), contents)?;
        debug!("Wrote local slot '{slot}'");
        Ok(())
    }

    /// Removes a slot. Clearing a slot that does not exist is a no-op.
    pub fn clear(&self, slot: &str) -> Result<(), AppError> {
        match fs::remove_file(self.slot_path(slot)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_json<T: DeserializeOwned>(&self, slot: &str) -> Result<Option<T>, AppError> {
        match self.read(slot)? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    pub fn write_json<T: Serialize>(&self, slot: &str, value: &T) -> Result<(), AppError> {
        self.write(slot, &serde_json::to_string(value)?)
    }
}
