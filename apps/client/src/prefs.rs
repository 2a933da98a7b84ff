//! Display preferences. The theme persists in its own local slot; the
//! document language is a per-run setting.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::store::{LocalStore, PREFS_SLOT};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prefs {
    #[serde(default)]
    pub theme: Theme,
}

impl Prefs {
    /// Loads preferences; a malformed slot falls back to defaults.
    pub fn load(store: &LocalStore) -> Result<Prefs, AppError> {
        match store.read_json::<Prefs>(PREFS_SLOT) {
            Ok(Some(prefs)) => Ok(prefs),
            Ok(None) => Ok(Prefs::default()),
            Err(AppError::MalformedData(e)) => {
                warn!("Malformed prefs slot, clearing it: {e}");
                store.clear(PREFS_SLOT)?;
                Ok(Prefs::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, store: &LocalStore) -> Result<(), AppError> {
        store.write_json(PREFS_SLOT, self)
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.theme
    }
}
