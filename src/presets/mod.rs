//! Named session presets stored as a JSON array.
//!
//! The store is a plain file. When it is missing or unreadable the three
//! built-in presets are written back and returned, so a fresh install
//! always lists something.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::SessionConfig;

/// Errors from preset storage.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("failed to access presets file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode presets: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("preset name must not be empty")]
    EmptyName,
}

/// A saved session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    /// Work seconds
    pub work: u32,
    /// Rest seconds
    pub rest: u32,
    pub rounds: u32,
    /// Prepare seconds
    pub prepare: u32,
}

impl Preset {
    /// Captures `config` under `name`.
    pub fn new(name: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            name: name.into(),
            work: config.work_seconds,
            rest: config.rest_seconds,
            rounds: config.rounds,
            prepare: config.prepare_seconds,
        }
    }

    /// The session configuration this preset describes.
    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            work_seconds: self.work,
            rest_seconds: self.rest,
            rounds: self.rounds,
            prepare_seconds: self.prepare,
        }
    }
}

/// The presets written on first use.
pub fn default_presets() -> Vec<Preset> {
    vec![
        Preset::new("Classic Tabata", SessionConfig::default()),
        Preset::new(
            "HIIT 30/30",
            SessionConfig::default()
                .with_work_seconds(30)
                .with_rest_seconds(30)
                .with_rounds(10),
        ),
        Preset::new(
            "Quick Burn",
            SessionConfig::default()
                .with_work_seconds(40)
                .with_rest_seconds(20)
                .with_rounds(5),
        ),
    ]
}

/// File-backed preset storage.
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
}

impl PresetStore {
    /// Store at the default location, `<config_dir>/tabata/presets.json`.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("tabata").join("presets.json"))
            .unwrap_or_else(|| PathBuf::from("tabata_presets.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns every stored preset.
    ///
    /// A missing or corrupt file is replaced by the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults cannot be written.
    pub fn load_all(&self) -> Result<Vec<Preset>, PresetError> {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<Preset>>(&bytes) {
                Ok(presets) => return Ok(presets),
                Err(e) => warn!("Ignoring unreadable presets file {}: {}", self.path.display(), e),
            },
            Err(e) => debug!("No presets file at {}: {}", self.path.display(), e),
        }

        let defaults = default_presets();
        self.write(&defaults)?;
        Ok(defaults)
    }

    /// Stores `preset`, replacing any preset with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the file cannot be written.
    pub fn save(&self, preset: Preset) -> Result<(), PresetError> {
        if preset.name.trim().is_empty() {
            return Err(PresetError::EmptyName);
        }
        let mut presets = self.load_all()?;
        presets.retain(|p| p.name != preset.name);
        presets.push(preset);
        self.write(&presets)
    }

    /// Removes the preset called `name`.
    ///
    /// Returns whether a preset was removed; an unknown name is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn remove(&self, name: &str) -> Result<bool, PresetError> {
        let mut presets = self.load_all()?;
        let before = presets.len();
        presets.retain(|p| p.name != name);
        let removed = presets.len() != before;
        self.write(&presets)?;
        Ok(removed)
    }

    /// Looks up a preset by exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be loaded.
    pub fn find(&self, name: &str) -> Result<Option<Preset>, PresetError> {
        Ok(self.load_all()?.into_iter().find(|p| p.name == name))
    }

    fn write(&self, presets: &[Preset]) -> Result<(), PresetError> {
        let io_err = |source| PresetError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let data = serde_json::to_vec_pretty(presets)?;
        fs::write(&self.path, data).map_err(io_err)
    }
}
