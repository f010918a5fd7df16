//! Word clip discovery.
//!
//! Word cues ("work", "rest", "done") are plain audio files in a sounds
//! directory. This module finds them; the audio engine decodes them.

use std::path::{Path, PathBuf};

/// Name of the clip played after the work-start tones.
pub const WORK_CLIP: &str = "work";
/// Name of the clip played after the rest-start tone.
pub const REST_CLIP: &str = "rest";
/// Name of the clip played after the completion fanfare.
pub const DONE_CLIP: &str = "done";

/// Every clip a cue can reference.
pub const WORD_CLIPS: &[&str] = &[WORK_CLIP, REST_CLIP, DONE_CLIP];

/// Supported audio file extensions, in order of preference.
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

/// A word clip on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSource {
    /// Clip name (file stem, lower-case)
    pub name: String,
    /// Full path to the audio file
    pub path: PathBuf,
}

impl ClipSource {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Default sounds directory: `<data_dir>/tabata/sounds`.
#[must_use]
pub fn default_sounds_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("tabata").join("sounds"))
}

fn extension_rank(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    SUPPORTED_EXTENSIONS.iter().position(|e| *e == ext)
}

/// Discovers the word clips present in `dir`.
///
/// File stems are matched case-insensitively against [`WORD_CLIPS`]; when a
/// clip exists in several formats the preferred extension wins. Returns an
/// empty vector if the directory is missing or unreadable.
#[must_use]
pub fn discover_clips(dir: &Path) -> Vec<ClipSource> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut best: Vec<(usize, ClipSource)> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(rank) = extension_rank(&path) else {
            continue;
        };
        let Some(stem) = path.file_stem() else {
            continue;
        };
        let stem = stem.to_string_lossy().to_lowercase();
        let Some(name) = WORD_CLIPS.iter().find(|clip| **clip == stem) else {
            continue;
        };

        match best.iter_mut().find(|(_, clip)| clip.name == *name) {
            Some(existing) if existing.0 <= rank => {}
            Some(existing) => *existing = (rank, ClipSource::new(*name, path)),
            None => best.push((rank, ClipSource::new(*name, path))),
        }
    }

    let mut clips: Vec<ClipSource> = best.into_iter().map(|(_, clip)| clip).collect();
    clips.sort_by(|a, b| a.name.cmp(&b.name));
    clips
}
