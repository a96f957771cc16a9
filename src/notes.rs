#![forbid(unsafe_code)]

//! Free-text notes attached to individual videos.
//!
//! Notes live outside the playlist collection on purpose: one UTF-8 file
//! per video id under the notes directory, written on every change. A
//! deleted video's note simply becomes orphaned; it costs nothing and the
//! text may still be wanted if the video is re-added.

use anyhow::{Context, Result, bail};
use std::{fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct NotesStore {
    dir: PathBuf,
}

impl NotesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the saved note, or `None` when the video has none.
    pub fn get(&self, video_id: &str) -> Result<Option<String>> {
        let path = self.note_path(video_id)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Saves the note, replacing any previous text. Empty text removes the
    /// note file instead of keeping a blank one around.
    pub fn set(&self, video_id: &str, text: &str) -> Result<()> {
        if text.is_empty() {
            return self.clear(video_id);
        }
        let path = self.note_path(video_id)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating notes directory {}", self.dir.display()))?;
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))
    }

    pub fn clear(&self, video_id: &str) -> Result<()> {
        let path = self.note_path(video_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
        }
    }

    /// Video ids become file names, so only the id alphabet is allowed
    /// through. Anything else would let a crafted id escape the directory.
    fn note_path(&self, video_id: &str) -> Result<PathBuf> {
        if video_id.is_empty()
            || !video_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("invalid video id: {video_id:?}");
        }
        Ok(self.dir.join(format!("{video_id}.txt")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_notes() -> (TempDir, NotesStore) {
        let dir = TempDir::new().unwrap();
        let notes = NotesStore::new(dir.path().join("notes"));
        (dir, notes)
    }

    #[test]
    fn get_returns_none_for_unknown_video() {
        let (_dir, notes) = temp_notes();
        assert!(notes.get("abc123").unwrap().is_none());
    }

    #[test]
    fn set_then_get_round_trips() {
        let (_dir, notes) = temp_notes();
        notes.set("abc123", "key idea at 12:30").unwrap();
        assert_eq!(
            notes.get("abc123").unwrap().as_deref(),
            Some("key idea at 12:30")
        );

        notes.set("abc123", "rewritten").unwrap();
        assert_eq!(notes.get("abc123").unwrap().as_deref(), Some("rewritten"));
    }

    #[test]
    fn empty_text_removes_the_note() {
        let (_dir, notes) = temp_notes();
        notes.set("abc123", "something").unwrap();
        notes.set("abc123", "").unwrap();
        assert!(notes.get("abc123").unwrap().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let (_dir, notes) = temp_notes();
        notes.clear("never-existed").unwrap();
        notes.set("abc123", "x").unwrap();
        notes.clear("abc123").unwrap();
        notes.clear("abc123").unwrap();
        assert!(notes.get("abc123").unwrap().is_none());
    }

    #[test]
    fn rejects_ids_that_do_not_fit_the_alphabet() {
        let (_dir, notes) = temp_notes();
        assert!(notes.set("../escape", "x").is_err());
        assert!(notes.get("a/b").is_err());
        assert!(notes.set("", "x").is_err());
    }
}
