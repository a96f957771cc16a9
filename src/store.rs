#![forbid(unsafe_code)]

//! The authoritative playlist collection and its durable JSON file.
//!
//! The whole collection lives in memory as a `Vec<Playlist>` and is written
//! back wholesale (atomic tmp + rename) after every mutation. The one
//! exception is playback-progress updates, which arrive every few seconds
//! from the player and therefore only hit the disk once per persist window;
//! `flush` (also run on drop) catches whatever is still pending.
//!
//! Field names on disk are camelCase so snapshots exported by earlier
//! versions of the tracker import unchanged.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

/// Minimum gap between two disk writes caused purely by playback-progress
/// updates. Everything else persists immediately.
const PROGRESS_PERSIST_WINDOW: Duration = Duration::from_secs(5);

/// Lifecycle stage of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// A unit of content inside a playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Display string, e.g. `12:30` or `1:02:03`. Not validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Last known playback position in whole seconds, fed by the player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
}

/// An ordered collection of videos plus descriptive metadata. Insertion
/// order of `videos` is the canonical default order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub videos: Vec<Video>,
    /// Marks a playlist that wraps one standalone video; presentation
    /// grouping only, no semantic difference.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_single_video: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when adding a video. Status, id and timestamps are
/// always assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewVideo {
    pub title: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<String>,
}

/// Partial update for a playlist. The outer `Option` means "leave
/// unchanged"; the inner one on `description` allows clearing it.
#[derive(Debug, Clone, Default)]
pub struct PlaylistPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

/// Partial update for a video, merged field by field. Same two-level
/// `Option` convention as [`PlaylistPatch`].
#[derive(Debug, Clone, Default)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub url: Option<Option<String>>,
    pub thumbnail: Option<Option<String>>,
    pub duration: Option<Option<String>>,
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(ID_ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Opaque entity id: millisecond timestamp in base36 plus six random
/// base36 characters. Unique enough for a single-user store and sortable
/// by creation time as a bonus.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut bytes = [0u8; 6];
    OsRng.fill_bytes(&mut bytes);
    let suffix: String = bytes
        .iter()
        .map(|b| ID_ALPHABET[(*b % 36) as usize] as char)
        .collect();
    format!("{}{}", to_base36(millis), suffix)
}

/// Sole owner of the playlist collection. Every read and write goes
/// through this type; mutations persist to `path` before returning.
#[derive(Debug)]
pub struct PlaylistStore {
    path: PathBuf,
    playlists: Vec<Playlist>,
    last_persist: Option<Instant>,
    progress_dirty: bool,
}

impl PlaylistStore {
    /// Opens the store, deserializing the collection from `path`. A missing
    /// file, unreadable content or a non-array shape all start an empty
    /// collection; this never fails.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let playlists = load_collection(&path);
        Self {
            path,
            playlists,
            last_persist: None,
            progress_dirty: false,
        }
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn get(&self, id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    /// Creates a playlist and prepends it so the most recently created one
    /// lists first. Fails on a blank title.
    pub fn add_playlist(
        &mut self,
        title: &str,
        description: Option<String>,
        is_single_video: bool,
    ) -> Result<Playlist> {
        if title.trim().is_empty() {
            bail!("playlist title must not be empty");
        }
        let now = Utc::now();
        let playlist = Playlist {
            id: generate_id(),
            title: title.to_string(),
            description,
            videos: Vec::new(),
            is_single_video,
            created_at: now,
            updated_at: now,
        };
        self.playlists.insert(0, playlist.clone());
        self.persist()?;
        Ok(playlist)
    }

    /// Merges `patch` into the matching playlist. Unknown ids are ignored.
    pub fn update_playlist(&mut self, id: &str, patch: PlaylistPatch) -> Result<()> {
        let mut changed = false;
        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == id) {
            if let Some(title) = patch.title {
                playlist.title = title;
            }
            if let Some(description) = patch.description {
                playlist.description = description;
            }
            playlist.updated_at = Utc::now();
            changed = true;
        }
        if changed { self.persist() } else { Ok(()) }
    }

    /// Removes the playlist and every video it contains. Unknown ids are
    /// ignored.
    pub fn delete_playlist(&mut self, id: &str) -> Result<()> {
        let before = self.playlists.len();
        self.playlists.retain(|p| p.id != id);
        if self.playlists.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// Appends a new video to the end of the playlist's list.
    pub fn add_video(&mut self, playlist_id: &str, video: NewVideo) -> Result<()> {
        let mut changed = false;
        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == playlist_id) {
            let now = Utc::now();
            playlist.videos.push(Video {
                id: generate_id(),
                title: video.title,
                url: video.url,
                thumbnail: video.thumbnail,
                duration: video.duration,
                status: VideoStatus::NotStarted,
                completed_at: None,
                created_at: now,
                progress: None,
            });
            playlist.updated_at = now;
            changed = true;
        }
        if changed { self.persist() } else { Ok(()) }
    }

    /// Merges `patch` into the matching video, field by field.
    pub fn update_video(
        &mut self,
        playlist_id: &str,
        video_id: &str,
        patch: VideoPatch,
    ) -> Result<()> {
        let changed = self.with_video(playlist_id, video_id, |video| {
            if let Some(title) = patch.title {
                video.title = title;
            }
            if let Some(url) = patch.url {
                video.url = url;
            }
            if let Some(thumbnail) = patch.thumbnail {
                video.thumbnail = thumbnail;
            }
            if let Some(duration) = patch.duration {
                video.duration = duration;
            }
        });
        if changed { self.persist() } else { Ok(()) }
    }

    /// Removes a single video from its playlist.
    pub fn delete_video(&mut self, playlist_id: &str, video_id: &str) -> Result<()> {
        let mut changed = false;
        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == playlist_id) {
            let before = playlist.videos.len();
            playlist.videos.retain(|v| v.id != video_id);
            if playlist.videos.len() != before {
                playlist.updated_at = Utc::now();
                changed = true;
            }
        }
        if changed { self.persist() } else { Ok(()) }
    }

    /// Binary flip between `Completed` and `NotStarted`. An `InProgress`
    /// video flips straight to `Completed`. `completed_at` is set and
    /// cleared atomically with the flip.
    pub fn toggle_video_status(&mut self, playlist_id: &str, video_id: &str) -> Result<()> {
        let changed = self.with_video(playlist_id, video_id, |video| {
            if video.status == VideoStatus::Completed {
                video.status = VideoStatus::NotStarted;
                video.completed_at = None;
            } else {
                video.status = VideoStatus::Completed;
                video.completed_at = Some(Utc::now());
            }
        });
        if changed { self.persist() } else { Ok(()) }
    }

    /// Explicit three-way status set, used by the playback surface to mark
    /// a video `InProgress` on first open. Transitions into `Completed`
    /// stamp `completed_at`; transitions out of it clear the stamp.
    pub fn set_video_status(
        &mut self,
        playlist_id: &str,
        video_id: &str,
        status: VideoStatus,
    ) -> Result<()> {
        let changed = self.with_video(playlist_id, video_id, |video| {
            match (video.status, status) {
                (VideoStatus::Completed, VideoStatus::Completed) => {}
                (_, VideoStatus::Completed) => video.completed_at = Some(Utc::now()),
                (VideoStatus::Completed, _) => video.completed_at = None,
                _ => {}
            }
            video.status = status;
        });
        if changed { self.persist() } else { Ok(()) }
    }

    /// Marks every video in the playlist `Completed`. Videos that already
    /// carry a completion timestamp keep it; only the rest get stamped now.
    pub fn mark_playlist_completed(&mut self, playlist_id: &str) -> Result<()> {
        let mut changed = false;
        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == playlist_id) {
            let now = Utc::now();
            for video in &mut playlist.videos {
                video.status = VideoStatus::Completed;
                if video.completed_at.is_none() {
                    video.completed_at = Some(now);
                }
            }
            playlist.updated_at = now;
            changed = true;
        }
        if changed { self.persist() } else { Ok(()) }
    }

    /// Records the last known playback position. The in-memory value
    /// updates immediately; the disk write is coalesced because the player
    /// calls this every few seconds. [`PlaylistStore::flush`] forces the
    /// pending write out.
    pub fn update_video_progress(
        &mut self,
        playlist_id: &str,
        video_id: &str,
        seconds: u32,
    ) -> Result<()> {
        let changed = self.with_video(playlist_id, video_id, |video| {
            video.progress = Some(seconds);
        });
        if !changed {
            return Ok(());
        }
        let window_open = self
            .last_persist
            .is_none_or(|at| at.elapsed() >= PROGRESS_PERSIST_WINDOW);
        if window_open {
            self.persist()
        } else {
            self.progress_dirty = true;
            Ok(())
        }
    }

    /// Writes out any coalesced progress update that has not reached the
    /// disk yet.
    pub fn flush(&mut self) -> Result<()> {
        if self.progress_dirty {
            self.persist()?;
        }
        Ok(())
    }

    /// Complete, pretty-printed snapshot of the collection.
    pub fn export_data(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.playlists).context("serializing playlist collection")
    }

    /// Replaces the whole collection with the parsed snapshot. The snapshot
    /// is accepted only when its top level is a JSON array of playlists; on
    /// any failure the current collection is left untouched.
    pub fn import_data(&mut self, raw: &str) -> Result<()> {
        let value: serde_json::Value =
            serde_json::from_str(raw).context("snapshot is not valid JSON")?;
        if !value.is_array() {
            bail!("snapshot must be a JSON array of playlists");
        }
        let playlists: Vec<Playlist> =
            serde_json::from_value(value).context("snapshot does not match the playlist shape")?;
        self.playlists = playlists;
        self.persist()
    }

    fn with_video(
        &mut self,
        playlist_id: &str,
        video_id: &str,
        apply: impl FnOnce(&mut Video),
    ) -> bool {
        let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == playlist_id) else {
            return false;
        };
        let Some(video) = playlist.videos.iter_mut().find(|v| v.id == video_id) else {
            return false;
        };
        apply(video);
        playlist.updated_at = Utc::now();
        true
    }

    fn persist(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
        let payload =
            serde_json::to_vec_pretty(&self.playlists).context("serializing playlist collection")?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload)
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        self.last_persist = Some(Instant::now());
        self.progress_dirty = false;
        Ok(())
    }
}

impl Drop for PlaylistStore {
    fn drop(&mut self) {
        if self.progress_dirty
            && let Err(err) = self.flush()
        {
            eprintln!("Warning: could not flush pending progress update: {err}");
        }
    }
}

fn load_collection(path: &Path) -> Vec<Playlist> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str::<Vec<Playlist>>(&raw) {
        Ok(playlists) => playlists,
        Err(err) => {
            eprintln!(
                "Warning: ignoring unreadable collection at {}: {err}",
                path.display()
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Store rooted in a fresh temp directory; dropping the dir wipes it.
    fn temp_store() -> (TempDir, PlaylistStore) {
        let dir = TempDir::new().unwrap();
        let store = PlaylistStore::open(dir.path().join("playlists.json"));
        (dir, store)
    }

    fn playlist_with_video(store: &mut PlaylistStore, title: &str) -> (String, String) {
        let playlist = store.add_playlist(title, None, false).unwrap();
        store
            .add_video(
                &playlist.id,
                NewVideo {
                    title: format!("{title} - episode"),
                    ..NewVideo::default()
                },
            )
            .unwrap();
        let video_id = store.get(&playlist.id).unwrap().videos[0].id.clone();
        (playlist.id, video_id)
    }

    #[test]
    fn open_starts_empty_for_missing_file() {
        let (_dir, store) = temp_store();
        assert!(store.playlists().is_empty());
    }

    #[test]
    fn open_starts_empty_for_garbage_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playlists.json");
        fs::write(&path, "definitely not json").unwrap();
        let store = PlaylistStore::open(&path);
        assert!(store.playlists().is_empty());
    }

    #[test]
    fn add_playlist_prepends_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playlists.json");
        {
            let mut store = PlaylistStore::open(&path);
            store.add_playlist("First", None, false).unwrap();
            store.add_playlist("Second", Some("desc".into()), false).unwrap();
            assert_eq!(store.playlists()[0].title, "Second");
            assert_eq!(store.playlists()[1].title, "First");
        }
        let reopened = PlaylistStore::open(&path);
        assert_eq!(reopened.playlists().len(), 2);
        assert_eq!(reopened.playlists()[0].title, "Second");
        assert_eq!(reopened.playlists()[0].description.as_deref(), Some("desc"));
    }

    #[test]
    fn add_playlist_rejects_blank_titles() {
        let (_dir, mut store) = temp_store();
        assert!(store.add_playlist("   ", None, false).is_err());
        assert!(store.playlists().is_empty());
    }

    #[test]
    fn update_playlist_merges_fields_and_can_clear_description() {
        let (_dir, mut store) = temp_store();
        let playlist = store
            .add_playlist("Rust course", Some("old".into()), false)
            .unwrap();
        store
            .update_playlist(
                &playlist.id,
                PlaylistPatch {
                    title: Some("Rust course 2024".into()),
                    description: Some(None),
                },
            )
            .unwrap();
        let updated = store.get(&playlist.id).unwrap();
        assert_eq!(updated.title, "Rust course 2024");
        assert!(updated.description.is_none());
        assert!(updated.updated_at >= updated.created_at);
    }

    #[test]
    fn mutations_on_unknown_ids_are_silent_noops() {
        let (_dir, mut store) = temp_store();
        store.add_playlist("Only", None, false).unwrap();
        store
            .update_playlist("ghost", PlaylistPatch::default())
            .unwrap();
        store.delete_playlist("ghost").unwrap();
        store
            .add_video("ghost", NewVideo { title: "x".into(), ..NewVideo::default() })
            .unwrap();
        store.toggle_video_status("ghost", "ghost").unwrap();
        store.update_video_progress("ghost", "ghost", 12).unwrap();
        assert_eq!(store.playlists().len(), 1);
    }

    #[test]
    fn delete_playlist_cascades() {
        let (_dir, mut store) = temp_store();
        let (playlist_id, _video_id) = playlist_with_video(&mut store, "Gone");
        store.delete_playlist(&playlist_id).unwrap();
        assert!(store.playlists().is_empty());
    }

    #[test]
    fn add_video_appends_with_defaults() {
        let (_dir, mut store) = temp_store();
        let playlist = store.add_playlist("Queue", None, false).unwrap();
        store
            .add_video(
                &playlist.id,
                NewVideo {
                    title: "Intro".into(),
                    url: Some("https://youtu.be/abc12345678".into()),
                    duration: Some("10:00".into()),
                    ..NewVideo::default()
                },
            )
            .unwrap();
        store
            .add_video(&playlist.id, NewVideo { title: "Outro".into(), ..NewVideo::default() })
            .unwrap();
        let videos = &store.get(&playlist.id).unwrap().videos;
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].title, "Intro");
        assert_eq!(videos[1].title, "Outro");
        assert_eq!(videos[0].status, VideoStatus::NotStarted);
        assert!(videos[0].completed_at.is_none());
        assert_ne!(videos[0].id, videos[1].id);
    }

    #[test]
    fn update_video_merges_only_provided_fields() {
        let (_dir, mut store) = temp_store();
        let (playlist_id, video_id) = playlist_with_video(&mut store, "Edit");
        store
            .update_video(
                &playlist_id,
                &video_id,
                VideoPatch {
                    title: Some("Renamed".into()),
                    duration: Some(Some("5:00".into())),
                    ..VideoPatch::default()
                },
            )
            .unwrap();
        let video = &store.get(&playlist_id).unwrap().videos[0];
        assert_eq!(video.title, "Renamed");
        assert_eq!(video.duration.as_deref(), Some("5:00"));
        assert!(video.url.is_none());
    }

    #[test]
    fn toggle_once_completes_and_stamps() {
        let (_dir, mut store) = temp_store();
        let (playlist_id, video_id) = playlist_with_video(&mut store, "Toggle");
        store.toggle_video_status(&playlist_id, &video_id).unwrap();
        let video = &store.get(&playlist_id).unwrap().videos[0];
        assert_eq!(video.status, VideoStatus::Completed);
        let stamped = video.completed_at.expect("completed_at set");
        assert!(stamped <= Utc::now());
    }

    #[test]
    fn toggle_twice_returns_to_not_started_and_clears_stamp() {
        let (_dir, mut store) = temp_store();
        let (playlist_id, video_id) = playlist_with_video(&mut store, "Toggle");
        store.toggle_video_status(&playlist_id, &video_id).unwrap();
        store.toggle_video_status(&playlist_id, &video_id).unwrap();
        let video = &store.get(&playlist_id).unwrap().videos[0];
        assert_eq!(video.status, VideoStatus::NotStarted);
        assert!(video.completed_at.is_none());
    }

    #[test]
    fn toggle_from_in_progress_goes_straight_to_completed() {
        let (_dir, mut store) = temp_store();
        let (playlist_id, video_id) = playlist_with_video(&mut store, "Partial");
        store
            .set_video_status(&playlist_id, &video_id, VideoStatus::InProgress)
            .unwrap();
        store.toggle_video_status(&playlist_id, &video_id).unwrap();
        let video = &store.get(&playlist_id).unwrap().videos[0];
        assert_eq!(video.status, VideoStatus::Completed);
        assert!(video.completed_at.is_some());
    }

    #[test]
    fn set_status_keeps_existing_completion_stamp() {
        let (_dir, mut store) = temp_store();
        let (playlist_id, video_id) = playlist_with_video(&mut store, "Stamp");
        store.toggle_video_status(&playlist_id, &video_id).unwrap();
        let first = store.get(&playlist_id).unwrap().videos[0].completed_at;
        store
            .set_video_status(&playlist_id, &video_id, VideoStatus::Completed)
            .unwrap();
        let second = store.get(&playlist_id).unwrap().videos[0].completed_at;
        assert_eq!(first, second);
    }

    #[test]
    fn set_status_away_from_completed_clears_stamp() {
        let (_dir, mut store) = temp_store();
        let (playlist_id, video_id) = playlist_with_video(&mut store, "Clear");
        store.toggle_video_status(&playlist_id, &video_id).unwrap();
        store
            .set_video_status(&playlist_id, &video_id, VideoStatus::InProgress)
            .unwrap();
        let video = &store.get(&playlist_id).unwrap().videos[0];
        assert_eq!(video.status, VideoStatus::InProgress);
        assert!(video.completed_at.is_none());
    }

    #[test]
    fn mark_playlist_completed_preserves_original_stamps() {
        let (_dir, mut store) = temp_store();
        let playlist = store.add_playlist("Bulk", None, false).unwrap();
        for title in ["one", "two"] {
            store
                .add_video(&playlist.id, NewVideo { title: title.into(), ..NewVideo::default() })
                .unwrap();
        }
        let first_id = store.get(&playlist.id).unwrap().videos[0].id.clone();
        store.toggle_video_status(&playlist.id, &first_id).unwrap();
        let original = store.get(&playlist.id).unwrap().videos[0].completed_at;

        store.mark_playlist_completed(&playlist.id).unwrap();
        let videos = &store.get(&playlist.id).unwrap().videos;
        assert!(videos.iter().all(|v| v.status == VideoStatus::Completed));
        assert_eq!(videos[0].completed_at, original);
        let fresh = videos[1].completed_at.expect("second video stamped");
        assert!(fresh <= Utc::now());
    }

    #[test]
    fn export_import_round_trip_reproduces_the_collection() {
        let (_dir, mut store) = temp_store();
        let (playlist_id, video_id) = playlist_with_video(&mut store, "Round trip");
        store.toggle_video_status(&playlist_id, &video_id).unwrap();
        let before = store.playlists().to_vec();

        let snapshot = store.export_data().unwrap();
        store.import_data(&snapshot).unwrap();
        assert_eq!(store.playlists(), before.as_slice());
    }

    #[test]
    fn import_rejects_invalid_json_and_leaves_store_untouched() {
        let (_dir, mut store) = temp_store();
        playlist_with_video(&mut store, "Keep me");
        let before = store.playlists().to_vec();
        assert!(store.import_data("not json").is_err());
        assert_eq!(store.playlists(), before.as_slice());
    }

    #[test]
    fn import_rejects_non_array_top_level() {
        let (_dir, mut store) = temp_store();
        playlist_with_video(&mut store, "Keep me");
        let before = store.playlists().to_vec();
        assert!(store.import_data("{\"a\":1}").is_err());
        assert_eq!(store.playlists(), before.as_slice());
    }

    #[test]
    fn import_accepts_legacy_records_without_new_fields() {
        let (_dir, mut store) = temp_store();
        // Snapshot written before isSingleVideo/progress existed.
        let legacy = r#"[{
            "id": "p1",
            "title": "Old playlist",
            "videos": [{
                "id": "v1",
                "title": "Old video",
                "status": "completed",
                "completedAt": "2024-01-02T00:00:00Z",
                "createdAt": "2024-01-01T00:00:00Z"
            }],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z"
        }]"#;
        store.import_data(legacy).unwrap();
        let playlist = store.get("p1").unwrap();
        assert!(!playlist.is_single_video);
        assert_eq!(playlist.videos[0].progress, None);
        assert_eq!(playlist.videos[0].status, VideoStatus::Completed);
    }

    #[test]
    fn progress_updates_are_immediate_in_memory_but_coalesced_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playlists.json");
        let mut store = PlaylistStore::open(&path);
        let (playlist_id, video_id) = playlist_with_video(&mut store, "Resume");

        // add_video persisted moments ago, so this write stays in memory.
        store
            .update_video_progress(&playlist_id, &video_id, 90)
            .unwrap();
        assert_eq!(store.get(&playlist_id).unwrap().videos[0].progress, Some(90));
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("\"progress\""));

        store.flush().unwrap();
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("\"progress\": 90"));
    }

    #[test]
    fn storage_record_uses_camel_case_field_names() {
        let (_dir, mut store) = temp_store();
        let (playlist_id, video_id) = playlist_with_video(&mut store, "Shape");
        store.toggle_video_status(&playlist_id, &video_id).unwrap();
        let snapshot = store.export_data().unwrap();
        assert!(snapshot.starts_with('['));
        assert!(snapshot.contains("\"createdAt\""));
        assert!(snapshot.contains("\"updatedAt\""));
        assert!(snapshot.contains("\"completedAt\""));
        assert!(!snapshot.contains("\"completed_at\""));
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            assert!(seen.insert(generate_id()));
        }
    }
}
