#![forbid(unsafe_code)]

//! Playback wiring between a player and the store.
//!
//! The player itself lives behind [`PlaybackSurface`]; anything that can
//! seek and report a position qualifies (an embedded web player, a spawned
//! mpv, a test double). [`WatchSession`] owns the store-side protocol:
//! mark the video in progress on open, resume from the saved position,
//! stream position updates while playing, and settle everything on close.

use anyhow::Result;

use crate::store::{PlaylistStore, VideoStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Ended,
}

/// Minimal control surface a player must expose.
pub trait PlaybackSurface {
    /// Jumps to an absolute position in whole seconds.
    fn seek(&mut self, seconds: u32);
    /// Current position in whole seconds.
    fn current_time(&mut self) -> u32;
    fn state(&self) -> PlaybackState;
}

/// One viewing of one video. Construct with [`WatchSession::start`], call
/// [`WatchSession::tick`] on a few-second cadence while the player runs,
/// and [`WatchSession::finish`] when it closes.
pub struct WatchSession {
    playlist_id: String,
    video_id: String,
    ended: bool,
}

impl WatchSession {
    /// Opens the session: a `NotStarted` video becomes `InProgress`
    /// (completed videos keep their status so rewatching never regresses
    /// them), and the player resumes from the saved position if one exists.
    pub fn start(
        store: &mut PlaylistStore,
        surface: &mut impl PlaybackSurface,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<Self> {
        let saved = store
            .get(playlist_id)
            .and_then(|p| p.videos.iter().find(|v| v.id == video_id))
            .map(|v| (v.status, v.progress));
        if let Some((status, progress)) = saved {
            if status == VideoStatus::NotStarted {
                store.set_video_status(playlist_id, video_id, VideoStatus::InProgress)?;
            }
            if let Some(seconds) = progress.filter(|s| *s > 0) {
                surface.seek(seconds);
            }
        }
        Ok(Self {
            playlist_id: playlist_id.to_string(),
            video_id: video_id.to_string(),
            ended: false,
        })
    }

    /// Periodic heartbeat. While playing, the current position flows into
    /// the store (which coalesces the disk writes). The first `Ended`
    /// observation marks the video completed.
    pub fn tick(
        &mut self,
        store: &mut PlaylistStore,
        surface: &mut impl PlaybackSurface,
    ) -> Result<()> {
        match surface.state() {
            PlaybackState::Playing => {
                let position = surface.current_time();
                store.update_video_progress(&self.playlist_id, &self.video_id, position)?;
            }
            PlaybackState::Ended if !self.ended => {
                self.ended = true;
                store.set_video_status(
                    &self.playlist_id,
                    &self.video_id,
                    VideoStatus::Completed,
                )?;
            }
            PlaybackState::Paused | PlaybackState::Ended => {}
        }
        Ok(())
    }

    /// Closes the session, forcing any coalesced progress write to disk.
    pub fn finish(self, store: &mut PlaylistStore) -> Result<()> {
        store.flush()
    }
}
