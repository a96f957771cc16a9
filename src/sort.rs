#![forbid(unsafe_code)]

//! Read-only ordered/filtered views over the store's data. Nothing in
//! here mutates the collection; sorting works on a copy.

use clap::ValueEnum;

use crate::store::{Playlist, Video, VideoStatus};

/// Presentation order for a playlist's videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortMode {
    /// Insertion order, unchanged.
    #[default]
    Default,
    /// Not started first, then in progress, then completed. Stable.
    Status,
    /// Most recently completed first; videos without a completion
    /// timestamp always sort last (their relative order is unspecified).
    CompletedDate,
}

fn status_rank(status: VideoStatus) -> u8 {
    match status {
        VideoStatus::NotStarted => 0,
        VideoStatus::InProgress => 1,
        VideoStatus::Completed => 2,
    }
}

pub fn sorted_videos(videos: &[Video], mode: SortMode) -> Vec<Video> {
    let mut sorted = videos.to_vec();
    match mode {
        SortMode::Default => {}
        SortMode::Status => sorted.sort_by_key(|v| status_rank(v.status)),
        SortMode::CompletedDate => sorted.sort_by(|a, b| match (a.completed_at, b.completed_at) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
    }
    sorted
}

/// Case-insensitive substring search over playlist title, description and
/// every contained video title. A blank query matches everything; result
/// order is the original collection order.
pub fn filter_playlists<'a>(playlists: &'a [Playlist], query: &str) -> Vec<&'a Playlist> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return playlists.iter().collect();
    }
    playlists
        .iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&query)
                || p.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
                || p.videos
                    .iter()
                    .any(|v| v.title.to_lowercase().contains(&query))
        })
        .collect()
}
